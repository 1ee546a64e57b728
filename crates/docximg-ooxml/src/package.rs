//! Package handling for DOCX files
//!
//! A DOCX file is a ZIP archive of XML parts and media. [`Package`] unpacks it
//! into a path-addressable table; [`Transaction`] stages writes on top of a
//! package so a multi-part mutation either lands completely or not at all.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

use zip::read::ZipArchive;
use zip::write::ZipWriter;
use zip::CompressionMethod;

use crate::error::{ImagerError, Result};

/// Path of the content-type table
pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
/// Path of the main document body
pub const DOCUMENT_PATH: &str = "word/document.xml";
/// Path of the document relationships
pub const DOCUMENT_RELS_PATH: &str = "word/_rels/document.xml.rels";
/// Folder holding binary media, relative to the archive root
pub const MEDIA_DIR: &str = "word/media/";

/// An unpacked OOXML package
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// All files in the archive, keyed by path
    files: HashMap<String, Vec<u8>>,
}

impl Package {
    /// Create an empty package
    pub fn new() -> Self {
        Self::default()
    }

    /// Open and unpack a DOCX file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Unpack a DOCX held in memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(Cursor::new(bytes))
    }

    /// Create from any reader that implements Read + Seek
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut files = HashMap::new();

        for i in 0..archive.len() {
            let mut file = archive.by_index(i)?;
            let name = file.name().to_string();

            // Skip directories
            if name.ends_with('/') {
                continue;
            }

            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            files.insert(name, contents);
        }

        log::debug!("Loaded package with {} parts", files.len());
        Ok(Self { files })
    }

    /// Get a file's contents by path
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|v| v.as_slice())
    }

    /// Get a file's contents as a string
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.files
            .get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Get a required part as a string
    ///
    /// Unlike [`Package::get_string`], invalid UTF-8 is an error.
    pub fn require_string(&self, path: &str) -> Result<String> {
        let bytes = self
            .get(path)
            .ok_or_else(|| ImagerError::MissingPart(path.to_string()))?;
        utf8_part(path, bytes)
    }

    /// Check if a file exists in the archive
    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// List all files in the archive
    pub fn file_list(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|s| s.as_str())
    }

    /// List media entries (paths under `word/media/`)
    pub fn media_files(&self) -> impl Iterator<Item = &str> {
        self.file_list().filter(|p| p.starts_with(MEDIA_DIR))
    }

    /// Set or overwrite a file's contents
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        self.files.insert(path.into(), contents);
    }

    /// Set a file's contents from a string
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into().into_bytes());
    }

    /// Remove a file from the archive
    pub fn remove(&mut self, path: &str) -> Option<Vec<u8>> {
        self.files.remove(path)
    }

    /// Number of parts in the package
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if the package has no parts
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Write the archive to a file
    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Serialize the archive into a byte vector
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::new());
        self.write_to(&mut buffer)?;
        Ok(buffer.into_inner())
    }

    /// Write the archive to any writer
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated);

        // Sort keys for deterministic output
        let mut paths: Vec<_> = self.files.keys().collect();
        paths.sort();

        for path in paths {
            let contents = &self.files[path];
            zip.start_file(path, options)?;
            zip.write_all(contents)?;
        }

        zip.finish()?;
        Ok(())
    }
}

/// Staged writes over a borrowed package
///
/// Reads see staged content first, then the underlying package. Nothing
/// reaches the package until [`Transaction::into_commit`] is applied.
#[derive(Debug)]
pub struct Transaction<'a> {
    base: &'a Package,
    staged: Vec<(String, Vec<u8>)>,
}

impl<'a> Transaction<'a> {
    /// Start staging against a package
    pub fn new(base: &'a Package) -> Self {
        Self {
            base,
            staged: Vec::new(),
        }
    }

    /// Read a part, preferring staged content
    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.staged
            .iter()
            .rev()
            .find(|(p, _)| p == path)
            .map(|(_, bytes)| bytes.as_slice())
            .or_else(|| self.base.get(path))
    }

    /// Read a part as a string, preferring staged content
    pub fn get_string(&self, path: &str) -> Option<String> {
        self.get(path)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a required part as a string, rejecting invalid UTF-8
    pub fn require_string(&self, path: &str) -> Result<String> {
        let bytes = self
            .get(path)
            .ok_or_else(|| ImagerError::MissingPart(path.to_string()))?;
        utf8_part(path, bytes)
    }

    /// Check whether a part exists, staged or committed
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Stage a write
    pub fn set(&mut self, path: impl Into<String>, contents: Vec<u8>) {
        let path = path.into();
        self.staged.retain(|(p, _)| *p != path);
        self.staged.push((path, contents));
    }

    /// Stage a string write
    pub fn set_string(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.set(path, contents.into().into_bytes());
    }

    /// Paths staged so far, in write order
    pub fn staged_paths(&self) -> impl Iterator<Item = &str> {
        self.staged.iter().map(|(p, _)| p.as_str())
    }

    /// Release the borrow, returning the staged writes
    pub fn into_commit(self) -> Commit {
        Commit {
            writes: self.staged,
        }
    }
}

/// A set of staged writes detached from the package they were built against
#[derive(Debug, Default)]
#[must_use = "a commit does nothing until applied to a package"]
pub struct Commit {
    writes: Vec<(String, Vec<u8>)>,
}

impl Commit {
    /// Apply every staged write to the package
    pub fn apply(self, package: &mut Package) {
        for (path, contents) in self.writes {
            package.set(path, contents);
        }
    }

    /// Number of writes in this commit
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    /// Check if this commit carries no writes
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

fn utf8_part(path: &str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| ImagerError::Malformed(format!("{path} is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_operations() {
        let mut package = Package::new();

        package.set_string("test.xml", "<root/>");
        assert!(package.contains("test.xml"));
        assert_eq!(package.get_string("test.xml"), Some("<root/>".to_string()));

        package.remove("test.xml");
        assert!(!package.contains("test.xml"));
        assert!(package.is_empty());
    }

    #[test]
    fn test_require_string_missing() {
        let package = Package::new();
        let err = package.require_string(DOCUMENT_PATH).unwrap_err();
        assert!(matches!(err, ImagerError::MissingPart(p) if p == DOCUMENT_PATH));
    }

    #[test]
    fn test_require_string_rejects_invalid_utf8() {
        let mut package = Package::new();
        package.set(DOCUMENT_PATH, b"<w:t>\xff\xfe</w:t>".to_vec());

        assert!(package.get_string(DOCUMENT_PATH).unwrap().contains('\u{FFFD}'));
        let err = package.require_string(DOCUMENT_PATH).unwrap_err();
        assert!(matches!(err, ImagerError::Malformed(ref m) if m.contains("not valid UTF-8")));

        let tx = Transaction::new(&package);
        assert!(tx.require_string(DOCUMENT_PATH).is_err());
    }

    #[test]
    fn test_media_files() {
        let mut package = Package::new();
        package.set("word/media/image1.png", vec![1]);
        package.set("word/document.xml", vec![2]);

        let media: Vec<&str> = package.media_files().collect();
        assert_eq!(media, vec!["word/media/image1.png"]);
    }

    #[test]
    fn test_roundtrip_bytes() {
        let mut package = Package::new();
        package.set_string(CONTENT_TYPES_PATH, "<Types/>");
        package.set("word/media/image1.png", vec![0x89, b'P', b'N', b'G']);

        let bytes = package.to_bytes().unwrap();
        let restored = Package::from_bytes(&bytes).unwrap();

        assert_eq!(restored.len(), 2);
        assert_eq!(
            restored.get("word/media/image1.png"),
            Some(&[0x89, b'P', b'N', b'G'][..])
        );
    }

    #[test]
    fn test_from_invalid_bytes() {
        let result = Package::from_bytes(b"This is not a ZIP file");
        assert!(matches!(result, Err(ImagerError::Archive(_))));
    }

    #[test]
    fn test_transaction_reads_through() {
        let mut package = Package::new();
        package.set_string("a.xml", "original");

        let mut tx = Transaction::new(&package);
        assert_eq!(tx.get_string("a.xml").as_deref(), Some("original"));

        tx.set_string("a.xml", "first");
        tx.set_string("a.xml", "staged");
        tx.set_string("b.xml", "new");
        assert_eq!(tx.get_string("a.xml").as_deref(), Some("staged"));
        assert!(tx.contains("b.xml"));
        assert_eq!(tx.staged_paths().collect::<Vec<_>>(), vec!["a.xml", "b.xml"]);

        let commit = tx.into_commit();
        assert_eq!(commit.len(), 2);

        // Untouched until applied
        assert_eq!(package.get_string("a.xml").as_deref(), Some("original"));
        assert!(!package.contains("b.xml"));

        commit.apply(&mut package);
        assert_eq!(package.get_string("a.xml").as_deref(), Some("staged"));
        assert_eq!(package.get_string("b.xml").as_deref(), Some("new"));
    }

    #[test]
    fn test_dropped_transaction_leaves_package() {
        let mut package = Package::new();
        package.set_string("a.xml", "original");

        {
            let mut tx = Transaction::new(&package);
            tx.set_string("a.xml", "changed");
        }

        assert_eq!(package.get_string("a.xml").as_deref(), Some("original"));
        package.set_string("a.xml", "still mutable");
    }
}
