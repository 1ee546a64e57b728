//! Media naming and content types
//!
//! Media parts live under `word/media/` and follow Word's own
//! `image<N>.<ext>` naming, which is also what numbered replacement targets.

use std::collections::HashSet;

use crate::package::MEDIA_DIR;

/// Archive path of a numbered media part (e.g., `word/media/image3.png`)
pub fn numbered_media_path(index: u32, extension: &str) -> String {
    format!("{MEDIA_DIR}image{index}.{extension}")
}

/// Check that an extension is a single non-empty alphanumeric token
pub fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Get the MIME content type for an image extension
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        "tiff" | "tif" => "image/tiff",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Hands out `image<N>.<ext>` names not yet used in a package
///
/// An index counts as taken whatever its extension, so `image1.jpeg` blocks
/// `image1.png` as well.
#[derive(Debug, Clone, Default)]
pub struct MediaNamer {
    taken: HashSet<u32>,
    next: u32,
}

impl MediaNamer {
    /// Build from the package's existing paths
    pub fn new<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let taken = paths.into_iter().filter_map(media_index).collect();
        Self { taken, next: 1 }
    }

    /// Reserve and return the next free file name for an extension
    pub fn next_name(&mut self, extension: &str) -> String {
        while self.taken.contains(&self.next) {
            self.next += 1;
        }
        let index = self.next;
        self.taken.insert(index);
        format!("image{index}.{extension}")
    }
}

/// Index of a `word/media/image<N>.<ext>` path
fn media_index(path: &str) -> Option<u32> {
    let file = path.strip_prefix(MEDIA_DIR)?;
    let stem = file.strip_prefix("image")?;
    let (digits, _ext) = stem.split_once('.')?;
    digits.parse().ok()
}
