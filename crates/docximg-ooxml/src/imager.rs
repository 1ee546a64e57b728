//! Load / insert / replace / save session
//!
//! [`DocxImager`] wraps an optional [`Package`] with the settings and
//! resolver used for retrieval. Every operation other than loading fails with
//! [`ImagerError::NotLoaded`] until a template has been loaded.
//!
//! ```no_run
//! use docximg_ooxml::{DocxImager, ImageContext, ImageRef};
//!
//! let mut imager = DocxImager::new();
//! imager.load("template.docx")?;
//!
//! let mut context = ImageContext::new();
//! context.insert("logo".to_string(), ImageRef::local("logo.png"));
//! imager.insert_image(&context)?;
//!
//! imager.save(None)?;
//! # Ok::<(), docximg_ooxml::ImagerError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{ImagerError, Result};
use crate::mutator::{insert_images, InsertReport};
use crate::normalize::normalize;
use crate::package::{Package, DOCUMENT_PATH};
use crate::placeholder::{extract_placeholders, Placeholders};
use crate::replace::{check_extension, replace_numbered_image};
use crate::source::{ImageContext, ImageResolver, RetrievalMode};

/// A templating session over one DOCX package
#[derive(Debug, Default)]
pub struct DocxImager {
    package: Option<Package>,
    settings: Settings,
    resolver: ImageResolver,
}

impl DocxImager {
    /// Create a session with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session whose fetcher and output path come from `settings`
    pub fn with_settings(settings: Settings) -> Self {
        let resolver = ImageResolver::new(&settings.fetch);
        Self {
            package: None,
            settings,
            resolver,
        }
    }

    /// Replace the resolver, e.g. to use a custom URL transport
    pub fn with_resolver(mut self, resolver: ImageResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Session settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Load a template from disk, replacing any loaded package
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        log::info!("Loading template {}", path.display());
        self.package = Some(Package::open(path)?);
        Ok(())
    }

    /// Load a template held in memory
    pub fn load_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.package = Some(Package::from_bytes(bytes)?);
        Ok(())
    }

    /// Check if a package is loaded
    pub fn is_loaded(&self) -> bool {
        self.package.is_some()
    }

    /// The loaded package
    pub fn package(&self) -> Result<&Package> {
        self.package.as_ref().ok_or(ImagerError::NotLoaded)
    }

    fn package_mut(&mut self) -> Result<&mut Package> {
        self.package.as_mut().ok_or(ImagerError::NotLoaded)
    }

    /// Take the loaded package out of the session
    pub fn into_package(self) -> Result<Package> {
        self.package.ok_or(ImagerError::NotLoaded)
    }

    /// Placeholders declared in the loaded template
    pub fn placeholders(&self) -> Result<Placeholders> {
        let body = self.package()?.require_string(DOCUMENT_PATH)?;
        extract_placeholders(&normalize(&body))
    }

    /// Insert an image for every placeholder, looked up by name in `context`
    pub fn insert_image(&mut self, context: &ImageContext) -> Result<InsertReport> {
        let package = self.package.as_mut().ok_or(ImagerError::NotLoaded)?;
        let report = insert_images(package, context, &self.resolver)?;
        log::info!("Inserted {} image(s)", report.images.len());
        Ok(report)
    }

    /// Replace `word/media/image<index>.<ext>` with an image fetched from `url`
    pub fn replace_with_image_url(
        &mut self,
        url: &str,
        image_index: u32,
        extension: &str,
    ) -> Result<String> {
        self.replace_from(url, RetrievalMode::Url, image_index, extension)
    }

    /// Replace `word/media/image<index>.<ext>` with a local file
    pub fn replace_with_local_image(
        &mut self,
        path: &str,
        image_index: u32,
        extension: &str,
    ) -> Result<String> {
        self.replace_from(path, RetrievalMode::Local, image_index, extension)
    }

    /// Replace `word/media/image<index>.<ext>` with a base64 payload
    pub fn replace_with_b64_image(
        &mut self,
        payload: &str,
        image_index: u32,
        extension: &str,
    ) -> Result<String> {
        self.replace_from(payload, RetrievalMode::B64, image_index, extension)
    }

    fn replace_from(
        &mut self,
        reference: &str,
        mode: RetrievalMode,
        image_index: u32,
        extension: &str,
    ) -> Result<String> {
        // Fail before retrieval when nothing is loaded or the name is unusable.
        self.package()?;
        check_extension(extension)?;
        let bytes = self.resolver.resolve(reference, mode)?;
        let package = self.package_mut()?;
        replace_numbered_image(package, bytes, image_index, extension)
    }

    /// Write the package to `path`, or to the configured output path
    ///
    /// Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let package = self.package()?;
        let target = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.output.path.clone());
        package.write_to_file(&target)?;
        log::info!("Saved {}", target.display());
        Ok(target)
    }
}
