//! # docximg-ooxml
//!
//! Templated image insertion for DOCX packages.
//!
//! A template marks image positions with text placeholders:
//!
//! ```text
//! {{insert_image logo png 200 100}}
//! ```
//!
//! Each placeholder run is replaced by an inline drawing of the image
//! registered under its name. The crate also supports swapping an existing
//! `word/media/image<N>.<ext>` part in place.
//!
//! ## Example
//!
//! ```no_run
//! use docximg_ooxml::{insert_images, ImageContext, ImageRef, ImageResolver, Package};
//!
//! let mut package = Package::open("template.docx")?;
//!
//! let mut context = ImageContext::new();
//! context.insert("logo".to_string(), ImageRef::url("https://example.com/logo.png"));
//!
//! let report = insert_images(&mut package, &context, &ImageResolver::default())?;
//! for image in &report.images {
//!     println!("{} -> {} ({})", image.name, image.archive_path, image.relationship_id);
//! }
//!
//! package.write_to_file("merged.docx")?;
//! # Ok::<(), docximg_ooxml::ImagerError>(())
//! ```

pub mod config;
pub mod content_types;
pub mod drawing;
pub mod error;
pub mod imager;
pub mod media;
pub mod mutator;
pub mod normalize;
pub mod package;
pub mod placeholder;
pub mod relationships;
pub mod replace;
pub mod source;
pub mod xml;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{ConfigError, FetchSettings, OutputSettings, Settings, DEFAULT_OUTPUT};
pub use content_types::ContentTypes;
pub use error::{ErrorKind, ImagerError, Result};
pub use imager::DocxImager;
pub use mutator::{insert_images, InsertReport, InsertedImage, ResolvedImage};
pub use normalize::normalize;
pub use package::{Commit, Package, Transaction};
pub use placeholder::{extract_placeholders, Placeholder, Placeholders};
pub use relationships::Relationships;
pub use replace::replace_numbered_image;
pub use source::{HttpFetcher, ImageContext, ImageFetcher, ImageRef, ImageResolver, RetrievalMode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
