//! docximg CLI - Command-line interface library
//!
//! This library provides the CLI functionality for docximg:
//! - Insert: Replace `{{insert_image ...}}` placeholders with images
//! - Replace: Overwrite a numbered media part
//! - Placeholders: List the placeholders a template declares
//!
//! # Library Usage
//!
//! ```no_run
//! use std::path::Path;
//! use docximg_cli::insert_command;
//!
//! let images = vec!["logo=assets/logo.png".to_string()];
//! let (written, report) = insert_command(Path::new("template.docx"), &images, None, None)?;
//! println!("{} image(s) -> {}", report.images.len(), written.display());
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! # Fill placeholders from arguments
//! docximg insert template.docx -i logo=https://example.com/logo.png -o out.docx
//!
//! # Fill placeholders from docximg.toml [images]
//! docximg insert template.docx -c docximg.toml
//!
//! # Swap word/media/image2.jpeg
//! docximg replace template.docx --index 2 --ext jpeg --path new.jpeg
//! ```

pub mod app;

pub use app::{
    context_from_args, insert_command, parse_image_arg, placeholders_command, replace_command,
};
pub use app::{run_cli, ReplaceSource};
