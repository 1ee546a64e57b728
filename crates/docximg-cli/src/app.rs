//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use docximg_ooxml::{DocxImager, ImageContext, ImageRef, InsertReport, Placeholders, Settings};

/// Config file names searched in the working directory when `--config` is absent
const CONFIG_CANDIDATES: [&str; 2] = ["docximg.toml", ".docximg.toml"];

#[derive(Parser)]
#[command(name = "docximg")]
#[command(author, version, about = "Insert images into DOCX templates", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace every {{insert_image ...}} placeholder with its image
    Insert {
        /// Template DOCX file
        template: PathBuf,

        /// Image for a placeholder, as NAME=REFERENCE (repeatable)
        ///
        /// REFERENCE may be prefixed with url:, local: or b64:. Without a
        /// prefix, http(s) URLs are fetched and anything else is a file path.
        #[arg(short, long = "image", value_name = "NAME=REFERENCE")]
        images: Vec<String>,

        /// Output DOCX file (defaults to the configured output path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Overwrite word/media/image<INDEX>.<EXT> with a new image
    Replace {
        /// Template DOCX file
        template: PathBuf,

        /// Media index N in image<N>.<ext>
        #[arg(long)]
        index: u32,

        /// Media file extension
        #[arg(long)]
        ext: String,

        #[command(flatten)]
        source: ReplaceSource,

        /// Output DOCX file (defaults to the configured output path)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List the image placeholders declared in a template
    Placeholders {
        /// Template DOCX file
        template: PathBuf,
    },
}

/// Where a replacement image comes from; exactly one is required
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct ReplaceSource {
    /// Fetch the image from an HTTPS URL
    #[arg(long)]
    pub url: Option<String>,

    /// Read the image from a local file
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Decode the image from a base64 literal
    #[arg(long)]
    pub b64: Option<String>,
}

/// Run the CLI application
///
/// This is the main entry point for the command-line interface.
/// It parses arguments, installs the log subscriber and dispatches to the
/// appropriate command.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Insert {
            template,
            images,
            output,
            config,
        } => {
            let (written, report) =
                insert_command(&template, &images, output.as_deref(), config.as_deref())?;
            for image in &report.images {
                println!(
                    "  {} -> {} ({})",
                    image.name, image.archive_path, image.relationship_id
                );
            }
            println!("Wrote {}", written.display());
        }
        Commands::Replace {
            template,
            index,
            ext,
            source,
            output,
            config,
        } => {
            let (written, media) = replace_command(
                &template,
                index,
                &ext,
                &source,
                output.as_deref(),
                config.as_deref(),
            )?;
            println!("  replaced {}", media);
            println!("Wrote {}", written.display());
        }
        Commands::Placeholders { template } => {
            let placeholders = placeholders_command(&template)?;
            for p in &placeholders {
                println!("{}\t{}\t{}\t{}", p.name, p.declared_type, p.width, p.height);
            }
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Execute the insert command
///
/// Images from the config's `[images]` table are used first; `--image`
/// arguments override entries with the same name. Returns the output path
/// and the insertion report.
pub fn insert_command(
    template: &Path,
    image_args: &[String],
    output: Option<&Path>,
    config: Option<&Path>,
) -> Result<(PathBuf, InsertReport)> {
    let settings = load_settings(config)?;

    let mut context = settings.image_context();
    context.extend(context_from_args(image_args)?);
    tracing::debug!(images = context.len(), "Built image context");

    let mut imager = open_template(template, settings)?;
    let report = imager
        .insert_image(&context)
        .with_context(|| format!("Failed to insert images into {}", template.display()))?;

    let written = imager.save(output).context("Failed to save document")?;
    Ok((written, report))
}

/// Execute the replace command
///
/// Returns the output path and the media part that was written.
pub fn replace_command(
    template: &Path,
    index: u32,
    extension: &str,
    source: &ReplaceSource,
    output: Option<&Path>,
    config: Option<&Path>,
) -> Result<(PathBuf, String)> {
    let settings = load_settings(config)?;
    let mut imager = open_template(template, settings)?;

    let media = match source {
        ReplaceSource { url: Some(url), .. } => {
            imager.replace_with_image_url(url, index, extension)
        }
        ReplaceSource {
            path: Some(path), ..
        } => imager.replace_with_local_image(&path.to_string_lossy(), index, extension),
        ReplaceSource { b64: Some(b64), .. } => {
            imager.replace_with_b64_image(b64, index, extension)
        }
        _ => anyhow::bail!("One of --url, --path or --b64 is required"),
    }
    .with_context(|| format!("Failed to replace image{index}.{extension}"))?;

    let written = imager.save(output).context("Failed to save document")?;
    Ok((written, media))
}

/// Execute the placeholders command
pub fn placeholders_command(template: &Path) -> Result<Placeholders> {
    let imager = open_template(template, Settings::default())?;
    imager
        .placeholders()
        .with_context(|| format!("No usable placeholders in {}", template.display()))
}

/// Parse a `NAME=REFERENCE` image argument
pub fn parse_image_arg(arg: &str) -> Result<(String, ImageRef)> {
    match arg.split_once('=') {
        Some((name, reference)) if !name.trim().is_empty() && !reference.trim().is_empty() => {
            Ok((name.trim().to_string(), ImageRef::parse(reference)))
        }
        _ => anyhow::bail!("Invalid image argument '{}': expected NAME=REFERENCE", arg),
    }
}

fn open_template(template: &Path, settings: Settings) -> Result<DocxImager> {
    if !template.exists() {
        anyhow::bail!("Template not found: {}", template.display());
    }

    let mut imager = DocxImager::with_settings(settings);
    imager
        .load(template)
        .with_context(|| format!("Failed to open DOCX file: {}", template.display()))?;
    Ok(imager)
}

/// Load settings from a config file or use defaults
fn load_settings(config_path: Option<&Path>) -> Result<Settings> {
    match config_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Settings::load(path)
                .with_context(|| format!("Failed to parse config: {}", path.display()))
        }
        None => {
            for candidate in CONFIG_CANDIDATES {
                let path = Path::new(candidate);
                if path.exists() {
                    tracing::debug!(config = candidate, "Using config file");
                    return Settings::load(path)
                        .with_context(|| format!("Failed to parse config: {}", candidate));
                }
            }
            Ok(Settings::default())
        }
    }
}

/// Build a context from `NAME=REFERENCE` arguments alone
pub fn context_from_args(image_args: &[String]) -> Result<ImageContext> {
    image_args.iter().map(|arg| parse_image_arg(arg)).collect()
}
