//! Four-phase image insertion
//!
//! Committing an image touches four parts that must agree with each other:
//!
//! 1. `[Content_Types].xml` gains an override for the media part
//! 2. `word/media/<file>` receives the bytes
//! 3. `word/_rels/document.xml.rels` gains a relationship to the media part
//! 4. `word/document.xml` has the placeholder run replaced by a drawing that
//!    embeds that relationship id
//!
//! Later phases consume identifiers produced by earlier ones, so the order is
//! fixed. All writes go through a [`Transaction`]; the package only changes
//! once every phase has succeeded.

use crate::content_types::{insert_overrides, ContentTypes};
use crate::drawing;
use crate::error::{ImagerError, Result};
use crate::media::{content_type_for_extension, MediaNamer};
use crate::normalize::normalize;
use crate::package::{
    Package, Transaction, CONTENT_TYPES_PATH, DOCUMENT_PATH, DOCUMENT_RELS_PATH, MEDIA_DIR,
};
use crate::placeholder::{extract_placeholders, find_placeholder_runs, Placeholders};
use crate::relationships::Relationships;
use crate::source::{ImageContext, ImageResolver};
use crate::xml::check_well_formed;

/// An image on its way into the package
///
/// Built from a placeholder and its resolved bytes; the media and
/// relationship phases fill in `archive_path` and `relationship_id`.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    /// Placeholder name
    pub name: String,
    /// File name under `word/media/`
    pub media_file_name: String,
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// Declared format token
    pub declared_type: String,
    /// MIME type derived from the declared format
    pub content_type: String,
    /// Declared width token
    pub width: String,
    /// Declared height token
    pub height: String,
    /// `word/media/<file>`, once written
    pub archive_path: Option<String>,
    /// Relationship id, once registered
    pub relationship_id: Option<String>,
}

impl ResolvedImage {
    /// Part name used in `[Content_Types].xml`
    pub fn part_name(&self) -> String {
        format!("/{MEDIA_DIR}{}", self.media_file_name)
    }

    /// Relationship target relative to `word/`
    pub fn relationship_target(&self) -> String {
        format!("media/{}", self.media_file_name)
    }

    fn require_relationship_id(&self) -> Result<&str> {
        self.relationship_id.as_deref().ok_or_else(|| {
            ImagerError::Malformed(format!(
                "image '{}' has no relationship id; relationships must be registered first",
                self.name
            ))
        })
    }
}

/// Summary of one inserted image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertedImage {
    /// Placeholder name
    pub name: String,
    /// Archive path of the media part
    pub archive_path: String,
    /// Relationship id embedded in the body
    pub relationship_id: String,
    /// Declared MIME type
    pub content_type: String,
}

/// Outcome of [`insert_images`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    /// Inserted images, in declaration order
    pub images: Vec<InsertedImage>,
}

/// Insert every placeholder's image into the package
///
/// Placeholders are extracted from `word/document.xml`, resolved one at a
/// time in declaration order through `resolver`, then committed through the
/// four phases. On any error the package is left exactly as it was.
pub fn insert_images(
    package: &mut Package,
    context: &ImageContext,
    resolver: &ImageResolver,
) -> Result<InsertReport> {
    let body = package.require_string(DOCUMENT_PATH)?;
    let placeholders = extract_placeholders(&normalize(&body))?;
    log::info!("Found {} image placeholder(s)", placeholders.len());

    let mut images = resolve_images(package, &placeholders, context, resolver)?;

    let mut tx = Transaction::new(package);
    register_content_types(&mut tx, &images)?;
    write_media(&mut tx, &mut images)?;
    register_relationships(&mut tx, &mut images)?;
    splice_body(&mut tx, &images)?;
    let commit = tx.into_commit();

    log::debug!("Committing {} staged part write(s)", commit.len());
    commit.apply(package);

    let images = images
        .into_iter()
        .map(|image| {
            Ok(InsertedImage {
                relationship_id: image.require_relationship_id()?.to_string(),
                archive_path: image.archive_path.unwrap_or_default(),
                name: image.name,
                content_type: image.content_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(InsertReport { images })
}

/// Resolve each placeholder's bytes and assign a media file name
pub fn resolve_images(
    package: &Package,
    placeholders: &Placeholders,
    context: &ImageContext,
    resolver: &ImageResolver,
) -> Result<Vec<ResolvedImage>> {
    let mut namer = MediaNamer::new(package.media_files());
    let mut images = Vec::with_capacity(placeholders.len());

    for placeholder in placeholders {
        let image_ref = context
            .get(&placeholder.name)
            .ok_or_else(|| ImagerError::MissingContext(placeholder.name.clone()))?;

        log::debug!(
            "Resolving '{}' from {:?} reference",
            placeholder.name,
            image_ref.mode
        );
        let bytes = resolver.resolve_ref(image_ref)?;

        images.push(ResolvedImage {
            name: placeholder.name.clone(),
            media_file_name: namer.next_name(&placeholder.declared_type),
            bytes,
            declared_type: placeholder.declared_type.clone(),
            content_type: content_type_for_extension(&placeholder.declared_type).to_string(),
            width: placeholder.width.clone(),
            height: placeholder.height.clone(),
            archive_path: None,
            relationship_id: None,
        });
    }

    Ok(images)
}

/// Phase 1: declare a content type for each new media part
///
/// Extensions already covered by a `<Default>` rule need no override.
pub fn register_content_types(tx: &mut Transaction<'_>, images: &[ResolvedImage]) -> Result<()> {
    let xml = tx.require_string(CONTENT_TYPES_PATH)?;
    let table = ContentTypes::parse(xml.as_bytes())?;

    let overrides: Vec<(String, String)> = images
        .iter()
        .filter(|image| !table.has_default(&image.declared_type))
        .map(|image| (image.part_name(), image.content_type.clone()))
        .collect();

    log::debug!("Adding {} content-type override(s)", overrides.len());
    let updated = insert_overrides(&xml, &overrides)?;
    tx.set_string(CONTENT_TYPES_PATH, updated);
    Ok(())
}

/// Phase 2: write each image's bytes under `word/media/`
pub fn write_media(tx: &mut Transaction<'_>, images: &mut [ResolvedImage]) -> Result<()> {
    for image in images.iter_mut() {
        let path = format!("{MEDIA_DIR}{}", image.media_file_name);
        if tx.contains(&path) {
            log::warn!("Overwriting existing media part {path}");
        }
        tx.set(path.clone(), image.bytes.clone());
        image.archive_path = Some(path);
    }
    Ok(())
}

/// Phase 3: register an image relationship for each media part
///
/// Ids continue from the highest numeric suffix in the existing table and
/// increase strictly across the batch.
pub fn register_relationships(
    tx: &mut Transaction<'_>,
    images: &mut [ResolvedImage],
) -> Result<()> {
    let mut rels = match tx.get(DOCUMENT_RELS_PATH) {
        Some(xml) => Relationships::parse(xml)?,
        None => Relationships::new(),
    };

    for image in images.iter_mut() {
        if image.archive_path.is_none() {
            return Err(ImagerError::Malformed(format!(
                "image '{}' has no media part; media must be written first",
                image.name
            )));
        }
        let id = rels.add_image(image.relationship_target())?;
        log::debug!("Registered {} -> {}", id, image.relationship_target());
        image.relationship_id = Some(id);
    }

    tx.set_string(DOCUMENT_RELS_PATH, rels.to_xml());
    Ok(())
}

/// Phase 4: replace placeholder runs with drawings
///
/// The body is normalized again and searched independently of extraction.
/// Only the first tag naming an image is replaced. Runs that only repeat
/// already-spliced names are left as they are. A repeat sharing a run with a
/// new tag is written back in its place as a plain text run.
/// The result must re-parse as well-formed XML.
pub fn splice_body(tx: &mut Transaction<'_>, images: &[ResolvedImage]) -> Result<()> {
    let raw = tx.require_string(DOCUMENT_PATH)?;
    let body = normalize(&raw);
    let runs = find_placeholder_runs(&body)?;
    if runs.is_empty() {
        return Err(ImagerError::InvalidTemplate(
            "no placeholder run found in document body at splice time".to_string(),
        ));
    }

    let mut spliced: Vec<&str> = Vec::new();
    let mut out = String::with_capacity(body.len() + runs.len() * 1600);
    let mut cursor = 0;

    for run in &runs {
        let mut fragment = String::new();
        let mut drew = false;
        for placeholder in &run.placeholders {
            let image = images
                .iter()
                .find(|image| image.name == placeholder.name)
                .ok_or_else(|| {
                    ImagerError::InvalidTemplate(format!(
                        "placeholder '{}' was not part of this insertion",
                        placeholder.name
                    ))
                })?;

            if spliced.contains(&image.name.as_str()) {
                log::warn!(
                    "Placeholder '{}' appears again; only the first occurrence is replaced",
                    image.name
                );
                fragment.push_str(&format!(
                    r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#,
                    placeholder.tag()
                ));
                continue;
            }

            fragment.push_str(&drawing::synthesize(
                image.require_relationship_id()?,
                &image.height,
                &image.width,
            )?);
            spliced.push(&image.name);
            drew = true;
        }

        if !drew {
            continue;
        }
        out.push_str(&body[cursor..run.range.start]);
        out.push_str(&fragment);
        cursor = run.range.end;
    }
    out.push_str(&body[cursor..]);

    check_well_formed(&out, DOCUMENT_PATH).map_err(|err| match err {
        ImagerError::Malformed(message) => match decoded_markup_hint(&raw) {
            Some(hint) => ImagerError::Malformed(format!("{message}; {hint}")),
            None => ImagerError::Malformed(message),
        },
        other => other,
    })?;
    tx.set_string(DOCUMENT_PATH, out);
    Ok(())
}

/// Explain a splice failure caused by entity decoding, if that is the likely cause
fn decoded_markup_hint(raw_body: &str) -> Option<&'static str> {
    if raw_body.contains("&lt;") {
        Some("the template text contains '<' (stored as &lt;), which placeholder normalization decodes into markup")
    } else if raw_body.contains("&quot;") {
        Some("the template contains '\"' (stored as &quot;), which placeholder normalization decodes inside attribute values")
    } else {
        None
    }
}
