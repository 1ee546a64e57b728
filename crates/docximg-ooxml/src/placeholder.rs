//! `insert_image` placeholder extraction
//!
//! A placeholder is a run whose text carries a tag of the form
//!
//! ```text
//! {{insert_image <name> <type> <width> <height>}}
//! ```
//!
//! Extraction works on a body that has already been through
//! [`crate::normalize::normalize`], so each tag is contiguous. The same run
//! search is used again at splice time to find the markup to replace.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ImagerError, Result};

/// Keyword that marks an image placeholder
pub const INSERT_IMAGE: &str = "insert_image";

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{(.*?)\}\}").unwrap())
}

/// One declared image placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Context key the image is looked up by
    pub name: String,
    /// Image format token (e.g., "png")
    pub declared_type: String,
    /// Width token, as written in the template
    pub width: String,
    /// Height token, as written in the template
    pub height: String,
}

impl Placeholder {
    /// Parse the inner text of a `{{…}}` tag
    pub fn parse_tag(inner: &str) -> Result<Self> {
        let tokens: Vec<&str> = inner.split_whitespace().collect();
        match tokens.as_slice() {
            [keyword, name, declared_type, width, height] if *keyword == INSERT_IMAGE => {
                Ok(Self {
                    name: name.to_string(),
                    declared_type: declared_type.to_string(),
                    width: width.to_string(),
                    height: height.to_string(),
                })
            }
            _ => Err(ImagerError::InvalidTemplate(format!(
                "expected {{{{{INSERT_IMAGE} <name> <type> <width> <height>}}}}, found {{{{{inner}}}}}"
            ))),
        }
    }

    /// The tag text in canonical single-spaced form
    pub fn tag(&self) -> String {
        format!(
            "{{{{{INSERT_IMAGE} {} {} {} {}}}}}",
            self.name, self.declared_type, self.width, self.height
        )
    }
}

/// A run in the body that carries one or more placeholder tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderRun {
    /// Byte range of the whole `<w:r>…</w:r>` element
    pub range: Range<usize>,
    /// Placeholders declared inside the run, in order
    pub placeholders: Vec<Placeholder>,
}

/// Placeholders keyed by name, in order of first declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Placeholders {
    entries: Vec<Placeholder>,
}

impl Placeholders {
    /// Record a placeholder; a repeated name replaces the earlier metadata
    /// but keeps its original position
    pub fn insert(&mut self, placeholder: Placeholder) {
        match self.entries.iter_mut().find(|p| p.name == placeholder.name) {
            Some(existing) => {
                log::warn!(
                    "Placeholder '{}' is declared more than once; using the last declaration",
                    placeholder.name
                );
                *existing = placeholder;
            }
            None => self.entries.push(placeholder),
        }
    }

    /// Look up a placeholder by name
    pub fn get(&self, name: &str) -> Option<&Placeholder> {
        self.entries.iter().find(|p| p.name == name)
    }

    /// Iterate in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.entries.iter()
    }

    /// Placeholder names in declaration order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|p| p.name.as_str())
    }

    /// Number of distinct names
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no placeholder was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Placeholders {
    type Item = &'a Placeholder;
    type IntoIter = std::slice::Iter<'a, Placeholder>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Extract every `insert_image` placeholder from a normalized body
///
/// Fails with `InvalidTemplate` if the body declares none, or if a tag does
/// not have exactly five tokens.
pub fn extract_placeholders(normalized_body: &str) -> Result<Placeholders> {
    let runs = find_placeholder_runs(normalized_body)?;
    if runs.is_empty() {
        return Err(ImagerError::InvalidTemplate(format!(
            "no {INSERT_IMAGE} placeholder found in document body"
        )));
    }

    let mut placeholders = Placeholders::default();
    for run in runs {
        for placeholder in run.placeholders {
            placeholders.insert(placeholder);
        }
    }
    Ok(placeholders)
}

/// Locate every run element carrying an `insert_image` tag
pub fn find_placeholder_runs(body: &str) -> Result<Vec<PlaceholderRun>> {
    let mut runs = Vec::new();
    let mut cursor = 0;

    while let Some(rel) = body[cursor..].find(INSERT_IMAGE) {
        let hit = cursor + rel;

        let Some(range) = enclosing_run(body, hit) else {
            cursor = hit + INSERT_IMAGE.len();
            continue;
        };

        let run_xml = &body[range.clone()];
        let mut placeholders = Vec::new();
        for caps in tag_re().captures_iter(run_xml) {
            let inner = &caps[1];
            if inner.contains(INSERT_IMAGE) {
                placeholders.push(Placeholder::parse_tag(inner)?);
            }
        }

        if placeholders.is_empty() {
            log::debug!("Ignoring '{INSERT_IMAGE}' outside a {{{{…}}}} tag at byte {hit}");
        } else {
            runs.push(PlaceholderRun {
                range: range.clone(),
                placeholders,
            });
        }
        cursor = range.end;
    }

    Ok(runs)
}

/// Byte range of the `<w:r>` element that contains `pos`, if any
fn enclosing_run(body: &str, pos: usize) -> Option<Range<usize>> {
    let start = run_open_before(body, pos)?;
    if body[start..pos].contains("</w:r>") {
        return None;
    }
    let close = body[pos..].find("</w:r>")?;
    Some(start..pos + close + "</w:r>".len())
}

/// Nearest `<w:r>` or `<w:r …>` opening tag before `pos`
///
/// Skips `<w:rPr>`, `<w:rFonts>` and other elements sharing the prefix.
fn run_open_before(body: &str, pos: usize) -> Option<usize> {
    let mut end = pos;
    while let Some(idx) = body[..end].rfind("<w:r") {
        let rest = &body[idx + "<w:r".len()..];
        if rest.starts_with('>') || rest.starts_with(|c: char| c.is_ascii_whitespace()) {
            return Some(idx);
        }
        end = idx;
    }
    None
}
