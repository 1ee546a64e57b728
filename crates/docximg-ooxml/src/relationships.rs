//! Relationship table for `word/_rels/document.xml.rels`
//!
//! The body references images by relationship id (`r:embed="rId7"`); the table
//! maps each id to its media target. New ids continue from the highest
//! numeric suffix already present, so existing references are never reused.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ImagerError, Result};
use crate::xml::escape_attr;

/// OOXML namespace for relationships
pub const RELATIONSHIPS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Image relationship type URI
pub const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

/// One `<Relationship>` record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship id (e.g., "rId3")
    pub id: String,
    /// The relationship type URI
    pub rel_type: String,
    /// Target path relative to the owning part, or an external URL
    pub target: String,
    /// "External" for URLs, None for internal parts
    pub target_mode: Option<String>,
}

/// Parsed relationship table, kept in document order
#[derive(Debug, Clone)]
pub struct Relationships {
    records: Vec<Relationship>,
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }
}

impl Relationships {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a relationship table from XML bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut records = Vec::new();
        let mut max_id: u32 = 0;
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    match e.local_name().as_ref() {
                        b"Relationships" => saw_root = true,
                        b"Relationship" => {
                            let mut id = None;
                            let mut target = None;
                            let mut rel_type = None;
                            let mut target_mode = None;

                            for attr in e.attributes().filter_map(|a| a.ok()) {
                                let value = attr.unescape_value().ok().map(|s| s.to_string());
                                match attr.key.as_ref() {
                                    b"Id" => id = value,
                                    b"Target" => target = value,
                                    b"Type" => rel_type = value,
                                    b"TargetMode" => target_mode = value,
                                    _ => {}
                                }
                            }

                            if let (Some(id), Some(target)) = (id, target) {
                                if let Some(num) = extract_id_number(&id) {
                                    max_id = max_id.max(num);
                                }
                                records.push(Relationship {
                                    id,
                                    rel_type: rel_type.unwrap_or_default(),
                                    target,
                                    target_mode,
                                });
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ImagerError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(ImagerError::Malformed(
                "relationships part has no <Relationships> root".to_string(),
            ));
        }

        let next_id = max_id.checked_add(1).ok_or_else(|| {
            ImagerError::Malformed(format!(
                "relationship id rId{max_id} leaves no room for new ids"
            ))
        })?;

        Ok(Self { records, next_id })
    }

    /// Append an image relationship and return its generated id
    pub fn add_image(&mut self, target: impl Into<String>) -> Result<String> {
        self.push(IMAGE_REL_TYPE, target.into(), None)
    }

    /// Append a relationship of any type and return its generated id
    ///
    /// Fails once the numeric id space is exhausted.
    pub fn push(
        &mut self,
        rel_type: impl Into<String>,
        target: String,
        target_mode: Option<String>,
    ) -> Result<String> {
        let id = format!("rId{}", self.next_id);
        self.next_id = self.next_id.checked_add(1).ok_or_else(|| {
            ImagerError::Malformed(format!("no relationship id left after {id}"))
        })?;

        self.records.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.into(),
            target,
            target_mode,
        });
        Ok(id)
    }

    /// Serialize to an OOXML `.rels` part
    pub fn to_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<Relationships xmlns="{}">"#, RELATIONSHIPS_NS));

        for rel in &self.records {
            xml.push_str("<Relationship");
            xml.push_str(&format!(r#" Id="{}""#, escape_attr(&rel.id)));
            xml.push_str(&format!(r#" Type="{}""#, escape_attr(&rel.rel_type)));
            xml.push_str(&format!(r#" Target="{}""#, escape_attr(&rel.target)));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(r#" TargetMode="{}""#, escape_attr(mode)));
            }
            xml.push_str("/>");
        }

        xml.push_str("</Relationships>");
        xml
    }

    /// Look up a record by id
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Find the id already pointing at a target, if any
    pub fn id_for_target(&self, target: &str) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.target == target)
            .map(|r| r.id.as_str())
    }

    /// Check if a relationship is an image
    pub fn is_image(&self, id: &str) -> bool {
        self.get(id).is_some_and(|r| r.rel_type == IMAGE_REL_TYPE)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate over records in document order
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.records.iter()
    }

    /// The id the next call to [`Relationships::add_image`] will return
    pub fn peek_next_id(&self) -> String {
        format!("rId{}", self.next_id)
    }
}

/// Extract the numeric portion from a relationship ID (e.g., "rId5" -> 5)
fn extract_id_number(id: &str) -> Option<u32> {
    id.strip_prefix("rId")
        .or_else(|| id.strip_prefix("RId"))
        .or_else(|| id.strip_prefix("rid"))
        .and_then(|num_str| num_str.parse().ok())
}
