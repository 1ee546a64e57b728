//! `[Content_Types].xml` handling
//!
//! Every part in a package needs a content type, declared either by a
//! `<Default Extension="…">` rule or a per-part `<Override PartName="…">`.
//! New media parts whose extension has no default rule get an override
//! inserted directly after the `<Types>` opening tag; the rest of the part is
//! left byte-for-byte as it was.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ImagerError, Result};
use crate::xml::escape_attr;

/// Parsed view of the content-type table
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse the content-type table
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);

        let mut table = Self::default();
        let mut saw_root = false;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                    let (key, is_default) = match e.local_name().as_ref() {
                        b"Types" => {
                            saw_root = true;
                            (None, false)
                        }
                        b"Default" => (Some(&b"Extension"[..]), true),
                        b"Override" => (Some(&b"PartName"[..]), false),
                        _ => (None, false),
                    };

                    if let Some(key) = key {
                        let mut subject = None;
                        let mut content_type = None;
                        for attr in e.attributes().filter_map(|a| a.ok()) {
                            let value = attr.unescape_value().ok().map(|s| s.to_string());
                            if attr.key.as_ref() == key {
                                subject = value;
                            } else if attr.key.as_ref() == b"ContentType" {
                                content_type = value;
                            }
                        }
                        if let (Some(subject), Some(content_type)) = (subject, content_type) {
                            let target = if is_default {
                                &mut table.defaults
                            } else {
                                &mut table.overrides
                            };
                            target.push((subject, content_type));
                        }
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
                "[Content_Types].xml has no <Types> root".to_string(),
            ));
        }
        Ok(table)
    }

    /// Check whether a default rule covers the extension (case-insensitive)
    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults
            .iter()
            .any(|(ext, _)| ext.eq_ignore_ascii_case(extension))
    }

    /// Content type declared for an exact part name, if overridden
    pub fn override_for(&self, part_name: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(part, _)| part == part_name)
            .map(|(_, ct)| ct.as_str())
    }

    /// Count overrides for a part name
    pub fn override_count(&self, part_name: &str) -> usize {
        self.overrides
            .iter()
            .filter(|(part, _)| part == part_name)
            .count()
    }
}

/// Insert `<Override>` entries right after the `<Types>` opening tag
///
/// A self-closing `<Types …/>` root is expanded into an open/close pair.
pub fn insert_overrides(xml: &str, overrides: &[(String, String)]) -> Result<String> {
    if overrides.is_empty() {
        return Ok(xml.to_string());
    }

    let (start, end) = find_types_open_tag(xml).ok_or_else(|| {
        ImagerError::Malformed("[Content_Types].xml has no <Types> opening tag".to_string())
    })?;

    let mut entries = String::new();
    for (part_name, content_type) in overrides {
        entries.push_str(&format!(
            r#"<Override PartName="{}" ContentType="{}"/>"#,
            escape_attr(part_name),
            escape_attr(content_type)
        ));
    }

    let open_tag = &xml[start..end];
    let mut out = String::with_capacity(xml.len() + entries.len() + 8);
    out.push_str(&xml[..start]);
    if let Some(head) = open_tag.strip_suffix("/>") {
        out.push_str(head.trim_end());
        out.push('>');
        out.push_str(&entries);
        out.push_str("</Types>");
    } else {
        out.push_str(open_tag);
        out.push_str(&entries);
    }
    out.push_str(&xml[end..]);
    Ok(out)
}

/// Byte range of the `<Types …>` opening tag, including its `>`
fn find_types_open_tag(xml: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(rel) = xml[from..].find("<Types") {
        let start = from + rel;
        let after = start + "<Types".len();
        match xml[after..].chars().next() {
            Some(c) if c == '>' || c == '/' || c.is_whitespace() => {
                let close = xml[after..].find('>')?;
                return Some((start, after + close + 1));
            }
            _ => from = after,
        }
    }
    None
}
