//! Placeholder text normalization
//!
//! Word splits a run's text whenever spell-check state, revision marks, or
//! formatting change, so a tag typed as `{{insert_image logo png 100 50}}` may
//! be stored as
//!
//! ```xml
//! <w:t>{{insert_image lo</w:t></w:r><w:r><w:t>go png 100 50}}</w:t>
//! ```
//!
//! [`normalize`] finds every brace-delimited span, strips the text-element
//! boundaries inside it so the tag reads contiguously again, then decodes the
//! basic XML entities. `&amp;` is deliberately left encoded.

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Matches a possible variable span: `{{` or `{…{`, content, then `}}` or `}…}`
/// where the final `}` is preceded by a non-brace character.
fn variable_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\{\{|\{(.*?)\{)(.*?)(\}\}|\}(.*?)(?:[^}])\})").unwrap())
}

/// Matches a text-element close followed by the next text-element open
fn text_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"</w:t>.*?(<w:t>|<w:t [^>]*>)").unwrap())
}

/// Coalesce split placeholders and decode entities
pub fn normalize(raw: &str) -> String {
    decode_entities(&coalesce(raw))
}

/// Merge placeholder text fragmented across adjacent `<w:t>` elements
pub fn coalesce(raw: &str) -> String {
    variable_span_re()
        .replace_all(raw, |caps: &Captures<'_>| {
            text_boundary_re().replace_all(&caps[0], "").into_owned()
        })
        .into_owned()
}

/// Decode `&quot;`, `&gt;`, `&lt;` and `&apos;`
pub fn decode_entities(xml: &str) -> String {
    xml.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&apos;", "'")
}
