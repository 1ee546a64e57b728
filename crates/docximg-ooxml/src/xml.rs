//! Small XML helpers shared by the part writers

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{ImagerError, Result};

/// Escape special XML characters in attribute values
pub fn escape_attr(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Verify that a serialized part is well-formed
///
/// Checks that every start tag is closed by a matching end tag and that the
/// reader reaches the end of input without a syntax error. `part` names the
/// part in the error message.
pub fn check_well_formed(xml: &str, part: &str) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = true;

    let mut depth: usize = 0;
    let mut roots: usize = 0;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::End(_)) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    ImagerError::Malformed(format!("{part}: unexpected closing tag"))
                })?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ImagerError::Malformed(format!(
                    "{part}: {e} at byte {}",
                    reader.error_position()
                )))
            }
        }
    }

    if depth != 0 {
        return Err(ImagerError::Malformed(format!(
            "{part}: {depth} element(s) left open"
        )));
    }
    if roots != 1 {
        return Err(ImagerError::Malformed(format!(
            "{part}: expected one root element, found {roots}"
        )));
    }
    Ok(())
}
