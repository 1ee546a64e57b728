//! Inline drawing markup for inserted images
//!
//! The synthesized run replaces a placeholder run in `word/document.xml`:
//!
//! ```xml
//! <w:r>
//!   <w:drawing>
//!     <wp:inline>
//!       <wp:extent cx="…" cy="…"/>            <!-- size in EMUs -->
//!       <a:graphic>
//!         <a:graphicData uri="…/picture">
//!           <pic:pic>
//!             <pic:blipFill>
//!               <a:blip r:embed="rIdNN"/>    <!-- relationship id -->
//!             </pic:blipFill>
//!           </pic:pic>
//!         </a:graphicData>
//!       </a:graphic>
//!     </wp:inline>
//!   </w:drawing>
//! </w:r>
//! ```
//!
//! The `wp`, `w` and `r` prefixes are expected to be declared on the document
//! root; `a` and `pic` are declared inline.

use crate::error::{ImagerError, Result};
use crate::xml::escape_attr;

/// EMUs per logical unit (one pixel at 96 DPI)
pub const EMU_PER_UNIT: i64 = 9525;

/// DrawingML main namespace
pub const DRAWINGML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// DrawingML picture namespace
pub const PICTURE_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";

/// Fixed `wp:docPr` id; Word does not require these to be unique
const DOC_PR_ID: u32 = 1402;

/// Convert logical units to EMUs
pub fn units_to_emu(units: f64) -> i64 {
    (units * EMU_PER_UNIT as f64).round() as i64
}

/// Parse a width/height token into logical units
pub fn parse_units(token: &str, what: &str) -> Result<f64> {
    match token.trim().parse::<f64>() {
        Ok(units) if units.is_finite() && units >= 0.0 => Ok(units),
        _ => Err(ImagerError::InvalidTemplate(format!(
            "{what} '{token}' is not a non-negative number"
        ))),
    }
}

/// Build the drawing run for a relationship id and declared size tokens
pub fn synthesize(relationship_id: &str, height: &str, width: &str) -> Result<String> {
    let height = parse_units(height, "height")?;
    let width = parse_units(width, "width")?;
    Ok(synthesize_emu(
        relationship_id,
        units_to_emu(height),
        units_to_emu(width),
    ))
}

/// Build the drawing run for a relationship id and size in EMUs
pub fn synthesize_emu(relationship_id: &str, cy: i64, cx: i64) -> String {
    let rid = escape_attr(relationship_id);

    let mut xml = String::with_capacity(1600);
    xml.push_str("<w:r><w:rPr><w:noProof/></w:rPr><w:drawing>");
    xml.push_str(r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#);
    xml.push_str(&format!(r#"<wp:extent cx="{cx}" cy="{cy}"/>"#));
    xml.push_str(r#"<wp:effectExtent l="0" t="0" r="0" b="0"/>"#);
    xml.push_str(&format!(
        r#"<wp:docPr id="{DOC_PR_ID}" name="Picture" descr=""/>"#
    ));
    xml.push_str(&format!(
        r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{DRAWINGML_NS}" noChangeAspect="1"/></wp:cNvGraphicFramePr>"#
    ));
    xml.push_str(&format!(r#"<a:graphic xmlns:a="{DRAWINGML_NS}">"#));
    xml.push_str(&format!(r#"<a:graphicData uri="{PICTURE_NS}">"#));
    xml.push_str(&format!(r#"<pic:pic xmlns:pic="{PICTURE_NS}">"#));
    xml.push_str(r#"<pic:nvPicPr><pic:cNvPr id="1" name="Picture" descr=""/>"#);
    xml.push_str(r#"<pic:cNvPicPr><a:picLocks noChangeAspect="0" noChangeArrowheads="1"/></pic:cNvPicPr></pic:nvPicPr>"#);
    xml.push_str(&format!(
        r#"<pic:blipFill><a:blip r:embed="{rid}"/><a:srcRect/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#
    ));
    xml.push_str(r#"<pic:spPr bwMode="auto">"#);
    xml.push_str(&format!(
        r#"<a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#
    ));
    xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/><a:ln><a:noFill/></a:ln>"#);
    xml.push_str("</pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_units_to_emu() {
        assert_eq!(units_to_emu(100.0), 952_500);
        assert_eq!(units_to_emu(0.0), 0);
        assert_eq!(units_to_emu(1.5), 14_288);
    }

    #[test]
    fn test_synthesize_extent() {
        let xml = synthesize("rId7", "50", "100").unwrap();
        assert!(xml.contains(r#"<wp:extent cx="952500" cy="476250"/>"#));
        assert!(xml.contains(r#"<a:ext cx="952500" cy="476250"/>"#));
        assert!(xml.contains(r#"<a:blip r:embed="rId7"/>"#));
        assert!(xml.contains(r#"noChangeAspect="1""#));
    }

    #[test]
    fn test_synthesize_is_one_run() {
        let xml = synthesize("rId1", "10", "10").unwrap();
        assert!(xml.starts_with("<w:r>"));
        assert!(xml.ends_with("</w:r>"));
        let wrapped = format!(
            r#"<w:p xmlns:w="w" xmlns:wp="wp" xmlns:r="r">{xml}</w:p>"#
        );
        assert!(crate::xml::check_well_formed(&wrapped, "fragment").is_ok());
    }

    #[test]
    fn test_synthesize_rejects_non_numeric() {
        let err = synthesize("rId1", "tall", "10").unwrap_err();
        assert!(matches!(err, ImagerError::InvalidTemplate(ref m) if m.contains("height 'tall'")));
        assert!(synthesize("rId1", "10", "-5").is_err());
    }
}
