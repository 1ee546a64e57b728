//! Shared test fixtures for docximg-ooxml

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::CompressionMethod;
use zip::ZipWriter;

use crate::package::Package;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

/// Wrap body content in a `w:document` root declaring the drawing prefixes
pub fn document_xml(body: &str) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
            r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">"#,
            r#"<w:body>{}</w:body></w:document>"#
        ),
        body
    )
}

/// A paragraph with a single plain run
pub fn paragraph(text: &str) -> String {
    format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
}

/// Zip a minimal DOCX whose body is `body`
///
/// The document relationships already hold `rId1`, so the first image
/// relationship is `rId2`.
pub fn docx_bytes_with_body(body: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    let parts = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/document.xml", document_xml(body)),
    ];
    for (path, contents) in parts {
        zip.start_file(path, options).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }

    zip.finish().unwrap();
    buffer.into_inner()
}

/// Unpacked form of [`docx_bytes_with_body`]
pub fn docx_with_body(body: &str) -> Package {
    Package::from_bytes(&docx_bytes_with_body(body)).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{CONTENT_TYPES_PATH, DOCUMENT_PATH, DOCUMENT_RELS_PATH};

    #[test]
    fn test_docx_with_body() {
        let package = docx_with_body(&paragraph("Hello"));

        assert!(package.contains(CONTENT_TYPES_PATH));
        assert!(package.contains(DOCUMENT_RELS_PATH));
        assert!(package.contains("_rels/.rels"));

        let body = package.get_string(DOCUMENT_PATH).unwrap();
        assert!(body.contains("<w:t>Hello</w:t>"));
        assert!(body.contains("xmlns:wp="));
    }

    #[test]
    fn test_fixture_is_well_formed() {
        let xml = document_xml(&paragraph("x"));
        assert!(crate::xml::check_well_formed(&xml, DOCUMENT_PATH).is_ok());
    }
}
