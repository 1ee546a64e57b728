//! Integration tests for docximg CLI
//!
//! These tests drive the command functions against real files:
//! template DOCX -> insert/replace -> output DOCX

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use docximg_cli::{insert_command, placeholders_command, replace_command, ReplaceSource};

/// Create a minimal DOCX template whose body is `body`
fn create_test_template(body: &str) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    let mut zip = ZipWriter::new(&mut buffer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    // [Content_Types].xml
    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Default Extension="jpeg" ContentType="image/jpeg"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#).unwrap();

    // _rels/.rels
    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#).unwrap();

    // word/_rels/document.xml.rels
    zip.start_file("word/_rels/document.xml.rels", options)
        .unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId4" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.jpeg"/>
</Relationships>"#,
    )
    .unwrap();

    // word/media/image1.jpeg (existing picture)
    zip.start_file("word/media/image1.jpeg", options).unwrap();
    zip.write_all(&[0xFF, 0xD8, 0xFF]).unwrap();

    // word/document.xml
    zip.start_file("word/document.xml", options).unwrap();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing">
  <w:body>
    {body}
  </w:body>
</w:document>"#
    );
    zip.write_all(document.as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer.into_inner()
}

fn read_part(docx: &Path, name: &str) -> Option<Vec<u8>> {
    let mut archive = ZipArchive::new(fs::File::open(docx).unwrap()).unwrap();
    let mut file = archive.by_name(name).ok()?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).unwrap();
    Some(contents)
}

fn read_string(docx: &Path, name: &str) -> String {
    String::from_utf8(read_part(docx, name).expect("part not found")).unwrap()
}

#[test]
fn test_insert_from_arguments() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let temp_path = temp_dir.path();

    let template_path = temp_path.join("template.docx");
    fs::write(
        &template_path,
        create_test_template(
            r#"<w:p><w:r><w:t>{{insert_image logo png 200 100}}</w:t></w:r></w:p>
    <w:p><w:r><w:t>{{insert_image seal png 64 64}}</w:t></w:r></w:p>"#,
        ),
    )
    .unwrap();

    let logo_path = temp_path.join("logo.png");
    fs::write(&logo_path, [0x89, b'P', b'N', b'G', 1]).unwrap();
    let seal_bytes = [0x89, b'P', b'N', b'G', 2];

    let output_path = temp_path.join("out.docx");
    let images = vec![
        format!("logo={}", logo_path.display()),
        format!("seal=b64:{}", STANDARD.encode(seal_bytes)),
    ];
    let (written, report) =
        insert_command(&template_path, &images, Some(output_path.as_path()), None).unwrap();

    assert_eq!(written, output_path);
    assert_eq!(report.images.len(), 2);

    // image1 is taken by the template's own picture
    assert_eq!(
        read_part(&output_path, "word/media/image2.png").unwrap(),
        vec![0x89, b'P', b'N', b'G', 1]
    );
    assert_eq!(
        read_part(&output_path, "word/media/image3.png").unwrap(),
        seal_bytes.to_vec()
    );

    let rels = read_string(&output_path, "word/_rels/document.xml.rels");
    assert!(rels.contains(r#"Id="rId5""#), "ids continue after rId4");
    assert!(rels.contains(r#"Id="rId6""#));
    assert!(rels.contains(r#"Target="media/image2.png""#));

    let types = read_string(&output_path, "[Content_Types].xml");
    assert!(types.contains(r#"PartName="/word/media/image2.png""#));
    assert!(types.contains(r#"PartName="/word/media/image3.png""#));

    let document = read_string(&output_path, "word/document.xml");
    assert!(!document.contains("insert_image"));
    assert!(document.contains(r#"<wp:extent cx="1905000" cy="952500"/>"#));
    assert!(document.contains(r#"<wp:extent cx="609600" cy="609600"/>"#));

    // The template itself is untouched
    let template_doc = read_string(&template_path, "word/document.xml");
    assert!(template_doc.contains("insert_image logo"));
}

#[test]
fn test_insert_from_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let temp_path = temp_dir.path();

    let template_path = temp_path.join("template.docx");
    fs::write(
        &template_path,
        create_test_template(r#"<w:p><w:r><w:t>{{insert_image badge jpeg 32 32}}</w:t></w:r></w:p>"#),
    )
    .unwrap();

    let output_path = temp_path.join("configured.docx");
    let config_path = temp_path.join("docximg.toml");
    fs::write(
        &config_path,
        format!(
            "[output]\npath = {:?}\n\n[images]\nbadge = \"b64:{}\"\n",
            output_path.to_string_lossy(),
            STANDARD.encode([1u8, 2, 3])
        ),
    )
    .unwrap();

    let (written, _) = insert_command(&template_path, &[], None, Some(config_path.as_path())).unwrap();
    assert_eq!(written, output_path);

    assert_eq!(
        read_part(&output_path, "word/media/image2.jpeg").unwrap(),
        vec![1, 2, 3]
    );

    // jpeg already has a Default entry, so no override is added
    let types = read_string(&output_path, "[Content_Types].xml");
    assert!(!types.contains("/word/media/image2.jpeg"));
}

#[test]
fn test_insert_missing_image_fails_without_output() {
    let temp_dir = TempDir::new().unwrap();
    let template_path = temp_dir.path().join("template.docx");
    fs::write(
        &template_path,
        create_test_template(r#"<w:p><w:r><w:t>{{insert_image logo png 1 1}}</w:t></w:r></w:p>"#),
    )
    .unwrap();

    let output_path = temp_dir.path().join("out.docx");
    let err = insert_command(&template_path, &[], Some(output_path.as_path()), None).unwrap_err();

    assert!(format!("{:#}", err).contains("logo"));
    assert!(!output_path.exists());
}

#[test]
fn test_replace_existing_media() {
    let temp_dir = TempDir::new().unwrap();
    let template_path = temp_dir.path().join("template.docx");
    fs::write(&template_path, create_test_template("<w:p/>")).unwrap();

    let new_image = temp_dir.path().join("new.jpeg");
    fs::write(&new_image, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

    let output_path = temp_dir.path().join("out.docx");
    let source = ReplaceSource {
        path: Some(new_image),
        ..ReplaceSource::default()
    };
    let (_, media) =
        replace_command(&template_path, 1, "jpeg", &source, Some(output_path.as_path()), None).unwrap();

    assert_eq!(media, "word/media/image1.jpeg");
    assert_eq!(
        read_part(&output_path, "word/media/image1.jpeg").unwrap(),
        vec![0xFF, 0xD8, 0xFF, 0xE0]
    );
    assert_eq!(
        read_string(&output_path, "word/_rels/document.xml.rels"),
        read_string(&template_path, "word/_rels/document.xml.rels")
    );
}

#[test]
fn test_replace_rejects_path_like_extension() {
    let temp_dir = TempDir::new().unwrap();
    let template_path = temp_dir.path().join("template.docx");
    fs::write(&template_path, create_test_template("<w:p/>")).unwrap();

    let output_path = temp_dir.path().join("out.docx");
    let source = ReplaceSource {
        b64: Some(STANDARD.encode([1u8, 2, 3])),
        ..ReplaceSource::default()
    };
    let err = replace_command(&template_path, 1, "jpeg/../x", &source, Some(output_path.as_path()), None)
        .unwrap_err();

    assert!(format!("{:#}", err).contains("invalid media extension"));
    assert!(!output_path.exists());
}

#[test]
fn test_placeholders_listing() {
    let temp_dir = TempDir::new().unwrap();
    let template_path = temp_dir.path().join("template.docx");
    fs::write(
        &template_path,
        create_test_template(concat!(
            r#"<w:p><w:r><w:t>{{insert_image header png 600 80}}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>{{insert_image foot</w:t></w:r><w:r><w:t>er gif 600 40}}</w:t></w:r></w:p>"#,
        )),
    )
    .unwrap();

    let placeholders = placeholders_command(&template_path).unwrap();
    let names: Vec<&str> = placeholders.names().collect();
    assert_eq!(names, vec!["header", "footer"]);
    assert_eq!(placeholders.get("footer").unwrap().declared_type, "gif");
}

#[test]
fn test_missing_template() {
    let err = placeholders_command(Path::new("/no/such/template.docx")).unwrap_err();
    assert!(err.to_string().contains("Template not found"));
}
