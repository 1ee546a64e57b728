//! Numbered media replacement
//!
//! Word names embedded pictures `word/media/image<N>.<ext>`. Replacing one of
//! them swaps the picture everywhere it is referenced without touching the
//! body, relationships or content types.

use crate::error::{ImagerError, Result};
use crate::media::{is_valid_extension, numbered_media_path};
use crate::package::Package;

/// Overwrite `word/media/image<index>.<extension>` with `bytes`
///
/// The part is created if it does not exist; nothing references it in that
/// case, so the document renders unchanged. Returns the archive path written.
/// Extensions other than a plain alphanumeric token are rejected.
pub fn replace_numbered_image(
    package: &mut Package,
    bytes: Vec<u8>,
    image_index: u32,
    extension: &str,
) -> Result<String> {
    check_extension(extension)?;
    let path = numbered_media_path(image_index, extension);
    if package.contains(&path) {
        log::info!("Replacing {} ({} bytes)", path, bytes.len());
    } else {
        log::debug!("{path} did not exist; adding it as an unreferenced part");
    }
    package.set(path.clone(), bytes);
    Ok(path)
}

/// Fail unless `extension` can be used in a media file name
pub fn check_extension(extension: &str) -> Result<()> {
    if is_valid_extension(extension) {
        Ok(())
    } else {
        Err(ImagerError::Malformed(format!(
            "invalid media extension '{extension}': expected letters and digits only"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::DOCUMENT_PATH;
    use crate::test_utils::{docx_with_body, paragraph};

    #[test]
    fn test_replace_existing_part() {
        let mut package = docx_with_body(&paragraph("Pictured"));
        package.set("word/media/image2.jpeg", vec![1, 1, 1]);
        let body_before = package.get_string(DOCUMENT_PATH);

        let path = replace_numbered_image(&mut package, vec![7, 8, 9], 2, "jpeg").unwrap();

        assert_eq!(path, "word/media/image2.jpeg");
        assert_eq!(package.get(&path).unwrap(), &[7, 8, 9]);
        assert_eq!(package.get_string(DOCUMENT_PATH), body_before);
    }

    #[test]
    fn test_replace_missing_part_adds_it() {
        let mut package = docx_with_body(&paragraph("Pictured"));
        let parts_before = package.len();

        replace_numbered_image(&mut package, vec![1], 5, "png").unwrap();

        assert_eq!(package.len(), parts_before + 1);
        assert!(package.contains("word/media/image5.png"));
    }

    #[test]
    fn test_extension_is_part_of_the_name() {
        let mut package = docx_with_body(&paragraph("Pictured"));
        package.set("word/media/image1.png", vec![1]);

        replace_numbered_image(&mut package, vec![2], 1, "jpeg").unwrap();

        assert_eq!(package.get("word/media/image1.png").unwrap(), &[1]);
        assert_eq!(package.get("word/media/image1.jpeg").unwrap(), &[2]);
    }

    #[test]
    fn test_path_like_extension_rejected() {
        let mut package = docx_with_body(&paragraph("Pictured"));
        let parts_before = package.len();

        for ext in ["png/../x", "", "p.ng", "png "] {
            let err = replace_numbered_image(&mut package, vec![1], 1, ext).unwrap_err();
            assert!(matches!(err, ImagerError::Malformed(_)), "{ext:?}");
        }
        assert_eq!(package.len(), parts_before);
    }
}
