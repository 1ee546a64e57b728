//! Error types for image insertion

use thiserror::Error;

/// Coarse classification of an [`ImagerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// An operation was attempted before a package was loaded
    NotLoaded,
    /// No placeholder run was found where one was expected
    InvalidTemplate,
    /// Image bytes could not be obtained
    Retrieval,
    /// A package part could not be parsed, written, or serialized
    Packaging,
}

/// Errors that can occur while loading, mutating, or saving a package
#[derive(Error, Debug)]
pub enum ImagerError {
    /// No package has been loaded into the session
    #[error("No package loaded: call load() before mutating the document")]
    NotLoaded,

    /// The template body does not contain the expected placeholders
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// An image reference could not be resolved to bytes
    #[error("Failed to retrieve image '{reference}': {message}")]
    Retrieval { reference: String, message: String },

    /// A placeholder has no entry in the insertion context
    #[error("No image provided for placeholder '{0}'")]
    MissingContext(String),

    /// Error reading or writing the ZIP archive
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Error reading or writing files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing XML content
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Required part not found in the package
    #[error("Required part not found: {0}")]
    MissingPart(String),

    /// A part was produced or found in a malformed state
    #[error("Malformed part: {0}")]
    Malformed(String),
}

impl ImagerError {
    /// Build a retrieval error for the given reference
    pub fn retrieval(reference: impl Into<String>, message: impl ToString) -> Self {
        Self::Retrieval {
            reference: reference.into(),
            message: message.to_string(),
        }
    }

    /// Classify this error into one of the four reported kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotLoaded => ErrorKind::NotLoaded,
            Self::InvalidTemplate(_) => ErrorKind::InvalidTemplate,
            Self::Retrieval { .. } | Self::MissingContext(_) => ErrorKind::Retrieval,
            Self::Archive(_)
            | Self::Io(_)
            | Self::Xml(_)
            | Self::MissingPart(_)
            | Self::Malformed(_) => ErrorKind::Packaging,
        }
    }
}

/// Result type for image insertion operations
pub type Result<T> = std::result::Result<T, ImagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(ImagerError::NotLoaded.kind(), ErrorKind::NotLoaded);
        assert_eq!(
            ImagerError::InvalidTemplate("x".into()).kind(),
            ErrorKind::InvalidTemplate
        );
        assert_eq!(
            ImagerError::retrieval("logo.png", "not found").kind(),
            ErrorKind::Retrieval
        );
        assert_eq!(
            ImagerError::MissingContext("logo".into()).kind(),
            ErrorKind::Retrieval
        );
        assert_eq!(
            ImagerError::MissingPart("word/document.xml".into()).kind(),
            ErrorKind::Packaging
        );
    }

    #[test]
    fn test_retrieval_message() {
        let err = ImagerError::retrieval("https://example.com/a.png", "HTTP 404");
        assert_eq!(
            err.to_string(),
            "Failed to retrieve image 'https://example.com/a.png': HTTP 404"
        );
    }
}
