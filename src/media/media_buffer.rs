use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Upload,
    Capture,
}

/// Image types the pipeline knows about. Anything else is kept verbatim in
/// `Unrecognized` so the validator can report what was declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MimeType {
    Png,
    Jpeg,
    Gif,
    Webp,
    Bmp,
    Unrecognized(String),
}

impl MimeType {
    /// Parses a declared content type. Parameters after `;` are ignored and
    /// the comparison is case-insensitive.
    pub fn parse(raw: &str) -> Self {
        let essence = raw.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/png" => MimeType::Png,
            "image/jpeg" | "image/jpg" | "image/pjpeg" => MimeType::Jpeg,
            "image/gif" => MimeType::Gif,
            "image/webp" => MimeType::Webp,
            "image/bmp" | "image/x-ms-bmp" => MimeType::Bmp,
            _ => MimeType::Unrecognized(raw.trim().to_string()),
        }
    }

    pub fn from_image_format(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Png => MimeType::Png,
            image::ImageFormat::Jpeg => MimeType::Jpeg,
            image::ImageFormat::Gif => MimeType::Gif,
            image::ImageFormat::WebP => MimeType::Webp,
            image::ImageFormat::Bmp => MimeType::Bmp,
            other => MimeType::Unrecognized(other.to_mime_type().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            MimeType::Png => "image/png",
            MimeType::Jpeg => "image/jpeg",
            MimeType::Gif => "image/gif",
            MimeType::Webp => "image/webp",
            MimeType::Bmp => "image/bmp",
            MimeType::Unrecognized(raw) => raw,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MimeType::Png => "png",
            MimeType::Jpeg => "jpg",
            MimeType::Gif => "gif",
            MimeType::Webp => "webp",
            MimeType::Bmp => "bmp",
            MimeType::Unrecognized(_) => "bin",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, MimeType::Unrecognized(_))
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image bytes plus the metadata the rest of the pipeline needs. The bytes
/// are shared read-only, so handing a buffer from stage to stage never copies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaBuffer {
    bytes: Arc<[u8]>,
    mime_type: MimeType,
    source_kind: SourceKind,
    file_name: String,
}

impl MediaBuffer {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        mime_type: MimeType,
        source_kind: SourceKind,
        file_name: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type,
            source_kind,
            file_name: file_name.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &MimeType {
        &self.mime_type
    }

    pub fn source_kind(&self) -> SourceKind {
        self.source_kind
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_types() {
        assert_eq!(MimeType::parse("image/png"), MimeType::Png);
        assert_eq!(MimeType::parse("IMAGE/JPEG"), MimeType::Jpeg);
        assert_eq!(MimeType::parse("image/jpg"), MimeType::Jpeg);
        assert_eq!(MimeType::parse("image/webp; q=0.9"), MimeType::Webp);
    }

    #[test]
    fn test_parse_keeps_unrecognized_declaration() {
        assert_eq!(
            MimeType::parse("text/plain"),
            MimeType::Unrecognized("text/plain".to_string())
        );
        assert!(!MimeType::parse("image/tiff").is_recognized());
    }

    #[test]
    fn test_size_matches_byte_length() {
        let buffer = MediaBuffer::new(vec![1u8; 42], MimeType::Png, SourceKind::Upload, "a.png");
        assert_eq!(buffer.size_bytes(), 42);
        assert_eq!(buffer.bytes().len(), buffer.size_bytes());
    }
}
