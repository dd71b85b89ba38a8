use crate::error::PipelineError;
use crate::media::media_buffer::{MediaBuffer, MimeType};
use std::collections::HashSet;

pub const DEFAULT_MAX_SIZE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub max_size_bytes: usize,
    pub allowed_mime_types: HashSet<MimeType>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
            allowed_mime_types: [
                MimeType::Png,
                MimeType::Jpeg,
                MimeType::Gif,
                MimeType::Webp,
                MimeType::Bmp,
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// Passes the buffer through untouched when it fits the policy. Size is
/// checked before type.
pub fn validate(buffer: MediaBuffer, policy: &ValidationPolicy) -> Result<MediaBuffer, PipelineError> {
    if buffer.size_bytes() > policy.max_size_bytes {
        return Err(PipelineError::TooLarge {
            size_bytes: buffer.size_bytes(),
            max_size_bytes: policy.max_size_bytes,
        });
    }

    let mime_type = buffer.mime_type();
    if !mime_type.is_recognized() || !policy.allowed_mime_types.contains(mime_type) {
        let declared = match mime_type.as_str() {
            "" => "unknown".to_string(),
            declared => declared.to_string(),
        };
        return Err(PipelineError::UnsupportedType(declared));
    }

    Ok(buffer)
}
