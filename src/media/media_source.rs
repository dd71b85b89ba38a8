use crate::error::PipelineError;
use crate::media::media_buffer::{MediaBuffer, MimeType, SourceKind};
use crate::media::raster::{PixelLayout, Raster};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
use std::io::Cursor;
use std::path::Path;

pub const CAPTURE_FILE_NAME: &str = "captured_image.png";

/// A file as picked by the user: raw bytes plus whatever the picker declared.
#[derive(Debug, Clone, Default)]
pub struct FileInput {
    pub bytes: Vec<u8>,
    pub declared_type: Option<String>,
    pub file_name: Option<String>,
}

pub fn acquire_from_file(input: Option<FileInput>) -> Result<MediaBuffer, PipelineError> {
    let input = input.ok_or_else(|| PipelineError::NoInput("no file selected".to_string()))?;

    if input.bytes.is_empty() {
        return Err(PipelineError::NoInput("selected file is empty".to_string()));
    }

    let mime_type = match input.declared_type.as_deref() {
        Some(declared) if !declared.trim().is_empty() => MimeType::parse(declared),
        _ => sniff_mime_type(&input.bytes),
    };

    let file_name = input
        .file_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("upload.{}", mime_type.extension()));

    Ok(MediaBuffer::new(
        input.bytes,
        mime_type,
        SourceKind::Upload,
        file_name,
    ))
}

/// Reads a file from disk, declaring its type from the extension.
pub fn acquire_from_path(path: &Path) -> Result<MediaBuffer, PipelineError> {
    let bytes = std::fs::read(path)
        .map_err(|e| PipelineError::NoInput(format!("cannot read {}: {}", path.display(), e)))?;

    let declared_type = mime_guess::from_path(path)
        .first()
        .map(|mime| mime.essence_str().to_string());

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    acquire_from_file(Some(FileInput {
        bytes,
        declared_type,
        file_name,
    }))
}

pub fn acquire_from_capture(frame: Raster) -> Result<MediaBuffer, PipelineError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(PipelineError::EncodeFailure(format!(
            "frame has no pixels ({}x{})",
            frame.width, frame.height
        )));
    }

    if frame.pixels.len() != frame.expected_len() {
        return Err(PipelineError::EncodeFailure(format!(
            "frame is {}x{} {:?} but carries {} bytes, expected {}",
            frame.width,
            frame.height,
            frame.layout,
            frame.pixels.len(),
            frame.expected_len()
        )));
    }

    let image = raster_to_image(frame)?;

    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(|e| PipelineError::EncodeFailure(e.to_string()))?;

    Ok(MediaBuffer::new(
        encoded.into_inner(),
        MimeType::Png,
        SourceKind::Capture,
        CAPTURE_FILE_NAME,
    ))
}

fn raster_to_image(frame: Raster) -> Result<DynamicImage, PipelineError> {
    let (width, height) = (frame.width, frame.height);
    let image = match frame.layout {
        PixelLayout::Rgb8 => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, frame.pixels).map(DynamicImage::from)
        }
        PixelLayout::Rgba8 => ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, frame.pixels)
            .map(DynamicImage::from),
    };
    image.ok_or_else(|| PipelineError::EncodeFailure("pixel buffer too small".to_string()))
}

fn sniff_mime_type(bytes: &[u8]) -> MimeType {
    match image::guess_format(bytes) {
        Ok(format) => MimeType::from_image_format(format),
        Err(_) => MimeType::Unrecognized(String::new()),
    }
}
