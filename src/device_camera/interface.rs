use crate::media::raster::Raster;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceCameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("camera handle {0:?} is not open")]
    NotOpen(CameraHandle),
    #[error("frame capture failed: {0}")]
    CaptureFailed(String),
}

/// Platform camera access. Implementations own the device; callers only see
/// handles and frames.
pub trait DeviceCamera: Send + Sync {
    fn open_device(&self) -> Result<CameraHandle, DeviceCameraError>;
    fn capture_frame(&self, handle: &CameraHandle) -> Result<Raster, DeviceCameraError>;
    fn close_device(&self, handle: CameraHandle) -> Result<(), DeviceCameraError>;
}
