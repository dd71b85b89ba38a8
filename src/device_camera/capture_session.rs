use crate::device_camera::interface::{CameraHandle, DeviceCamera, DeviceCameraError};
use crate::library::logger::interface::Logger;
use crate::media::raster::Raster;
use std::sync::Arc;

/// An open camera device. The handle is closed when the session is dropped,
/// whichever way the caller leaves the scope.
pub struct CaptureSession<'a> {
    camera: &'a dyn DeviceCamera,
    handle: Option<CameraHandle>,
    logger: Arc<dyn Logger + Send + Sync>,
}

impl<'a> CaptureSession<'a> {
    pub fn open(
        camera: &'a dyn DeviceCamera,
        logger: Arc<dyn Logger + Send + Sync>,
    ) -> Result<Self, DeviceCameraError> {
        let logger = logger.with_namespace("capture_session");
        let handle = camera.open_device()?;
        let _ = logger.info(&format!("Opened camera {:?}", handle));
        Ok(Self {
            camera,
            handle: Some(handle),
            logger,
        })
    }

    pub fn capture_frame(&self) -> Result<Raster, DeviceCameraError> {
        match &self.handle {
            Some(handle) => self.camera.capture_frame(handle),
            None => Err(DeviceCameraError::Unavailable("session closed".to_string())),
        }
    }

    pub fn close(mut self) -> Result<(), DeviceCameraError> {
        match self.handle.take() {
            Some(handle) => self.release(handle),
            None => Ok(()),
        }
    }

    fn release(&self, handle: CameraHandle) -> Result<(), DeviceCameraError> {
        self.camera.close_device(handle)?;
        let _ = self.logger.info(&format!("Closed camera {:?}", handle));
        Ok(())
    }
}

impl Drop for CaptureSession<'_> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.release(handle) {
                let _ = self
                    .logger
                    .error(&format!("Failed to close camera {:?}: {}", handle, e));
            }
        }
    }
}

/// Opens the camera, grabs one frame and releases the device.
pub fn capture_once(
    camera: &dyn DeviceCamera,
    logger: Arc<dyn Logger + Send + Sync>,
) -> Result<Raster, DeviceCameraError> {
    let session = CaptureSession::open(camera, logger)?;
    let frame = session.capture_frame()?;
    session.close()?;
    Ok(frame)
}
