use crate::device_camera::interface::{CameraHandle, DeviceCamera, DeviceCameraError};
use crate::media::raster::Raster;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Produces solid-colour frames and keeps count of opened and closed handles.
pub struct DeviceCameraFake {
    width: u32,
    height: u32,
    color: [u8; 3],
    fail_open: bool,
    fail_capture: bool,
    next_handle: AtomicU64,
    open_handles: Mutex<HashSet<CameraHandle>>,
    open_count: AtomicUsize,
    close_count: AtomicUsize,
}

impl DeviceCameraFake {
    pub fn new(width: u32, height: u32, color: [u8; 3]) -> Self {
        Self {
            width,
            height,
            color,
            fail_open: false,
            fail_capture: false,
            next_handle: AtomicU64::new(1),
            open_handles: Mutex::new(HashSet::new()),
            open_count: AtomicUsize::new(0),
            close_count: AtomicUsize::new(0),
        }
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn failing_capture(mut self) -> Self {
        self.fail_capture = true;
        self
    }

    pub fn open_count(&self) -> usize {
        self.open_count.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }

    pub fn is_open(&self) -> bool {
        self.open_handles
            .lock()
            .map(|handles| !handles.is_empty())
            .unwrap_or(false)
    }

    fn handles(&self) -> Result<std::sync::MutexGuard<'_, HashSet<CameraHandle>>, DeviceCameraError> {
        self.open_handles
            .lock()
            .map_err(|e| DeviceCameraError::Unavailable(e.to_string()))
    }
}

impl DeviceCamera for DeviceCameraFake {
    fn open_device(&self) -> Result<CameraHandle, DeviceCameraError> {
        if self.fail_open {
            return Err(DeviceCameraError::Unavailable(
                "camera access is not supported".to_string(),
            ));
        }
        let handle = CameraHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.handles()?.insert(handle);
        self.open_count.fetch_add(1, Ordering::SeqCst);
        Ok(handle)
    }

    fn capture_frame(&self, handle: &CameraHandle) -> Result<Raster, DeviceCameraError> {
        if !self.handles()?.contains(handle) {
            return Err(DeviceCameraError::NotOpen(*handle));
        }
        if self.fail_capture {
            return Err(DeviceCameraError::CaptureFailed(
                "video element not ready".to_string(),
            ));
        }
        Ok(Raster::filled(self.width, self.height, self.color))
    }

    fn close_device(&self, handle: CameraHandle) -> Result<(), DeviceCameraError> {
        if !self.handles()?.remove(&handle) {
            return Err(DeviceCameraError::NotOpen(handle));
        }
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
