//! Microphone capture permission.

use crate::error::{MeterError, MeterResult};
use log::{debug, info, warn};

pub type PermissionCallback = Box<dyn FnOnce(bool) + Send + 'static>;

pub trait CapturePermission: Send + Sync {
    fn has_capture_permission(&self) -> bool;

    /// Asks for capture permission. The outcome is handed to `on_result`,
    /// possibly later and from another thread.
    fn request_capture_permission(&self, on_result: PermissionCallback);
}

/// Desktop hosts gate microphone access at the OS level rather than through
/// the application, so the decision here is fixed when the value is built.
#[derive(Clone, Debug)]
pub struct HostPermission {
    granted: bool,
}

impl HostPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl Default for HostPermission {
    fn default() -> Self {
        Self::new(true)
    }
}

impl CapturePermission for HostPermission {
    fn has_capture_permission(&self) -> bool {
        self.granted
    }

    fn request_capture_permission(&self, on_result: PermissionCallback) {
        on_result(self.granted);
    }
}

/// Runs `on_result` with `Ok(())` once capture permission is held, requesting
/// it first if needed, or with [`MeterError::PermissionDenied`] if refused.
/// A refusal is final for this call; nothing is retried.
pub fn ensure_capture_permission<F>(permission: &dyn CapturePermission, on_result: F)
where
    F: FnOnce(MeterResult<()>) + Send + 'static,
{
    if permission.has_capture_permission() {
        debug!("Capture permission already held");
        on_result(Ok(()));
        return;
    }

    info!("Requesting microphone permission...");
    permission.request_capture_permission(Box::new(move |granted| {
        if granted {
            info!("Microphone permission granted");
            on_result(Ok(()));
        } else {
            warn!("Microphone permission denied");
            on_result(Err(MeterError::PermissionDenied));
        }
    }));
}
