use log::{debug, info};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("camera permission denied")]
    PermissionDenied,
    #[error("no video capture device available")]
    NoDevice,
    #[error("capture stream already open")]
    AlreadyOpen,
}

/// A video-only capture source held for the lifetime of a session.
pub trait CaptureDevice: Send {
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Stop every track. Must be idempotent.
    fn release(&mut self);

    fn is_open(&self) -> bool;
}

/// Stand-in webcam that always grants a single video track.
#[derive(Debug, Default)]
pub struct SimulatedCamera {
    active_tracks: usize,
    opened_count: u32,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tracks(&self) -> usize {
        self.active_tracks
    }

    pub fn opened_count(&self) -> u32 {
        self.opened_count
    }
}

impl CaptureDevice for SimulatedCamera {
    fn open(&mut self) -> Result<(), CaptureError> {
        if self.active_tracks > 0 {
            return Err(CaptureError::AlreadyOpen);
        }
        self.active_tracks = 1;
        self.opened_count += 1;
        info!("video capture opened (1 track)");
        Ok(())
    }

    fn release(&mut self) {
        if self.active_tracks > 0 {
            debug!("releasing {} video track(s)", self.active_tracks);
        }
        self.active_tracks = 0;
    }

    fn is_open(&self) -> bool {
        self.active_tracks > 0
    }
}

/// Device that always refuses, e.g. when the user denied camera access.
#[derive(Debug, Clone)]
pub struct UnavailableCamera {
    reason: CaptureError,
}

impl UnavailableCamera {
    pub fn new(reason: CaptureError) -> Self {
        Self { reason }
    }
}

impl CaptureDevice for UnavailableCamera {
    fn open(&mut self) -> Result<(), CaptureError> {
        Err(self.reason.clone())
    }

    fn release(&mut self) {}

    fn is_open(&self) -> bool {
        false
    }
}
