use super::FrameSource;
use crate::error::{MaskError, MaskResult};
use anyhow::Result;
use opencv::{
    core::Mat,
    imgcodecs,
    prelude::*,
    videoio::{VideoCapture, CAP_ANY},
};
use std::path::Path;

pub struct OpencvSource {
    capture: VideoCapture,
    label: String,
}

impl OpencvSource {
    /// Opens a network stream or video file. `label` is what gets logged and
    /// reported in place of `address`, which may carry credentials.
    pub fn connect(address: &str, label: &str) -> MaskResult<Self> {
        let connection_error = |reason: String| MaskError::Connection {
            address: label.to_string(),
            reason,
        };

        tracing::info!("OpencvSource: connecting to {}", label);
        let capture =
            VideoCapture::from_file(address, CAP_ANY).map_err(|e| connection_error(e.to_string()))?;
        if !capture.is_opened().map_err(|e| connection_error(e.to_string()))? {
            return Err(connection_error("stream could not be opened".to_string()));
        }

        tracing::info!("OpencvSource: opened {}", label);
        Ok(Self {
            capture,
            label: label.to_string(),
        })
    }
}

impl FrameSource for OpencvSource {
    fn read_frame(&mut self) -> Result<Option<Mat>> {
        let mut frame = Mat::default();
        let success = self.capture.read(&mut frame)?;
        if !success || frame.empty() {
            tracing::debug!("OpencvSource: no frame from {}", self.label);
            return Ok(None);
        }
        Ok(Some(frame))
    }
}

impl Drop for OpencvSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            tracing::warn!("OpencvSource: failed to release {}: {}", self.label, e);
        } else {
            tracing::info!("OpencvSource: released {}", self.label);
        }
    }
}

/// Reads a still image as a BGR frame.
pub fn load_image(path: &Path) -> MaskResult<Mat> {
    let not_found = || MaskError::NotFound {
        path: path.to_path_buf(),
    };
    let frame = imgcodecs::imread(&path.to_string_lossy(), imgcodecs::IMREAD_COLOR)
        .map_err(|_| not_found())?;
    if frame.empty() {
        return Err(not_found());
    }
    Ok(frame)
}
