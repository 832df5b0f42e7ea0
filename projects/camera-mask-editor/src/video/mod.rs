pub mod opencv_reader;
pub mod session;

use crate::config::CameraRecord;
use crate::error::MaskResult;
use anyhow::Result;
use opencv::core::Mat;

pub use opencv_reader::{load_image, OpencvSource};
pub use session::Session;

/// A stream of frames. `Ok(None)` marks the end of the stream.
pub trait FrameSource {
    fn read_frame(&mut self) -> Result<Option<Mat>>;
}

/// Opens the main stream of a camera record. Fails with `InvalidChannel`
/// before any network activity if the channel is not a positive integer.
pub fn connect_camera(record: &CameraRecord) -> MaskResult<Box<dyn FrameSource>> {
    let address = record.stream_address()?;
    let redacted = record.redacted_stream_address()?;
    Ok(Box::new(OpencvSource::connect(&address, &redacted)?))
}
