// Camera records and the flat config file they live in

pub mod codec;
pub mod store;

use crate::error::{MaskError, MaskResult};
use crate::mask::{Polygon, Resolution};
use serde::Serialize;

pub use codec::{parse_line, serialize_record};
pub use store::{load_cameras, parse_config, save_cameras, LineWarning, LoadedConfig};

/// RTSP port used by the camera firmware.
pub const RTSP_PORT: u16 = 554;

/// One camera line of the config file.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct CameraRecord {
    pub ip: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    /// Kept verbatim; only validated when a stream address is derived.
    pub channel: String,
    pub resolution: Resolution,
    /// Mask polygons in the coordinates of `resolution`.
    pub polygons: Vec<Polygon>,
}

impl CameraRecord {
    pub fn new(ip: &str, username: &str, password: &str, channel: &str) -> Self {
        Self {
            ip: ip.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            channel: channel.to_string(),
            resolution: Resolution::default(),
            polygons: Vec::new(),
        }
    }

    /// 1-based channel number.
    pub fn channel_number(&self) -> MaskResult<u32> {
        match self.channel.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(MaskError::InvalidChannel {
                channel: self.channel.clone(),
            }),
        }
    }

    /// Main-stream RTSP address: channel N maps to stream `(N-1)*100+1`
    /// (1, 101, 201, ...).
    pub fn stream_address(&self) -> MaskResult<String> {
        self.stream_address_with(&self.password)
    }

    /// Same address with the password masked, for logs and the terminal.
    pub fn redacted_stream_address(&self) -> MaskResult<String> {
        self.stream_address_with("***")
    }

    fn stream_address_with(&self, password: &str) -> MaskResult<String> {
        let channel = self.channel_number()? as u64;
        let stream = (channel - 1) * 100 + 1;
        Ok(format!(
            "rtsp://{}:{}@{}:{}//Streaming/Channels/{}",
            self.username, password, self.ip, RTSP_PORT, stream
        ))
    }

    /// Short label used in listings and the editor HUD.
    pub fn label(&self) -> String {
        format!("{} (Ch{})", self.ip, self.channel)
    }
}
