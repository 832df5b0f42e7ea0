use std::path::PathBuf;

/// Errors raised by the config codec, the config store and the video source.
///
/// Parse errors are scoped to a single config line; loaders turn them into
/// warnings and keep going.
#[derive(Debug, thiserror::Error)]
pub enum MaskError {
    #[error("Invalid camera record: {reason}")]
    ConfigParse { reason: String },

    #[error("Invalid polygon point: {token:?}")]
    PolygonParse { token: String },

    #[error("Invalid channel {channel:?}: expected a positive integer")]
    InvalidChannel { channel: String },

    #[error("Failed to connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    #[error("I/O error on {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Not found: {}", .path.display())]
    NotFound { path: PathBuf },
}

impl MaskError {
    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MaskError::FileIo {
            path: path.into(),
            source,
        }
    }
}

pub type MaskResult<T> = std::result::Result<T, MaskError>;
