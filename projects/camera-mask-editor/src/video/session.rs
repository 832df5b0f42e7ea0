use crate::error::MaskResult;
use crate::video::FrameSource;
use anyhow::Result;
use opencv::core::Mat;
use std::time::{Duration, Instant};

/// Owns the single open frame source and the polling timer that drives it.
///
/// Reconnecting stops the timer, releases the old source, opens the new one
/// and only then restarts the timer. Dropping the session releases whatever
/// is still open.
pub struct Session {
    source: Option<Box<dyn FrameSource>>,
    poll_interval: Duration,
    next_poll: Option<Instant>,
}

impl Session {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            source: None,
            poll_interval,
            next_poll: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    pub fn is_polling(&self) -> bool {
        self.next_poll.is_some()
    }

    /// Replaces the current source with the one produced by `open`. When
    /// `open` fails the session is left disconnected.
    pub fn reconnect<F>(&mut self, open: F) -> MaskResult<()>
    where
        F: FnOnce() -> MaskResult<Box<dyn FrameSource>>,
    {
        self.next_poll = None;
        self.release();

        let source = open()?;
        self.source = Some(source);
        self.next_poll = Some(Instant::now());
        Ok(())
    }

    pub fn release(&mut self) {
        self.next_poll = None;
        if self.source.take().is_some() {
            tracing::debug!("Session: source released");
        }
    }

    /// Reads a frame if the polling interval has elapsed at `now`. The end of
    /// the stream releases the source.
    pub fn poll(&mut self, now: Instant) -> Result<Option<Mat>> {
        let due = match self.next_poll {
            Some(at) => now >= at,
            None => false,
        };
        if !due {
            return Ok(None);
        }
        let Some(source) = self.source.as_mut() else {
            self.next_poll = None;
            return Ok(None);
        };

        self.next_poll = Some(now + self.poll_interval);
        match source.read_frame()? {
            Some(frame) => Ok(Some(frame)),
            None => {
                tracing::info!("Session: end of stream");
                self.release();
                Ok(None)
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release();
    }
}
