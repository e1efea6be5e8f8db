//! OS-Facing Edges of the Airpad Pipeline
//!
//! ## Overview
//!
//! Everything that touches the operating system lives in this crate:
//! the socket that sensor datagrams arrive on and the virtual keyboard
//! that gestures ultimately press. The pipeline stages in between are
//! pure and OS-free; they talk to these edges only through the two
//! traits defined here.
//!
//! ```text
//!  phone ──UDP──> [SampleSource] ──> pipeline ──> [ActionSink] ──> OS input
//! ```
//!
//! ## Choosing a Sink
//!
//! ### LogSink
//!
//! **When to use:**
//! - Dry runs while tuning a model or threshold
//! - Headless environments with no input subsystem
//!
//! Writes each action to the log instead of the OS. Costs nothing,
//! requires nothing, cannot fail.
//!
//! ### EnigoSink (feature `inject`)
//!
//! **When to use:**
//! - Actually playing: gestures become real key events
//!
//! Backed by the cross-platform `enigo` input library. Kept behind a
//! feature gate because it links against OS input libraries that are
//! absent on CI runners and headless boxes.
//!
//! ## Error Split
//!
//! [`SourceError`] distinguishes transport failures from bad payloads:
//! an [`SourceError::Io`] means the socket itself is broken and the
//! pipeline should come down, while a [`SourceError::Decode`] condemns a
//! single datagram and nothing else. Sink failures are never fatal on
//! their own; the actor stage decides when too many in a row mean the
//! session is unusable.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod keyboard;
pub mod udp;

#[cfg(feature = "inject")]
pub use keyboard::EnigoSink;
pub use keyboard::{Key, LogSink};
pub use udp::UdpSampleSource;

use airpad_core::SensorSample;
use thiserror::Error;

/// Failures while receiving sensor data.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The transport itself failed. Not recoverable by skipping input;
    /// the collector treats this as fatal.
    #[error("source transport failed: {0}")]
    Io(#[from] std::io::Error),

    /// One payload could not be turned into a sample. The payload is
    /// dropped and the source remains usable.
    #[error("undecodable payload: {reason}")]
    Decode {
        /// What was wrong with the payload.
        reason: String,
    },
}

/// Failures while delivering a key action.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The injection backend rejected the event.
    #[error("key injection failed: {0}")]
    Injection(String),
}

/// Blocking producer of decoded sensor samples.
pub trait SampleSource {
    /// Wait up to the source's idle interval for the next sample.
    ///
    /// Returns `Ok(None)` when the interval elapses with nothing to
    /// deliver; callers use that beat to check their stop flag. A
    /// [`SourceError::Decode`] consumes exactly one payload.
    fn recv_sample(&mut self) -> Result<Option<SensorSample>, SourceError>;
}

/// Consumer of key actions produced by recognized gestures.
pub trait ActionSink {
    /// Hold a key down.
    fn press(&mut self, key: Key) -> Result<(), SinkError>;

    /// Release a held key.
    fn release(&mut self, key: Key) -> Result<(), SinkError>;

    /// Press and immediately release.
    ///
    /// Backends with a native click primitive should override this; the
    /// default is a press followed by a release.
    fn tap(&mut self, key: Key) -> Result<(), SinkError> {
        self.press(key)?;
        self.release(key)
    }

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}
