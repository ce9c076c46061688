//! Frame plumbing between a camera and the detection pipeline.
//!
//! The crate does not talk to camera hardware. It defines the `Frame` a
//! camera hands over (with its release hook), the error type, and a
//! channel that turns push-style camera callbacks into an async `Stream`.

pub mod channel;
pub mod error;
pub mod frame;

pub use channel::{FrameReceiver, FrameSender, frame_channel};
pub use error::VideoError;
pub use frame::{Frame, FrameLease};

use futures_core::Stream;

/// Anything the detection loop can pull frames from.
pub trait FrameSource: Stream<Item = Result<Frame, VideoError>> + Send + Unpin + 'static {}

impl<S> FrameSource for S where S: Stream<Item = Result<Frame, VideoError>> + Send + Unpin + 'static {}
