//! Frame sampling and detection decoding.
//!
//! `DetectionStream` pulls frames from a `video::FrameSource`, forwards
//! every Nth one (see `FrameSampler`) through `preprocess` into a `Model`,
//! decodes the raw `[N, 6]` output with `decode` and publishes the latest
//! boxes on a watch channel.

pub mod config;
pub mod decode;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod sampler;
pub mod stream;

#[cfg(feature = "onnx")]
pub mod onnx;

pub use config::{DetectConfig, TensorLayout};
pub use decode::{
    CandidateRow, DEFAULT_CONFIDENCE_THRESHOLD, DetectionBox, ROW_WIDTH, decode, try_decode,
};
pub use error::DetectError;
pub use model::Model;
pub use preprocess::preprocess;
pub use sampler::{Decision, FrameSampler, SkipReason};
pub use stream::{DetectionStats, DetectionStream, Detections, StreamState};

#[cfg(feature = "onnx")]
pub use onnx::{Device, ModelSource, OnnxModel};
