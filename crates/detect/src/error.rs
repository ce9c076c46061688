use std::{fmt, time::Duration};

#[derive(Debug)]
pub enum DetectError {
    /// Tensor or frame has the wrong rank, dimensions or contents.
    Shape(String),
    /// The model failed to run.
    Inference(String),
    /// The model did not answer within the configured timeout.
    Timeout(Duration),
    /// The model could not be loaded.
    Load(String),
    Video(video::VideoError),
    Runtime(String),
}

impl fmt::Display for DetectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectError::Shape(msg) => write!(f, "shape error: {msg}"),
            DetectError::Inference(msg) => write!(f, "inference error: {msg}"),
            DetectError::Timeout(after) => {
                write!(f, "inference timed out after {} ms", after.as_millis())
            }
            DetectError::Load(msg) => write!(f, "model load error: {msg}"),
            DetectError::Video(err) => write!(f, "video error: {err}"),
            DetectError::Runtime(msg) => write!(f, "runtime error: {msg}"),
        }
    }
}

impl std::error::Error for DetectError {}

impl From<base::TensorError> for DetectError {
    fn from(err: base::TensorError) -> Self {
        DetectError::Shape(err.to_string())
    }
}

impl From<video::VideoError> for DetectError {
    fn from(err: video::VideoError) -> Self {
        DetectError::Video(err)
    }
}

impl From<tokio::task::JoinError> for DetectError {
    fn from(err: tokio::task::JoinError) -> Self {
        DetectError::Runtime(format!("task failed: {err}"))
    }
}
