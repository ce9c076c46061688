use {
    crate::DEFAULT_CONFIDENCE_THRESHOLD,
    base::Vec2,
    std::time::Duration,
};

/// Memory layout of the model input tensor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `[1, height, width, 3]`, as exported for TF.js and TFLite.
    #[default]
    Nhwc,
    /// `[1, 3, height, width]`, as exported for ONNX.
    Nchw,
}

/// Configuration for a detection stream.
#[derive(Clone, Debug)]
pub struct DetectConfig {
    stride: usize,
    confidence_threshold: f32,
    input_size: Vec2<usize>,
    layout: TensorLayout,
    inference_timeout: Option<Duration>,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            stride: 2,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            input_size: Vec2::new(320, 320),
            layout: TensorLayout::Nhwc,
            inference_timeout: Some(Duration::from_secs(5)),
        }
    }
}

impl DetectConfig {
    /// Process one frame in every `stride`. Values below 1 are treated as 1.
    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride.max(1);
        self
    }

    /// Rows with confidence at or below this value are discarded.
    ///
    /// Clamped to `[0, 1]`; NaN keeps the current threshold.
    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        if threshold.is_nan() {
            log::warn!(
                "ignoring NaN confidence threshold, keeping {}",
                self.confidence_threshold
            );
        } else {
            self.confidence_threshold = threshold.clamp(0.0, 1.0);
        }
        self
    }

    /// Model input size in pixels (width, height).
    pub fn with_input_size(mut self, size: Vec2<usize>) -> Self {
        self.input_size = size;
        self
    }

    pub fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Abandon an inference that runs longer than this. `None` waits forever.
    pub fn with_inference_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.inference_timeout = timeout;
        self
    }

    // Getters
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    pub fn input_size(&self) -> Vec2<usize> {
        self.input_size
    }

    pub fn layout(&self) -> TensorLayout {
        self.layout
    }

    pub fn inference_timeout(&self) -> Option<Duration> {
        self.inference_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectConfig::default();
        assert_eq!(config.stride(), 2);
        assert_eq!(config.confidence_threshold(), 0.5);
        assert_eq!(config.input_size(), Vec2::new(320, 320));
        assert_eq!(config.inference_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_threshold_is_clamped() {
        let config = DetectConfig::default().with_confidence_threshold(1.7);
        assert_eq!(config.confidence_threshold(), 1.0);
        let config = config.with_confidence_threshold(-0.2);
        assert_eq!(config.confidence_threshold(), 0.0);
    }

    #[test]
    fn test_nan_threshold_is_ignored() {
        let config = DetectConfig::default()
            .with_confidence_threshold(0.3)
            .with_confidence_threshold(f32::NAN);
        assert_eq!(config.confidence_threshold(), 0.3);
    }

    #[test]
    fn test_zero_stride_becomes_one() {
        assert_eq!(DetectConfig::default().with_stride(0).stride(), 1);
    }
}
