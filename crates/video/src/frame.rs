use {
    crate::VideoError,
    base::{Tensor, Vec2},
    std::fmt,
};

/// Release hook attached to a frame by whoever produced it.
///
/// Runs exactly once, when the frame is dropped.
pub struct FrameLease(Box<dyn FnOnce() + Send>);

impl FrameLease {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self(Box::new(release))
    }
}

impl fmt::Debug for FrameLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FrameLease")
    }
}

/// One RGB8 camera frame in HWC layout.
///
/// The frame owns its pixel buffer. If the producer attached a
/// `FrameLease`, dropping the frame releases it, so a frame that is
/// skipped, processed, or abandoned mid-inference is released exactly once.
pub struct Frame {
    sequence: u64,
    size: Vec2<usize>,
    channels: usize,
    data: Vec<u8>,
    lease: Option<FrameLease>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("sequence", &self.sequence)
            .field("size", &self.size)
            .field("channels", &self.channels)
            .field("leased", &self.lease.is_some())
            .finish()
    }
}

impl Frame {
    /// Wrap an RGB8 buffer of `size.x * size.y * 3` bytes.
    pub fn rgb(size: Vec2<usize>, data: Vec<u8>) -> Result<Self, VideoError> {
        let expected = size.area() * 3;
        if data.len() != expected {
            return Err(VideoError::Format(format!(
                "expected {} bytes for {}x{} RGB8, got {}",
                expected,
                size.x,
                size.y,
                data.len()
            )));
        }
        Ok(Self {
            sequence: 0,
            size,
            channels: 3,
            data,
            lease: None,
        })
    }

    /// Wrap an HWC `Tensor<u8>` with 3 channels.
    pub fn from_tensor(tensor: Tensor<u8>) -> Result<Self, VideoError> {
        match tensor.shape[..] {
            [height, width, 3] => Self::rgb(Vec2::new(width, height), tensor.data),
            _ => Err(VideoError::Format(format!(
                "expected [height, width, 3] tensor, got {:?}",
                tensor.shape
            ))),
        }
    }

    /// Decode an encoded image (JPEG, PNG, BMP, WebP) into an RGB8 frame.
    pub fn decode(bytes: &[u8]) -> Result<Self, VideoError> {
        let rgb = crates_image::load_from_memory(bytes)?.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::rgb(Vec2::new(width as usize, height as usize), rgb.into_raw())
    }

    /// Attach the producer's release hook.
    pub fn with_lease(mut self, lease: FrameLease) -> Self {
        self.lease = Some(lease);
        self
    }

    pub(crate) fn set_sequence(&mut self, sequence: u64) {
        self.sequence = sequence;
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn size(&self) -> Vec2<usize> {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.x
    }

    pub fn height(&self) -> usize {
        self.size.y
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_leased(&self) -> bool {
        self.lease.is_some()
    }
}

impl Drop for Frame {
    fn drop(&mut self) {
        if let Some(FrameLease(release)) = self.lease.take() {
            release();
        }
    }
}
