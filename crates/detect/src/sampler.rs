/// Why a frame was not forwarded to the model.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Not the Nth frame.
    Stride,
    /// The model has not finished loading.
    ModelNotLoaded,
    /// A previous inference is still running.
    Busy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Process,
    Skip(SkipReason),
}

impl Decision {
    pub fn is_process(&self) -> bool {
        matches!(self, Decision::Process)
    }
}

/// Decides, once per delivered frame, whether that frame goes to the model.
///
/// The counter advances on every call. A frame is eligible when the
/// advanced counter is a multiple of the stride, so `L` frames yield
/// exactly `L / stride` eligible ones.
#[derive(Clone, Debug)]
pub struct FrameSampler {
    counter: u64,
    stride: u64,
}

impl FrameSampler {
    pub fn new(stride: usize) -> Self {
        Self {
            counter: 0,
            stride: stride.max(1) as u64,
        }
    }

    pub fn on_frame(&mut self, model_ready: bool, busy: bool) -> Decision {
        self.counter += 1;
        if self.counter % self.stride != 0 {
            Decision::Skip(SkipReason::Stride)
        } else if !model_ready {
            Decision::Skip(SkipReason::ModelNotLoaded)
        } else if busy {
            Decision::Skip(SkipReason::Busy)
        } else {
            Decision::Process
        }
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn stride(&self) -> u64 {
        self.stride
    }

    pub fn reset(&mut self) {
        self.counter = 0;
    }
}
