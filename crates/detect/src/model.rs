use {
    crate::DetectError,
    base::Tensor,
    std::future::Future,
};

/// A loaded detection model.
///
/// `execute` takes `&mut self`, so a model instance never runs two
/// inferences at once. The returned tensor is the raw output, one row of
/// `[center_x, center_y, width, height, confidence, class]` per candidate.
pub trait Model: Send + 'static {
    fn execute(
        &mut self,
        input: Tensor<f32>,
    ) -> impl Future<Output = Result<Tensor<f32>, DetectError>> + Send;
}
