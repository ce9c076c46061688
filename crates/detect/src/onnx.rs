use {
    crate::{DetectError, Model},
    base::Tensor,
    ndarray::ArrayD,
    ort::{inputs, session::Session, value::TensorRef},
    std::{
        future::Future,
        path::PathBuf,
        sync::{Arc, Mutex},
    },
};

/// Where to load model weights from.
#[derive(Clone, Debug)]
pub enum ModelSource {
    File(PathBuf),
    Memory(Vec<u8>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Device {
    Cpu,
    Cuda { device_id: i32 },
}

/// ONNX Runtime detector with a single input and a single output.
pub struct OnnxModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String,
}

impl OnnxModel {
    /// Build a session for `source` on `device`.
    ///
    /// This blocks while the runtime parses and optimizes the graph; call it
    /// from `spawn_blocking` when used as a stream loader.
    pub fn load(source: ModelSource, device: Device) -> Result<Self, DetectError> {
        let mut builder = Session::builder()
            .map_err(|e| DetectError::Load(format!("failed to create session builder: {}", e)))?;

        builder = match device {
            Device::Cpu => {
                log::info!("onnx: using CPU execution provider");
                builder
            }
            #[cfg(feature = "cuda")]
            Device::Cuda { device_id } => {
                use ort::{ep::ExecutionProvider, execution_providers::CUDAExecutionProvider};
                let ep = CUDAExecutionProvider::default().with_device_id(device_id);
                let available = ep.is_available().unwrap_or(false);
                log::info!(
                    "onnx: CUDA requested (device_id={}), available: {}",
                    device_id,
                    available
                );
                builder
                    .with_execution_providers([ep.build()])
                    .map_err(|e| DetectError::Load(format!("CUDA unavailable: {}", e)))?
            }
            #[cfg(not(feature = "cuda"))]
            Device::Cuda { device_id } => {
                return Err(DetectError::Load(format!(
                    "CUDA device {} requested but the cuda feature is disabled",
                    device_id
                )));
            }
        };

        let session = match source {
            ModelSource::File(path) => builder.commit_from_file(&path).map_err(|e| {
                DetectError::Load(format!("failed to load {}: {}", path.display(), e))
            })?,
            ModelSource::Memory(bytes) => builder.commit_from_memory(&bytes).map_err(|e| {
                DetectError::Load(format!("failed to load model from memory: {}", e))
            })?,
        };

        let input_name = session
            .inputs()
            .first()
            .map(|input| input.name().to_string())
            .ok_or_else(|| DetectError::Load("model has no inputs".to_string()))?;
        let output_name = session
            .outputs()
            .first()
            .map(|output| output.name().to_string())
            .ok_or_else(|| DetectError::Load("model has no outputs".to_string()))?;
        log::info!("onnx: model loaded ({} -> {})", input_name, output_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }
}

fn run_session(
    session: &Mutex<Session>,
    input_name: &str,
    output_name: &str,
    input: Tensor<f32>,
) -> Result<Tensor<f32>, DetectError> {
    let array = ArrayD::from_shape_vec(input.shape, input.data)
        .map_err(|e| DetectError::Shape(format!("failed to create ndarray from tensor: {}", e)))?;
    let tensor_ref = TensorRef::from_array_view(array.view())
        .map_err(|e| DetectError::Inference(format!("failed to create tensor ref: {}", e)))?;

    let mut session = session
        .lock()
        .map_err(|_| DetectError::Runtime("onnx session lock poisoned".to_string()))?;
    let outputs = session
        .run(inputs![input_name => tensor_ref])
        .map_err(|e| DetectError::Inference(format!("inference failed: {}", e)))?;

    let array = outputs[output_name].try_extract_array::<f32>().map_err(|e| {
        DetectError::Inference(format!("output '{}' is not f32: {}", output_name, e))
    })?;
    let shape = array.shape().to_vec();
    let data = array.iter().copied().collect();
    Ok(Tensor::new(shape, data)?)
}

impl Model for OnnxModel {
    fn execute(
        &mut self,
        input: Tensor<f32>,
    ) -> impl Future<Output = Result<Tensor<f32>, DetectError>> + Send {
        let session = Arc::clone(&self.session);
        let input_name = self.input_name.clone();
        let output_name = self.output_name.clone();
        async move {
            tokio::task::spawn_blocking(move || {
                run_session(&session, &input_name, &output_name, input)
            })
            .await?
        }
    }
}
