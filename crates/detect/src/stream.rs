use {
    crate::{
        Decision, DetectConfig, DetectError, DetectionBox, FrameSampler, Model, SkipReason,
        preprocess::preprocess_pixels, try_decode,
    },
    base::{Epoch, Stamped, Tensor},
    futures_util::StreamExt,
    std::{future::Future, pin::Pin, sync::Arc},
    tokio::{
        sync::{Mutex, oneshot, watch},
        task::JoinHandle,
    },
    video::{Frame, FrameSource},
};

/// Lifecycle of a detection stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// Opened, loop not started yet.
    Idle,
    /// Waiting for the model loader.
    Loading,
    /// Model loaded, no frame forwarded yet.
    Ready,
    /// At least one frame has gone to the model.
    Streaming,
    /// Closed, dropped, or the frame source ended.
    Stopped,
}

/// Boxes decoded from one frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detections {
    /// Sequence number of the frame the boxes came from (0 before the first result).
    pub sequence: u64,
    pub boxes: Vec<DetectionBox>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DetectionStats {
    /// Frames delivered by the source.
    pub frames: u64,
    /// Frames forwarded to the model.
    pub processed: u64,
    pub skipped_stride: u64,
    pub skipped_not_loaded: u64,
    pub skipped_busy: u64,
    /// Inferences that returned an error.
    pub failures: u64,
    pub timeouts: u64,
    /// Outputs that did not match the `[N, 6]` row schema.
    pub malformed: u64,
    /// Detection sets handed to the consumer.
    pub published: u64,
    pub source_errors: u64,
}

type Loader<M> = Pin<Box<dyn Future<Output = Result<M, DetectError>> + Send>>;
type Inflight = Pin<Box<dyn Future<Output = Outcome> + Send>>;

struct Outcome {
    sequence: u64,
    epoch: u64,
    result: Result<Tensor<f32>, DetectError>,
}

// Poll the future in `slot`, or never resolve if there is none.
async fn poll_slot<F: Future + Unpin>(slot: &mut Option<F>) -> F::Output {
    match slot.as_mut() {
        Some(future) => future.await,
        None => std::future::pending().await,
    }
}

async fn run_model<M: Model>(
    frame: Frame,
    model: Arc<Mutex<M>>,
    config: &DetectConfig,
) -> Result<Tensor<f32>, DetectError> {
    let (input_size, layout) = (config.input_size(), config.layout());
    // the blocking job works on a copy; the frame stays owned by this future
    let (size, channels, pixels) = (frame.size(), frame.channels(), frame.data().to_vec());
    let input = tokio::task::spawn_blocking(move || {
        preprocess_pixels(size, channels, &pixels, input_size, layout)
    })
    .await??;

    let mut model = model.lock_owned().await;
    let output = match config.inference_timeout() {
        Some(limit) => tokio::time::timeout(limit, model.execute(input))
            .await
            .map_err(|_| DetectError::Timeout(limit))?,
        None => model.execute(input).await,
    };

    // the frame stays alive until its inference is done
    drop(frame);
    output
}

async fn infer<M: Model>(
    frame: Frame,
    model: Arc<Mutex<M>>,
    config: DetectConfig,
    epoch: u64,
) -> Outcome {
    let sequence = frame.sequence();
    let result = run_model(frame, model, &config).await;
    Outcome {
        sequence,
        epoch,
        result,
    }
}

/// State owned by the loop task.
struct Runner<S, M> {
    source: S,
    config: DetectConfig,
    sampler: FrameSampler,
    model: Option<Arc<Mutex<M>>>,
    epoch: Epoch,
    state: watch::Sender<StreamState>,
    detections: watch::Sender<Stamped<Detections>>,
    stats: watch::Sender<DetectionStats>,
}

impl<S: FrameSource, M: Model> Runner<S, M> {
    fn set_state(&self, state: StreamState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            log::info!("detection stream: {:?} -> {:?}", previous, state);
        }
    }

    fn on_loaded(&mut self, loaded: Result<M, DetectError>) {
        match loaded {
            Ok(model) => {
                self.model = Some(Arc::new(Mutex::new(model)));
                self.set_state(StreamState::Ready);
            }
            Err(error) => {
                // frames keep being skipped as not loaded until the stream is closed
                log::error!("detection stream: model failed to load: {}", error);
            }
        }
    }

    fn on_frame(&mut self, frame: Frame, busy: bool) -> Option<Inflight> {
        let decision = self.sampler.on_frame(self.model.is_some(), busy);
        self.stats.send_modify(|stats| {
            stats.frames += 1;
            match decision {
                Decision::Process => stats.processed += 1,
                Decision::Skip(SkipReason::Stride) => stats.skipped_stride += 1,
                Decision::Skip(SkipReason::ModelNotLoaded) => stats.skipped_not_loaded += 1,
                Decision::Skip(SkipReason::Busy) => stats.skipped_busy += 1,
            }
        });

        if let Decision::Skip(reason) = decision {
            log::trace!("skipping frame {} ({:?})", frame.sequence(), reason);
            return None;
        }

        let model = Arc::clone(self.model.as_ref()?);
        if *self.state.borrow() == StreamState::Ready {
            self.set_state(StreamState::Streaming);
        }
        log::debug!("forwarding frame {} to the model", frame.sequence());
        Some(Box::pin(infer(
            frame,
            model,
            self.config.clone(),
            self.epoch.current(),
        )))
    }

    fn on_outcome(&mut self, outcome: Outcome) {
        if !self.epoch.is_current(outcome.epoch) {
            log::debug!("dropping stale result for frame {}", outcome.sequence);
            return;
        }
        match outcome.result {
            Ok(raw) => {
                let boxes = match try_decode(&raw, self.config.confidence_threshold()) {
                    Ok(boxes) => boxes,
                    Err(error) => {
                        log::warn!(
                            "frame {}: discarding malformed model output: {}",
                            outcome.sequence,
                            error
                        );
                        self.stats.send_modify(|stats| stats.malformed += 1);
                        Vec::new()
                    }
                };
                log::debug!("frame {}: {} detections", outcome.sequence, boxes.len());
                self.detections.send_replace(self.epoch.stamp(Detections {
                    sequence: outcome.sequence,
                    boxes,
                }));
                self.stats.send_modify(|stats| stats.published += 1);
            }
            Err(DetectError::Timeout(after)) => {
                log::warn!(
                    "frame {}: inference abandoned after {} ms",
                    outcome.sequence,
                    after.as_millis()
                );
                self.stats.send_modify(|stats| stats.timeouts += 1);
            }
            Err(error) => {
                log::error!("frame {}: inference failed: {}", outcome.sequence, error);
                self.stats.send_modify(|stats| stats.failures += 1);
            }
        }
    }

    async fn run(
        mut self,
        loader: Loader<M>,
        mut cancel: oneshot::Receiver<()>,
    ) -> Option<Arc<Mutex<M>>> {
        let mut loader = Some(loader);
        let mut inflight: Option<Inflight> = None;
        let mut source_done = false;

        self.set_state(StreamState::Loading);
        loop {
            tokio::select! {
                biased;
                _ = &mut cancel => break,
                loaded = poll_slot(&mut loader) => {
                    loader = None;
                    self.on_loaded(loaded);
                }
                outcome = poll_slot(&mut inflight) => {
                    inflight = None;
                    self.on_outcome(outcome);
                }
                next = self.source.next(), if !source_done => match next {
                    Some(Ok(frame)) => {
                        if let Some(job) = self.on_frame(frame, inflight.is_some()) {
                            inflight = Some(job);
                        }
                    }
                    Some(Err(error)) => {
                        log::warn!("detection stream: frame source error: {}", error);
                        self.stats.send_modify(|stats| stats.source_errors += 1);
                    }
                    None => {
                        log::info!("detection stream: frame source ended");
                        source_done = true;
                    }
                },
            }
            if source_done && inflight.is_none() {
                break;
            }
        }

        // drops any in-flight inference together with its frame
        drop(inflight);
        self.set_state(StreamState::Stopped);
        self.model
    }
}

/// Handle to a running detection loop.
///
/// `open` spawns one tokio task that owns the frame source, the sampler,
/// the model and the in-flight inference; the handle only observes it
/// through watch channels. Dropping the handle stops the loop.
pub struct DetectionStream<M: Model> {
    cancel: Option<oneshot::Sender<()>>,
    join_handle: Option<JoinHandle<Option<Arc<Mutex<M>>>>>,
    epoch: Epoch,
    state: watch::Receiver<StreamState>,
    detections: watch::Receiver<Stamped<Detections>>,
    stats: watch::Receiver<DetectionStats>,
}

impl<M: Model> DetectionStream<M> {
    /// Start the loop. The model becomes available when `loader` resolves;
    /// frames arriving before that are counted and skipped.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open<S, L>(source: S, loader: L, config: DetectConfig) -> Self
    where
        S: FrameSource,
        L: Future<Output = Result<M, DetectError>> + Send + 'static,
    {
        let epoch = Epoch::new();
        let (state_tx, state_rx) = watch::channel(StreamState::Idle);
        let (detections_tx, detections_rx) = watch::channel(epoch.stamp(Detections::default()));
        let (stats_tx, stats_rx) = watch::channel(DetectionStats::default());
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let runner = Runner {
            source,
            sampler: FrameSampler::new(config.stride()),
            config,
            model: None,
            epoch: epoch.clone(),
            state: state_tx,
            detections: detections_tx,
            stats: stats_tx,
        };
        let join_handle = tokio::task::spawn(runner.run(Box::pin(loader), cancel_rx));

        Self {
            cancel: Some(cancel_tx),
            join_handle: Some(join_handle),
            epoch,
            state: state_rx,
            detections: detections_rx,
            stats: stats_rx,
        }
    }

    /// Start the loop with a model that is already loaded.
    pub fn open_with_model<S: FrameSource>(source: S, model: M, config: DetectConfig) -> Self {
        Self::open(source, std::future::ready(Ok(model)), config)
    }

    pub fn state(&self) -> StreamState {
        *self.state.borrow()
    }

    pub fn state_changes(&self) -> watch::Receiver<StreamState> {
        self.state.clone()
    }

    /// Receiver for the latest detections; each new set replaces the previous one.
    pub fn detections(&self) -> watch::Receiver<Stamped<Detections>> {
        self.detections.clone()
    }

    pub fn latest(&self) -> Detections {
        self.detections.borrow().inner.clone()
    }

    pub fn stats(&self) -> DetectionStats {
        *self.stats.borrow()
    }

    pub fn stats_changes(&self) -> watch::Receiver<DetectionStats> {
        self.stats.clone()
    }

    pub fn epoch(&self) -> &Epoch {
        &self.epoch
    }

    /// Stop the loop and wait for it to finish.
    ///
    /// Any in-flight inference is abandoned and its result never published.
    /// Returns the model if it had been loaded, so it can be handed to the
    /// next `open_with_model`.
    pub async fn close(mut self) -> Result<Option<M>, DetectError> {
        self.epoch.advance();
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        let Some(join_handle) = self.join_handle.take() else {
            return Ok(None);
        };
        let model = join_handle.await?;
        Ok(model
            .and_then(|model| Arc::try_unwrap(model).ok())
            .map(Mutex::into_inner))
    }
}

impl<M: Model> Drop for DetectionStream<M> {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            self.epoch.advance();
            let _ = cancel.send(());
        }
    }
}
