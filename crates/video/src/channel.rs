use {
    crate::{Frame, VideoError},
    futures_core::Stream,
    std::{
        pin::Pin,
        sync::{
            Arc,
            atomic::{AtomicU64, Ordering},
        },
        task::{Context, Poll},
    },
    tokio::sync::mpsc,
};

type FrameResult = Result<Frame, VideoError>;

/// Create a bounded frame channel.
///
/// The `FrameSender` side is meant for the camera's "frame ready"
/// callback; the `FrameReceiver` side is the pull-style `Stream` the
/// detection loop consumes. Frames are numbered in the order they are
/// accepted, starting at 1.
pub fn frame_channel(capacity: usize) -> (FrameSender, FrameReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        FrameSender {
            tx,
            sequence: Arc::new(AtomicU64::new(0)),
        },
        FrameReceiver { rx },
    )
}

#[derive(Clone, Debug)]
pub struct FrameSender {
    tx: mpsc::Sender<FrameResult>,
    sequence: Arc<AtomicU64>,
}

impl FrameSender {
    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Offer a frame without waiting.
    ///
    /// Returns `false` if the channel is full or closed; the frame is then
    /// dropped here, which releases its lease. Safe to call from non-async
    /// camera callbacks.
    pub fn try_send(&self, mut frame: Frame) -> bool {
        let permit = match self.tx.try_reserve() {
            Ok(permit) => permit,
            Err(mpsc::error::TrySendError::Full(())) => {
                log::debug!("frame channel full, dropping frame");
                return false;
            }
            Err(mpsc::error::TrySendError::Closed(())) => return false,
        };
        frame.set_sequence(self.next_sequence());
        permit.send(Ok(frame));
        true
    }

    /// Send a frame, waiting for room in the channel.
    pub async fn send(&self, mut frame: Frame) -> Result<(), VideoError> {
        let permit = self
            .tx
            .reserve()
            .await
            .map_err(|_| VideoError::Channel("frame receiver closed".to_string()))?;
        frame.set_sequence(self.next_sequence());
        permit.send(Ok(frame));
        Ok(())
    }

    /// Report a capture failure to the consumer.
    pub async fn send_error(&self, error: VideoError) -> Result<(), VideoError> {
        self.tx
            .send(Err(error))
            .await
            .map_err(|_| VideoError::Channel("frame receiver closed".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Pull side of `frame_channel`. Ends once every sender is dropped.
#[derive(Debug)]
pub struct FrameReceiver {
    rx: mpsc::Receiver<FrameResult>,
}

impl FrameReceiver {
    /// Wait for the next frame. `None` once all senders are gone.
    pub async fn next_frame(&mut self) -> Option<FrameResult> {
        self.rx.recv().await
    }

    /// Stop accepting frames; already queued frames can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for FrameReceiver {
    type Item = FrameResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
