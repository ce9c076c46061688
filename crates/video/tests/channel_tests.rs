use {
    base::Vec2,
    futures_util::StreamExt,
    std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    video::{Frame, FrameLease, FrameSource, VideoError, frame_channel},
};

fn leased_frame(released: &Arc<AtomicUsize>) -> Frame {
    let released = Arc::clone(released);
    Frame::rgb(Vec2::new(4, 2), vec![0u8; 24])
        .unwrap()
        .with_lease(FrameLease::new(move || {
            released.fetch_add(1, Ordering::SeqCst);
        }))
}

#[test]
fn test_frame_receiver_is_frame_source() {
    fn assert_source<S: FrameSource>() {}
    assert_source::<video::FrameReceiver>();
}

#[tokio::test]
async fn test_frames_are_numbered_in_order() {
    let (tx, mut rx) = frame_channel(4);
    for _ in 0..3 {
        assert!(tx.try_send(Frame::rgb(Vec2::new(1, 1), vec![0, 0, 0]).unwrap()));
    }
    drop(tx);

    let sequences: Vec<u64> = rx
        .by_ref()
        .map(|frame| frame.unwrap().sequence())
        .collect()
        .await;
    assert_eq!(sequences, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_full_channel_drops_and_releases() {
    let released = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = frame_channel(1);

    assert!(tx.try_send(leased_frame(&released)));
    assert!(!tx.try_send(leased_frame(&released)));
    // the rejected frame was released immediately
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let frame = rx.next_frame().await.unwrap().unwrap();
    assert_eq!(frame.sequence(), 1);
    drop(frame);
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_send_after_receiver_dropped() {
    let released = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = frame_channel(2);
    drop(rx);

    assert!(tx.is_closed());
    let result = tx.send(leased_frame(&released)).await;
    assert!(matches!(result, Err(VideoError::Channel(_))));
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_errors_pass_through() {
    let (tx, mut rx) = frame_channel(2);
    tx.send_error(VideoError::Device("sensor unplugged".to_string()))
        .await
        .unwrap();
    drop(tx);

    match rx.next().await {
        Some(Err(VideoError::Device(msg))) => assert!(msg.contains("unplugged")),
        other => panic!("expected device error, got {:?}", other),
    }
    assert!(rx.next().await.is_none());
}
