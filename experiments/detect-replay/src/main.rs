use {
    anyhow::{Context, Result},
    base::Vec2,
    detect::{DetectConfig, DetectError, DetectionStream, Device, ModelSource, OnnxModel, TensorLayout},
    std::{env, path::PathBuf, time::Duration},
    video::{Frame, frame_channel},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn frame_paths(dir: &PathBuf) -> Result<Vec<PathBuf>> {
    let mut paths = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            matches!(
                path.extension().and_then(|ext| ext.to_str()),
                Some("jpg" | "jpeg" | "png" | "bmp" | "webp")
            )
        })
        .collect::<Vec<_>>();
    paths.sort();
    Ok(paths)
}

#[tokio::main]
async fn main() -> Result<()> {
    match env::var("DETECT_LOG_DIR") {
        Ok(dir) => base::init_file_logger(dir)?,
        Err(_) => base::init_stdout_logger(),
    }

    let model_path: PathBuf = env::var("DETECT_MODEL_PATH")
        .unwrap_or_else(|_| "models/detector.onnx".to_string())
        .into();
    let frames_dir: PathBuf = env::var("DETECT_FRAMES_DIR")
        .unwrap_or_else(|_| "frames".to_string())
        .into();
    let stride = env::var("DETECT_STRIDE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(2);

    let paths = match frame_paths(&frames_dir) {
        Ok(paths) if !paths.is_empty() => paths,
        Ok(_) => base::log_fatal!("no image files in {}", frames_dir.display()),
        Err(error) => base::log_fatal!("{:#}", error),
    };
    log::info!(
        "replaying {} frames from {} through {}",
        paths.len(),
        frames_dir.display(),
        model_path.display()
    );

    let config = DetectConfig::default()
        .with_stride(stride)
        .with_input_size(Vec2::new(640, 640))
        .with_layout(TensorLayout::Nchw);
    let loader = async move {
        tokio::task::spawn_blocking(move || {
            OnnxModel::load(ModelSource::File(model_path), Device::Cpu)
        })
        .await
        .map_err(DetectError::from)?
    };

    let (tx, rx) = frame_channel(4);
    let stream = DetectionStream::open(rx, loader, config);
    let mut detections = stream.detections();

    let feeder = tokio::spawn(async move {
        for path in paths {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    log::warn!("skipping {}: {}", path.display(), error);
                    continue;
                }
            };
            match Frame::decode(&bytes) {
                Ok(frame) => {
                    if !tx.try_send(frame) {
                        log::debug!("detector behind, dropped {}", path.display());
                    }
                }
                Err(error) => log::warn!("skipping {}: {}", path.display(), error),
            }
            tokio::time::sleep(FRAME_INTERVAL).await;
        }
    });

    while detections.changed().await.is_ok() {
        let latest = detections.borrow_and_update().inner.clone();
        for detection in &latest.boxes {
            log::info!(
                "frame {}: {} {:.2} at ({:.0}, {:.0}) {:.0}x{:.0}",
                latest.sequence,
                detection.label,
                detection.confidence,
                detection.bbox.origin.x,
                detection.bbox.origin.y,
                detection.bbox.size.x,
                detection.bbox.size.y
            );
        }
    }

    feeder.await.context("frame feeder panicked")?;
    let stats = stream.stats();
    log::info!(
        "done: {} frames, {} processed, {} published, {} failed, {} timed out",
        stats.frames,
        stats.processed,
        stats.published,
        stats.failures,
        stats.timeouts
    );
    stream.close().await.context("closing detection stream")?;
    Ok(())
}
