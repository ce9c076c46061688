use {
    crate::{DetectError, TensorLayout},
    base::{Tensor, Vec2},
    crates_image::{ImageBuffer, Rgb, imageops},
    video::Frame,
};

/// Turn an RGB8 frame into a model input tensor.
///
/// Resizes bilinearly to `input_size` (skipped when the frame already has
/// that size), scales values to `[0, 1]` and adds a batch dimension:
/// `[1, h, w, 3]` for `Nhwc`, `[1, 3, h, w]` for `Nchw`.
pub fn preprocess(
    frame: &Frame,
    input_size: Vec2<usize>,
    layout: TensorLayout,
) -> Result<Tensor<f32>, DetectError> {
    preprocess_pixels(
        frame.size(),
        frame.channels(),
        frame.data(),
        input_size,
        layout,
    )
}

/// Same as `preprocess`, on a bare HWC pixel buffer.
pub(crate) fn preprocess_pixels(
    size: Vec2<usize>,
    channels: usize,
    data: &[u8],
    input_size: Vec2<usize>,
    layout: TensorLayout,
) -> Result<Tensor<f32>, DetectError> {
    if channels != 3 {
        return Err(DetectError::Shape(format!(
            "expected 3 channels (RGB), got {}",
            channels
        )));
    }
    if size.x == 0 || size.y == 0 || input_size.x == 0 || input_size.y == 0 {
        return Err(DetectError::Shape(format!(
            "image dimensions must be non-zero, got {}x{} -> {}x{}",
            size.x, size.y, input_size.x, input_size.y
        )));
    }

    let resized;
    let pixels: &[u8] = if size == input_size {
        data
    } else {
        let source = ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(size.x as u32, size.y as u32, data)
            .ok_or_else(|| {
                DetectError::Shape(format!(
                    "frame buffer of {} bytes does not match {}x{}",
                    data.len(),
                    size.x,
                    size.y
                ))
            })?;
        resized = imageops::resize(
            &source,
            input_size.x as u32,
            input_size.y as u32,
            imageops::FilterType::Triangle,
        );
        resized.as_raw()
    };

    let (w, h) = (input_size.x, input_size.y);
    match layout {
        TensorLayout::Nhwc => {
            let data = pixels.iter().map(|&v| v as f32 / 255.0).collect();
            Ok(Tensor::new(vec![1, h, w, 3], data)?)
        }
        TensorLayout::Nchw => {
            let plane = w * h;
            let mut data = vec![0.0f32; plane * 3];
            for (i, pixel) in pixels.chunks_exact(3).enumerate() {
                data[i] = pixel[0] as f32 / 255.0;
                data[plane + i] = pixel[1] as f32 / 255.0;
                data[2 * plane + i] = pixel[2] as f32 / 255.0;
            }
            Ok(Tensor::new(vec![1, 3, h, w], data)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray_frame(width: usize, height: usize, value: u8) -> Frame {
        Frame::rgb(Vec2::new(width, height), vec![value; width * height * 3]).unwrap()
    }

    #[test]
    fn test_resize_and_normalize_nhwc() {
        let frame = gray_frame(640, 480, 255);
        let tensor = preprocess(&frame, Vec2::new(320, 320), TensorLayout::Nhwc).unwrap();
        assert_eq!(tensor.shape, vec![1, 320, 320, 3]);
        // bilinear filtering may round a uniform image by one step
        assert!(tensor.data.iter().all(|&v| (v - 1.0).abs() <= 1.0 / 255.0 + 1e-6));
    }

    #[test]
    fn test_values_stay_in_unit_range() {
        let data: Vec<u8> = (0..64 * 48 * 3).map(|i| (i % 256) as u8).collect();
        let frame = Frame::rgb(Vec2::new(64, 48), data).unwrap();
        let tensor = preprocess(&frame, Vec2::new(32, 32), TensorLayout::Nhwc).unwrap();
        assert!(tensor.data.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_same_size_skips_resize() {
        let mut data = vec![0u8; 2 * 2 * 3];
        data[0] = 51;
        let frame = Frame::rgb(Vec2::new(2, 2), data).unwrap();
        let tensor = preprocess(&frame, Vec2::new(2, 2), TensorLayout::Nhwc).unwrap();
        assert!((tensor.data[0] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_nchw_splits_planes() {
        // one red pixel, one blue pixel
        let frame = Frame::rgb(Vec2::new(2, 1), vec![255, 0, 0, 0, 0, 255]).unwrap();
        let tensor = preprocess(&frame, Vec2::new(2, 1), TensorLayout::Nchw).unwrap();
        assert_eq!(tensor.shape, vec![1, 3, 1, 2]);
        assert_eq!(tensor.data, vec![1.0, 0.0, 0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_rejects_zero_input_size() {
        let frame = gray_frame(4, 4, 0);
        let result = preprocess(&frame, Vec2::new(0, 320), TensorLayout::Nhwc);
        assert!(result.unwrap_err().to_string().contains("non-zero"));
    }

    #[test]
    fn test_short_buffer_is_rejected() {
        let result = preprocess_pixels(
            Vec2::new(8, 8),
            3,
            &[0u8; 10],
            Vec2::new(4, 4),
            TensorLayout::Nhwc,
        );
        assert!(matches!(result, Err(DetectError::Shape(_))));
    }
}
