use {
    crates_image::ImageEncoder,
    video::{Frame, VideoError},
};

#[test]
fn test_decode_png_to_rgb_frame() {
    let img = crates_image::RgbImage::from_fn(16, 8, |x, y| {
        crates_image::Rgb([x as u8, y as u8, 200])
    });
    let mut png = Vec::new();
    crates_image::codecs::png::PngEncoder::new(&mut png)
        .write_image(img.as_raw(), 16, 8, crates_image::ExtendedColorType::Rgb8)
        .unwrap();

    let frame = Frame::decode(&png).unwrap();
    assert_eq!(frame.width(), 16);
    assert_eq!(frame.height(), 8);
    assert_eq!(frame.channels(), 3);
    // pixel (3, 5) survives a lossless round trip
    let offset = (5 * 16 + 3) * 3;
    assert_eq!(&frame.data()[offset..offset + 3], &[3, 5, 200]);
}

#[test]
fn test_decode_grayscale_jpeg_expands_to_rgb() {
    let img = crates_image::GrayImage::from_fn(8, 8, |x, y| crates_image::Luma([((x + y) * 8) as u8]));
    let mut jpeg = Vec::new();
    crates_image::codecs::jpeg::JpegEncoder::new(&mut jpeg)
        .encode_image(&img)
        .unwrap();

    let frame = Frame::decode(&jpeg).unwrap();
    assert_eq!(frame.channels(), 3);
    assert_eq!(frame.data().len(), 8 * 8 * 3);
}

#[test]
fn test_corrupt_bytes_produce_decode_error() {
    let result = Frame::decode(b"not an image at all");
    assert!(matches!(result, Err(VideoError::Decode(_))));
}
