use std::io::Cursor;

use super::*;

fn png_bytes(img: &image::RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

#[test]
fn decode_png_premultiplies() {
    let img = image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 255, 255, 128]));
    let prepared = decode_image(&png_bytes(&img)).unwrap();
    assert_eq!(prepared.width, 2);
    assert_eq!(prepared.height, 1);
    assert_eq!(prepared.pixel(0, 0), [128, 128, 128, 128]);
}

#[test]
fn decode_garbage_fails() {
    assert!(decode_image(b"not an image").is_err());
}

#[test]
fn resize_solid_color_stays_solid() {
    let src = PreparedImage::from_premul(2, 2, [0u8, 0, 255, 255].repeat(4)).unwrap();
    let out = resize_premul(&src, 5, 3).unwrap();
    assert_eq!((out.width, out.height), (5, 3));
    assert_eq!(out.pixel(4, 2), [0, 0, 255, 255]);
}

#[test]
fn from_premul_checks_length() {
    assert!(PreparedImage::from_premul(2, 2, vec![0; 15]).is_err());
}

#[test]
fn out_of_bounds_pixel_is_transparent() {
    let img = PreparedImage::transparent(1, 1);
    assert_eq!(img.pixel(5, 5), [0, 0, 0, 0]);
}
