use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> PreparedImage {
    PreparedImage::from_premul(w, h, px.repeat((w * h) as usize)).unwrap()
}

#[test]
fn composite_clips_at_frame_edges() {
    let mut frame = FrameRGBA::transparent(4, 4);
    frame.composite_over(&solid(3, 3, [255, 0, 0, 255]), -1, 2);
    assert_eq!(frame.pixel(0, 2), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(1, 3), [255, 0, 0, 255]);
    assert_eq!(frame.pixel(2, 2), [0, 0, 0, 0]);
    assert_eq!(frame.pixel(0, 1), [0, 0, 0, 0]);
}

#[test]
fn composite_fully_outside_is_noop() {
    let mut frame = FrameRGBA::transparent(2, 2);
    frame.composite_over(&solid(2, 2, [0, 255, 0, 255]), 5, 5);
    frame.composite_over(&solid(2, 2, [0, 255, 0, 255]), -2, 0);
    assert!(frame.data.iter().all(|&b| b == 0));
}

#[test]
fn half_transparent_source_blends() {
    let mut frame = FrameRGBA::transparent(1, 1);
    frame.composite_over(&solid(1, 1, [0, 0, 255, 255]), 0, 0);
    frame.composite_over(&solid(1, 1, [128, 0, 0, 128]), 0, 0);
    let px = frame.pixel(0, 0);
    assert_eq!(px[0], 128);
    assert_eq!(px[3], 255);
    assert!(px[2] > 120 && px[2] < 130);
}

#[test]
fn pixmap_conversion_checks_sizes() {
    assert!(pixmap_from_premul_bytes(&[0; 8], 2, 1).is_ok());
    assert!(pixmap_from_premul_bytes(&[0; 7], 2, 1).is_err());
    assert!(pixmap_dims(70_000, 1).is_err());
}

#[test]
fn snap_rounds_to_nearest() {
    assert_eq!(snap(1.49), 1);
    assert_eq!(snap(1.5), 2);
    assert_eq!(snap(-0.6), -1);
}

#[test]
fn straight_export_unpremultiplies() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![64, 0, 0, 128, 9, 9, 9, 0],
        premultiplied: true,
    };
    assert_eq!(frame.to_straight_rgba8(), vec![128, 0, 0, 128, 0, 0, 0, 0]);
}
