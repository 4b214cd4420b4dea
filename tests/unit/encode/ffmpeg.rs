use super::*;

#[test]
fn transparent_pixels_become_background() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[0, 0, 0, 0], [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn opaque_pixels_pass_through() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[1, 2, 3, 255], [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![1, 2, 3, 255]);
}

#[test]
fn half_alpha_mixes_with_background() {
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &[128, 0, 0, 128], [0, 0, 254, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 127, 255]);
}

#[test]
fn mismatched_buffers_are_rejected() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_premul_over_bg(&mut dst, &[0; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn odd_sizes_are_rejected_before_spawning() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(
        std::env::temp_dir().join("posereel_odd.mp4"),
    ));
    let err = sink
        .begin(SinkConfig {
            width: 3,
            height: 2,
            fps: Fps::whole(30).unwrap(),
            audio: None,
        })
        .unwrap_err();
    assert!(matches!(err, PosereelError::Configuration(_)));
}

#[test]
fn pushing_before_begin_fails() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = FrameRGBA::transparent(2, 2);
    assert!(sink.push_frame(0, &frame).is_err());
}

#[test]
fn opts_deserialize_with_defaults() {
    let opts: FfmpegSinkOpts = serde_json::from_str(r#"{"out_path": "out/a.mp4"}"#).unwrap();
    assert!(opts.overwrite);
    assert_eq!(opts.bg_rgba, [0, 0, 0, 255]);
}
