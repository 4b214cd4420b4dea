use super::*;

/// Monospace measurer: ten pixels per character.
fn mono(s: &str) -> f64 {
    s.chars().count() as f64 * 10.0
}

#[test]
fn greedy_wrap_fills_lines() {
    let lines = wrap_words("the quick brown fox jumps", 110.0, mono);
    assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
    for line in &lines {
        assert!(mono(line) <= 110.0);
    }
}

#[test]
fn over_wide_word_is_kept_whole() {
    let lines = wrap_words("a supercalifragilistic b", 50.0, mono);
    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn whitespace_only_text_has_no_lines() {
    assert!(wrap_words("   \n ", 100.0, mono).is_empty());
}

#[test]
fn exact_fit_stays_on_one_line() {
    assert_eq!(wrap_words("ab cd", 50.0, mono), vec!["ab cd"]);
}

fn image_with_ink(w: u32, h: u32, ink: (u32, u32, u32, u32)) -> PreparedImage {
    let mut bytes = vec![0u8; (w * h * 4) as usize];
    for y in ink.1..ink.3 {
        for x in ink.0..ink.2 {
            let i = ((y * w + x) * 4) as usize;
            bytes[i..i + 4].copy_from_slice(&[255, 255, 255, 255]);
        }
    }
    PreparedImage::from_premul(w, h, bytes).unwrap()
}

#[test]
fn ink_bounds_finds_opaque_box() {
    let img = image_with_ink(10, 6, (3, 1, 7, 4));
    assert_eq!(ink_bounds(&img), Some((3, 1, 7, 4)));
    assert_eq!(ink_bounds(&PreparedImage::transparent(3, 3)), None);
}

#[test]
fn lines_center_on_ink_not_advance() {
    // Ink sits off-center inside its line box, as with a large left bearing.
    let image = image_with_ink(20, 10, (8, 2, 16, 8));
    let ink = ink_bounds(&image).unwrap();
    let lines = vec![InkLine { image, ink }];
    let rect = SceneRect::new(0.0, 0.0, 100.0, 40.0);
    let placed = place_lines(&lines, rect, 10.0);
    let (x, y, _) = placed[0];
    // Ink center (12) lands on the rect center (50).
    assert_eq!(x + 12, 50);
    // Line box center (5) lands on the rect's vertical center (20).
    assert_eq!(y + 5, 20);
}

#[test]
fn multi_line_block_is_vertically_centered() {
    let mk = || {
        let image = image_with_ink(10, 10, (0, 0, 10, 10));
        let ink = ink_bounds(&image).unwrap();
        InkLine { image, ink }
    };
    let lines = vec![mk(), mk()];
    let placed = place_lines(&lines, SceneRect::new(0.0, 0.0, 10.0, 40.0), 10.0);
    assert_eq!(placed[0].1, 10);
    assert_eq!(placed[1].1, 20);
}

#[test]
fn renderer_rejects_non_font_bytes() {
    let style = SubtitleStyle {
        font_uri: "font.ttf".to_string(),
        size_px: 24.0,
        color_rgba: [255, 255, 255, 255],
    };
    let err = SubtitleRenderer::new(style, b"not a font".to_vec()).unwrap_err();
    assert!(matches!(err, PosereelError::Asset(_)));
}

#[test]
fn captions_are_built_once_per_text_and_width() {
    let cache = CaptionCache::default();
    let builds = std::cell::Cell::new(0);
    let build = || {
        builds.set(builds.get() + 1);
        let image = image_with_ink(4, 4, (0, 0, 4, 4));
        let ink = ink_bounds(&image).unwrap();
        Ok(vec![InkLine { image, ink }])
    };

    let first = cache.get_or_build("hello", 100.0, build).unwrap();
    let again = cache.get_or_build("hello", 100.0, build).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(builds.get(), 1);

    cache.get_or_build("hello", 50.0, build).unwrap();
    cache.get_or_build("bye", 100.0, build).unwrap();
    assert_eq!(builds.get(), 3);
    assert_eq!(cache.len(), 3);
}

#[test]
fn failed_builds_are_not_cached() {
    let cache = CaptionCache::default();
    let err = cache
        .get_or_build("x", 10.0, || Err(PosereelError::asset("no glyphs")))
        .unwrap_err();
    assert!(matches!(err, PosereelError::Asset(_)));
    assert_eq!(cache.len(), 0);
}
