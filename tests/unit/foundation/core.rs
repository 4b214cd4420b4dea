use super::*;

#[test]
fn time_window_is_half_open() {
    let w = TimeWindow::new(1.0, 2.0);
    assert!(!w.contains(0.999));
    assert!(w.contains(1.0));
    assert!(w.contains(1.999));
    assert!(!w.contains(2.0));
}

#[test]
fn touching_windows_do_not_overlap() {
    let a = TimeWindow::new(0.0, 1.0);
    let b = TimeWindow::new(1.0, 2.0);
    assert!(!a.overlaps(b));
    assert!(!b.overlaps(a));
    assert!(a.overlaps(TimeWindow::new(0.5, 0.6)));
}

#[test]
fn malformed_windows_are_detected() {
    assert!(!TimeWindow::new(1.0, 1.0).is_well_formed());
    assert!(!TimeWindow::new(2.0, 1.0).is_well_formed());
    assert!(!TimeWindow::new(0.0, f64::NAN).is_well_formed());
    assert!(TimeWindow::new(0.0, 0.1).is_well_formed());
}

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn frame_count_covers_half_open_duration() {
    let fps = Fps::whole(10).unwrap();
    assert_eq!(fps.frame_count(1.0), 10);
    assert_eq!(fps.frame_count(1.05), 11);
    assert_eq!(fps.frame_count(0.0), 0);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    let n = ntsc.frame_count(2.0);
    assert!(ntsc.frame_time_secs(n - 1) < 2.0);
    assert!(ntsc.frame_time_secs(n) >= 2.0);
}

#[test]
fn rect_intersection_ignores_shared_edges() {
    let top = SceneRect::new(0.0, 0.0, 100.0, 50.0);
    let bottom = SceneRect::new(0.0, 50.0, 100.0, 50.0);
    assert!(!top.intersects(&bottom));
    assert!(top.intersects(&SceneRect::new(10.0, 10.0, 5.0, 5.0)));
}
