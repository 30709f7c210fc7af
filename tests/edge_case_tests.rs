//! Edge case tests for filters, windows and page hit-testing

use gaze_dwell::{
    filters::create_filter,
    geometry::{Point, PointSample, PointWindow, Rect, Viewport},
    page::{HitCache, PageQuery, StaticPage, TargetId},
    stability::{robust_dispersion, trimmed_mean},
};

#[test]
fn test_filter_extreme_values() {
    let filters = vec!["none", "median:5", "lowpass:0.1", "oneeuro", "adaptive"];

    for filter_str in filters {
        let mut filter = create_filter(filter_str).unwrap();

        let extreme_values = vec![
            (f64::INFINITY, f64::NEG_INFINITY),
            (f64::NAN, f64::NAN),
            (f64::MAX, f64::MIN),
            (1e100, -1e100),
            (0.0, 0.0),
        ];

        for (i, (x, y)) in (0u32..).zip(extreme_values) {
            // Only absence of panics is checked; NaN and infinity may propagate
            let _ = filter.apply(x, y, f64::from(i) * 10.0);
        }
    }
}

#[test]
fn test_filter_reset_behavior() {
    let filters = vec!["lowpass:0.5", "oneeuro", "adaptive", "median:3"];

    for filter_str in filters {
        let mut filter = create_filter(filter_str).unwrap();
        filter.apply(10.0, 20.0, 0.0);
        filter.apply(15.0, 25.0, 33.0);
        let before_reset = filter.apply(40.0, 50.0, 66.0);

        filter.reset();

        // Without history the first sample passes straight through
        let after_reset = filter.apply(40.0, 50.0, 99.0);
        assert_eq!(after_reset, (40.0, 50.0), "filter {}", filter.name());
        if filter.name() != "MedianFilter" {
            assert!(
                (before_reset.0 - after_reset.0).abs() > 1e-10,
                "Filter {} did not change output after reset",
                filter.name()
            );
        }
    }
}

#[test]
fn test_filter_convergence() {
    let filters = vec!["lowpass:0.1", "oneeuro", "oneeuro:0.5:0.0", "adaptive", "median:5"];

    for filter_str in filters {
        let mut filter = create_filter(filter_str).unwrap();
        let target = (642.0, 384.0);

        filter.apply(0.0, 0.0, 0.0);
        let mut last_output = (0.0, 0.0);
        for i in 1..200u32 {
            last_output = filter.apply(target.0, target.1, f64::from(i) * 16.0);
        }

        assert!(
            (last_output.0 - target.0).abs() < 0.5 && (last_output.1 - target.1).abs() < 0.5,
            "Filter {} did not settle on the target: {:?}",
            filter.name(),
            last_output
        );
    }
}

#[test]
fn test_filter_impulse_response() {
    let filters = vec!["median:5", "adaptive", "lowpass:0.8"];

    for filter_str in filters {
        let mut filter = create_filter(filter_str).unwrap();
        for i in 0..10u32 {
            filter.apply(10.0, 10.0, f64::from(i) * 33.0);
        }

        let impulse_response = filter.apply(1000.0, 1000.0, 330.0);
        let recovery_response = filter.apply(10.0, 10.0, 363.0);

        match filter.name() {
            // Median window and jump guard both reject a one-frame spike
            "MedianFilter" | "SmoothingPipeline" => {
                assert!(impulse_response.0 < 500.0, "{} did not reject impulse", filter.name());
            }
            _ => {
                assert!(impulse_response.0 > 50.0, "{} was not affected by impulse", filter.name());
            }
        }
        assert!(recovery_response.0 <= impulse_response.0);
    }
}

#[test]
fn test_identical_timestamps_do_not_blow_up() {
    let mut filter = create_filter("oneeuro").unwrap();
    filter.apply(100.0, 100.0, 50.0);
    let (x, y) = filter.apply(300.0, 300.0, 50.0);
    assert!(x.is_finite() && y.is_finite());
    assert!(x > 100.0 && x <= 300.0);
}

#[test]
fn test_point_window_limits() {
    let mut window = PointWindow::new(3, 100.0);
    for i in 0..5u32 {
        window.push(PointSample::new(f64::from(i), 0.0, f64::from(i) * 10.0));
    }
    assert_eq!(window.len(), 3);
    assert_eq!(window.latest().map(|s| s.x), Some(4.0));

    // A late sample ages out everything older than the window span
    window.push(PointSample::new(9.0, 0.0, 200.0));
    assert_eq!(window.len(), 1);

    let mut zero = PointWindow::new(0, 100.0);
    zero.push(PointSample::new(1.0, 1.0, 0.0));
    assert_eq!(zero.len(), 1);
}

#[test]
fn test_viewport_clamp_edges() {
    let viewport = Viewport::new(800.0, 600.0);
    assert_eq!(viewport.clamp(Point::new(-10.0, 1e9)), Point::new(0.0, 599.0));
    assert_eq!(viewport.clamp(Point::new(f64::NAN, 10.0)), Point::new(399.5, 10.0));

    let degenerate = Viewport::new(0.0, 0.0);
    assert_eq!(degenerate.clamp(Point::new(50.0, 50.0)), Point::new(0.0, 0.0));
}

#[test]
fn test_statistics_on_degenerate_input() {
    assert_eq!(robust_dispersion(&[5.0]), 0.0);
    assert_eq!(robust_dispersion(&[3.0, 3.0, 3.0]), 0.0);
    assert_eq!(trimmed_mean(&[], 0.1), 0.0);
    assert!((trimmed_mean(&[7.0], 0.4) - 7.0).abs() < 1e-12);
}

#[test]
fn test_page_overlap_and_removal() {
    let mut page = StaticPage::new();
    page.insert(TargetId(1), Rect::new(0.0, 0.0, 200.0, 200.0));
    page.insert(TargetId(2), Rect::new(50.0, 50.0, 50.0, 50.0));

    // The element inserted last is on top
    assert_eq!(page.element_at(Point::new(60.0, 60.0)), Some(TargetId(2)));
    assert_eq!(page.element_at(Point::new(150.0, 150.0)), Some(TargetId(1)));

    page.remove(TargetId(2));
    assert_eq!(page.element_at(Point::new(60.0, 60.0)), Some(TargetId(1)));
    assert_eq!(page.bounds(TargetId(2)), None);
    assert_eq!(page.element_at(Point::new(500.0, 500.0)), None);
}

#[test]
fn test_hit_cache_expires_and_ignores_non_finite() {
    let mut page = StaticPage::new();
    page.insert(TargetId(1), Rect::new(0.0, 0.0, 100.0, 100.0));
    let mut cache = HitCache::new(8.0, 100.0, 16);

    assert_eq!(cache.element_at(&page, Point::new(10.0, 10.0), 0.0), Some(TargetId(1)));
    page.remove(TargetId(1));
    // Still cached
    assert_eq!(cache.element_at(&page, Point::new(10.0, 10.0), 50.0), Some(TargetId(1)));
    // Stale entry is refreshed from the page
    assert_eq!(cache.element_at(&page, Point::new(10.0, 10.0), 200.0), None);

    assert_eq!(cache.element_at(&page, Point::new(f64::NAN, 0.0), 200.0), None);
}
