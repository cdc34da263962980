use crate::window::align_start_even;
use crate::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_height(&mut self, min: u64, max_exclusive: u64) -> f64 {
        (min + self.next_u64() % (max_exclusive - min)) as f64
    }
}

fn random_cache(rng: &mut Lcg, count: usize) -> PositionCache {
    let heights: Vec<f64> = (0..count).map(|_| rng.gen_height(1, 50)).collect();
    PositionCache::rebuild(count, |i| (heights[i], false))
}

fn windowed_options(count: usize, row_height: f64) -> VirtualOptions {
    VirtualOptions::new(row_height).with_count(count)
}

fn geometry(scroll: f64, viewport: f64) -> ScrollGeometry {
    ScrollGeometry::new(scroll, viewport)
}

fn plan_of(outcome: WindowOutcome) -> WindowPlan {
    match outcome {
        WindowOutcome::Ready(plan) => plan,
        WindowOutcome::StaleGeometry => panic!("unexpected stale geometry"),
    }
}

#[test]
fn rebuilt_offsets_are_monotonic_and_adjacent() {
    let mut rng = Lcg::new(7);
    let cache = random_cache(&mut rng, 500);
    assert_eq!(cache.entry(0).unwrap().offset, 0.0);
    for i in 0..cache.len() - 1 {
        let cur = cache.entry(i).unwrap();
        let next = cache.entry(i + 1).unwrap();
        assert_eq!(cur.offset + cur.height, next.offset, "gap at {i}");
        assert!(next.offset > cur.offset);
    }
    let last = cache.entry(cache.len() - 1).unwrap();
    assert_eq!(cache.total_height(), last.offset + last.height);
}

#[test]
fn update_height_shifts_later_offsets_only() {
    let cache_before = PositionCache::rebuild(10, |_| (20.0, false));
    let mut cache = cache_before.clone();
    assert!(cache.update_height(4, 50.0));

    for i in 0..4 {
        assert_eq!(
            cache.entry(i).unwrap().offset,
            cache_before.entry(i).unwrap().offset,
            "offset before the updated row moved at {i}"
        );
    }
    assert_eq!(cache.entry(4).unwrap().height, 50.0);
    for i in 5..10 {
        assert_eq!(
            cache.entry(i).unwrap().offset,
            cache_before.entry(i).unwrap().offset + 30.0,
            "offset after the updated row off by delta at {i}"
        );
    }
    assert_eq!(cache.total_height(), cache_before.total_height() + 30.0);
}

#[test]
fn sub_pixel_height_deltas_are_ignored() {
    let mut cache = PositionCache::rebuild(5, |_| (20.0, false));
    assert!(!cache.update_height(2, 20.6));
    assert_eq!(cache.entry(2).unwrap().height, 20.0);
    assert_eq!(cache.total_height(), 100.0);
}

#[test]
fn row_index_at_offset_hits_both_row_edges() {
    let mut rng = Lcg::new(42);
    let cache = random_cache(&mut rng, 300);
    for k in 0..cache.len() {
        let e = *cache.entry(k).unwrap();
        assert_eq!(cache.row_index_at_offset(e.offset), Some(k));
        assert_eq!(cache.row_index_at_offset(e.offset + e.height - 1.0), Some(k));
    }
    assert_eq!(PositionCache::new().row_index_at_offset(10.0), None);
}

#[test]
fn height_resolution_prefers_plugin_then_provided_then_cached() {
    let mut v: RowVirtualizer = RowVirtualizer::new(VirtualOptions::new(28.0));
    v.rebuild_rows(4, |i| RowProbe::new(i as u64));
    v.measure_rows([(3, 40.0)]);

    v.rebuild_rows(4, |i| {
        let mut p = RowProbe::new(i as u64);
        if i == 0 {
            p.plugin_height = Some(150.0);
            p.provided_height = Some(60.0);
        }
        if i == 1 {
            p.provided_height = Some(60.0);
        }
        p
    });
    assert_eq!(v.positions().height_of(0), 150.0); // plugin wins
    assert_eq!(v.positions().height_of(1), 60.0); // provided height fn
    assert_eq!(v.positions().height_of(3), 40.0); // durable measurement
    assert!(v.positions().is_measured(3));
    assert_eq!(v.positions().height_of(2), 40.0); // estimate = measured average
}

#[test]
fn measurements_follow_keys_after_reorder() {
    let mut v: RowVirtualizer = RowVirtualizer::new(VirtualOptions::new(10.0));
    v.rebuild_rows(2, |i| RowProbe::new(100 + i as u64));
    v.measure_rows([(0, 30.0)]);
    assert_eq!(v.positions().height_of(0), 30.0);

    // Swap the two rows; the measurement must follow key 100 to index 1.
    v.rebuild_rows(2, |i| RowProbe::new(101 - i as u64));
    assert_eq!(v.positions().height_of(1), 30.0);
    assert!(v.positions().is_measured(1));
    assert!(!v.positions().is_measured(0));
}

#[test]
fn average_height_excludes_plugin_managed_rows() {
    let mut v: RowVirtualizer = RowVirtualizer::new(VirtualOptions::new(28.0));
    v.rebuild_rows(3, |i| {
        let mut p = RowProbe::new(i as u64);
        if i == 0 {
            p.plugin_height = Some(500.0);
        }
        p
    });
    // The managed row's rendered height must not skew the fallback estimate.
    v.measure_rows([(0, 500.0), (1, 30.0), (2, 34.0)]);
    let state = v.state();
    assert_eq!(state.measured_count, 2);
    assert_eq!(state.average_height, 32.0);
    assert_eq!(v.estimate_height(), 32.0);
}

#[test]
fn remeasuring_a_row_replaces_its_average_contribution() {
    let mut v: RowVirtualizer = RowVirtualizer::new(VirtualOptions::new(28.0));
    v.rebuild_rows(2, |i| RowProbe::new(i as u64));
    v.measure_rows([(0, 30.0), (1, 50.0)]);
    v.measure_rows([(1, 10.0)]);
    let state = v.state();
    assert_eq!(state.measured_count, 2);
    assert_eq!(state.average_height, 20.0);
}

#[test]
fn expanded_rows_scenario_offsets_and_collapse() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(28.0).with_variable_heights(true));
    v.rebuild_rows(100, |i| {
        let mut p = RowProbe::new(i as u64);
        if i < 3 {
            p.plugin_height = Some(150.0);
        }
        p
    });
    assert_eq!(v.positions().row_index_at_offset(0.0), Some(0));
    assert_eq!(v.offset_of(3), 3.0 * 150.0);

    let before = v.offset_of(3);
    v.invalidate_row_height(0, Some(28.0));
    assert_eq!(v.offset_of(3), before - (150.0 - 28.0));
}

#[test]
fn invalidate_without_height_falls_back_to_estimate() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(28.0).with_variable_heights(true));
    v.rebuild_rows(5, |i| RowProbe::new(i as u64));
    v.measure_rows([(2, 90.0)]);
    assert_eq!(v.positions().height_of(2), 90.0);

    v.invalidate_row_height(2, None);
    assert!(!v.positions().is_measured(2));
    // The dropped measurement leaves the running average too, so the only
    // remaining estimate is the configured base height.
    assert_eq!(v.positions().height_of(2), 28.0);
    assert_eq!(v.measurement_cache_len(), 0);
    assert_eq!(v.state().measured_count, 0);
}

#[test]
fn invalidated_row_is_counted_once_when_remeasured() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(28.0).with_variable_heights(true));
    v.rebuild_rows(3, |i| RowProbe::new(i as u64));
    v.measure_rows([(1, 80.0)]);
    assert_eq!(v.state().measured_count, 1);

    v.invalidate_row_height(1, None);
    assert_eq!(v.state().measured_count, 0);
    assert_eq!(v.estimate_height(), 28.0);

    // Remeasuring after the drop must not double-count the row.
    v.measure_rows([(1, 80.0)]);
    let state = v.state();
    assert_eq!(state.measured_count, 1);
    assert_eq!(state.average_height, 80.0);
}

#[test]
fn managed_row_going_unmanaged_recounts_cleanly() {
    let mut v: RowVirtualizer = RowVirtualizer::new(VirtualOptions::new(28.0));
    v.rebuild_rows(2, |i| {
        let mut p = RowProbe::new(i as u64);
        if i == 0 {
            p.plugin_height = Some(500.0);
        }
        p
    });
    v.measure_rows([(0, 500.0), (1, 30.0)]);
    assert_eq!(v.state().measured_count, 1);
    assert_eq!(v.estimate_height(), 30.0);

    // The plugin stops managing row 0; its old 500px measurement sits in
    // the durable cache but was never part of the average, so the collapsed
    // remeasurement must enter as a fresh contribution.
    v.rebuild_rows(2, |i| RowProbe::new(i as u64));
    v.measure_rows([(0, 40.0)]);
    let state = v.state();
    assert_eq!(state.measured_count, 2);
    assert_eq!(state.average_height, 35.0);
    assert!(v.estimate_height() > 0.0);
}

#[test]
fn out_of_band_resize_leaves_the_average() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(28.0).with_variable_heights(true));
    v.rebuild_rows(2, |i| RowProbe::new(i as u64));
    v.measure_rows([(0, 30.0), (1, 34.0)]);
    assert_eq!(v.state().average_height, 32.0);

    // An expanded detail panel must not drag the estimate up.
    v.invalidate_row_height(0, Some(400.0));
    let state = v.state();
    assert_eq!(state.measured_count, 1);
    assert_eq!(state.average_height, 34.0);
    assert_eq!(v.positions().height_of(0), 400.0);
}

#[test]
fn export_import_measurement_cache_roundtrip() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(20.0).with_variable_heights(true));
    v.rebuild_rows(4, |i| RowProbe::new(i as u64));
    v.measure_rows([(1, 35.0), (3, 45.0)]);

    let exported = v.export_measurement_cache();
    assert_eq!(exported.len(), 2);

    let mut v2: RowVirtualizer =
        RowVirtualizer::new(VirtualOptions::new(20.0).with_variable_heights(true));
    v2.rebuild_rows(4, |i| RowProbe::new(i as u64));
    v2.import_measurement_cache(exported);
    assert_eq!(v2.positions().height_of(1), 35.0);
    assert_eq!(v2.positions().height_of(3), 45.0);
    assert!(v2.positions().is_measured(3));
}

#[test]
fn even_alignment_is_idempotent() {
    for start in 0..64usize {
        let once = align_start_even(start);
        assert_eq!(once % 2, 0);
        assert_eq!(align_start_even(once), once);
        assert!(once <= start && start - once <= 1);
    }
}

#[test]
fn bypass_boundary_at_threshold() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(24, 28.0));
    v.rebuild_rows(24, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(0.0, 400.0), true, &NoHooks));
    assert_eq!(plan.mode, VirtualMode::Bypass);
    assert_eq!(plan.range, RowRange::new(0, 24));

    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(25, 28.0));
    v.rebuild_rows(25, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(0.0, 400.0), true, &NoHooks));
    assert_eq!(plan.mode, VirtualMode::Windowed);
    assert!(plan.range.len() < 25 || plan.range.end == 25);
}

#[test]
fn bypass_transform_resets_only_on_structural_refresh() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(10, 28.0));
    v.rebuild_rows(10, |i| RowProbe::new(i as u64));
    let structural = plan_of(v.plan_window(geometry(50.0, 400.0), true, &NoHooks));
    assert_eq!(structural.transform_offset, Some(0.0));
    let scroll_only = plan_of(v.plan_window(geometry(50.0, 400.0), false, &NoHooks));
    assert_eq!(scroll_only.transform_offset, None);
}

#[test]
fn bypass_spacer_includes_plugin_extra_height() {
    struct Extra;
    impl WindowHooks for Extra {
        fn extra_height(&self) -> f64 {
            100.0
        }
    }
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(10, 28.0));
    v.rebuild_rows(10, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(0.0, 400.0), true, &Extra));
    assert_eq!(plan.spacer_height, 10.0 * 28.0 + 100.0);
    assert_eq!(plan.row_content_height, 10.0 * 28.0);
}

#[test]
fn fixed_window_is_even_aligned_and_covers_viewport() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(500.0, 400.0), false, &NoHooks));

    assert_eq!(plan.mode, VirtualMode::Windowed);
    let RowRange { start, end } = plan.range;
    assert_eq!(start % 2, 0);
    let min_rows = (400.0f64 / 28.0).ceil() as usize + 3;
    assert!(end - start >= min_rows);

    // Sub-pixel transform bound: within two row heights because of even
    // alignment (one row of slack from flooring, one from parity).
    let t = plan.transform_offset.unwrap();
    assert!((0.0..2.0 * 28.0).contains(&-t), "transform {t} out of bound");
    // The transform lines the window up exactly on the start row's edge.
    assert_eq!(500.0 + t, start as f64 * 28.0);
}

#[test]
fn overshot_scroll_with_odd_count_keeps_even_start() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(25, 28.0));
    v.rebuild_rows(25, |i| RowProbe::new(i as u64));
    // Scroll far past the content: the clamped start must stay even.
    let plan = plan_of(v.plan_window(geometry(1.0e6, 400.0), false, &NoHooks));
    assert_eq!(plan.range.start % 2, 0);
    assert_eq!(plan.range.start, 24);
    assert_eq!(plan.range.end, 25);
}

#[test]
fn scrolling_to_zero_renders_from_row_zero() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(0.0, 400.0), false, &NoHooks));
    assert_eq!(plan.range.start, 0);
    assert_eq!(plan.transform_offset, Some(0.0));
}

#[test]
fn variable_window_uses_real_offsets() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(windowed_options(100, 28.0).with_variable_heights(true));
    v.rebuild_rows(100, |i| {
        let mut p = RowProbe::new(i as u64);
        if i < 3 {
            p.plugin_height = Some(150.0);
        }
        p
    });
    // Scroll past the three expanded rows: 450px consumed by rows 0..3.
    let plan = plan_of(v.plan_window(geometry(478.0, 400.0), false, &NoHooks));
    let start = plan.range.start;
    assert_eq!(start % 2, 0);
    assert!(start <= 4, "start {start} overshot the expanded block");
    let t = plan.transform_offset.unwrap();
    assert_eq!(478.0 + t, v.offset_of(start));
}

#[test]
fn variable_end_has_row_count_floor_for_tiny_rows() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(windowed_options(1000, 28.0).with_variable_heights(true));
    v.rebuild_rows(1000, |i| {
        let mut p = RowProbe::new(i as u64);
        p.provided_height = Some(2.0);
        p
    });
    let plan = plan_of(v.plan_window(geometry(100.0, 400.0), false, &NoHooks));
    let min_rows = (400.0f64 / 28.0).ceil() as usize + 3;
    assert!(plan.range.len() >= min_rows);
}

#[test]
fn variable_spacer_does_not_double_count_extra_height() {
    struct Extra;
    impl WindowHooks for Extra {
        fn extra_height(&self) -> f64 {
            366.0
        }
    }
    let mut v: RowVirtualizer =
        RowVirtualizer::new(windowed_options(100, 28.0).with_variable_heights(true));
    v.rebuild_rows(100, |i| {
        let mut p = RowProbe::new(i as u64);
        if i < 3 {
            p.plugin_height = Some(150.0);
        }
        p
    });
    let plan = plan_of(v.plan_window(geometry(0.0, 400.0), true, &Extra));
    // Positions already embed the expanded rows; adding the hook's extra
    // height on top would double count.
    assert_eq!(plan.spacer_height, v.total_height());
}

#[test]
fn fixed_start_correction_converges_on_extra_height() {
    // One expanded row at index 2 contributes 122px of extra height; every
    // index above it sees that extra before itself.
    struct Expanded;
    impl WindowHooks for Expanded {
        fn extra_height(&self) -> f64 {
            122.0
        }
        fn extra_height_before(&self, index: usize) -> f64 {
            if index > 2 { 122.0 } else { 0.0 }
        }
    }
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));

    // Scroll target: row 10's true offset = 10*28 + 122.
    let plan = plan_of(v.plan_window(geometry(402.0, 400.0), false, &Expanded));
    assert_eq!(plan.range.start, 10);
    let t = plan.transform_offset.unwrap();
    assert_eq!(402.0 + t, 10.0 * 28.0 + 122.0);
}

#[test]
fn fixed_start_correction_is_bounded_under_oscillation() {
    // Adversarial hook whose report flips depending on the index parity,
    // preventing the correction loop from ever stabilizing.
    struct Oscillating;
    impl WindowHooks for Oscillating {
        fn extra_height_before(&self, index: usize) -> f64 {
            if index % 2 == 0 { 0.0 } else { 28.0 }
        }
    }
    let mut v: RowVirtualizer = RowVirtualizer::new(
        windowed_options(100, 28.0).with_start_correction_cap(4),
    );
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    // Must terminate and produce a plausible window near the raw estimate.
    let plan = plan_of(v.plan_window(geometry(500.0, 400.0), false, &Oscillating));
    assert!(plan.range.start <= 18);
}

#[test]
fn plugin_start_adjustment_pulls_backward_only() {
    struct PullBack;
    impl WindowHooks for PullBack {
        fn adjust_start(&self, start: usize, _s: f64, _h: f64) -> Option<usize> {
            Some(start.saturating_sub(5))
        }
    }
    struct PushForward;
    impl WindowHooks for PushForward {
        fn adjust_start(&self, start: usize, _s: f64, _h: f64) -> Option<usize> {
            Some(start + 10)
        }
    }
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));

    let base = plan_of(v.plan_window(geometry(500.0, 400.0), false, &NoHooks));
    let pulled = plan_of(v.plan_window(geometry(500.0, 400.0), false, &PullBack));
    assert!(pulled.range.start < base.range.start);
    assert_eq!(pulled.range.start % 2, 0);

    let pushed = plan_of(v.plan_window(geometry(500.0, 400.0), false, &PushForward));
    assert_eq!(pushed.range.start, base.range.start);
}

#[test]
fn zero_height_track_reports_stale_geometry() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let mut geom = geometry(0.0, 400.0);
    geom.scrollbar_track_height = 0.0;
    assert_eq!(
        v.plan_window(geom, false, &NoHooks),
        WindowOutcome::StaleGeometry
    );
}

#[test]
fn disabled_engine_plans_all_rows() {
    let mut v: RowVirtualizer =
        RowVirtualizer::new(windowed_options(100, 28.0).with_enabled(false));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(500.0, 400.0), true, &NoHooks));
    assert_eq!(plan.mode, VirtualMode::Disabled);
    assert_eq!(plan.range, RowRange::new(0, 100));
}

#[test]
fn spacer_height_includes_chrome_and_scrollbar_compensation() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let mut geom = geometry(0.0, 400.0);
    geom.chrome_delta = 33.0;
    geom.h_scrollbar_compensation = 12.0;
    let plan = plan_of(v.plan_window(geom, true, &NoHooks));
    assert_eq!(plan.spacer_height, 100.0 * 28.0 + 33.0 + 12.0);
}

#[test]
fn scroll_offset_clamps_to_content() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    assert_eq!(v.max_scroll_offset(400.0), 100.0 * 28.0 - 400.0);
    assert_eq!(v.clamp_scroll_offset(1.0e9, 400.0), v.max_scroll_offset(400.0));
    assert_eq!(v.clamp_scroll_offset(-5.0, 400.0), 0.0);
}

#[test]
fn state_snapshot_reflects_applied_range() {
    let mut v: RowVirtualizer = RowVirtualizer::new(windowed_options(100, 28.0));
    v.rebuild_rows(100, |i| RowProbe::new(i as u64));
    let plan = plan_of(v.plan_window(geometry(500.0, 400.0), false, &NoHooks));
    v.set_range(plan.range);

    let state = v.state();
    assert!(state.enabled);
    assert_eq!(state.row_height, 28.0);
    assert_eq!(state.bypass_threshold, 24);
    assert_eq!((state.start, state.end), (plan.range.start, plan.range.end));
    assert!(!state.variable_heights);
    assert_eq!(state.measured_count, 0);
}

#[test]
fn randomized_binary_search_matches_linear_oracle() {
    let mut rng = Lcg::new(1234);
    for _ in 0..20 {
        let count = 1 + (rng.next_u64() % 200) as usize;
        let cache = random_cache(&mut rng, count);
        for _ in 0..50 {
            let target = rng.gen_height(0, cache.total_height() as u64 + 10);
            let got = cache.row_index_at_offset(target).unwrap();
            // Linear oracle: greatest index whose offset <= target.
            let mut want = 0;
            for i in 0..count {
                if cache.entry(i).unwrap().offset <= target {
                    want = i;
                }
            }
            assert_eq!(got, want, "target {target}");
        }
    }
}
