use std::collections::BTreeMap;

use crate::data::model::{Extent, LabeledArray};

/// Upper end of a percentage slider.
pub const PERCENT_MAX: u32 = 100;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One user edit, as produced by a widget and consumed by
/// [`RangeSynchronizer::dispatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum RangeEvent {
    /// Both x sliders, in percent of the selected coordinate's span.
    XPercentages { low: u32, high: u32 },
    ResetX,
    /// Both y spin boxes, in data units.
    YBounds { min: f64, max: f64 },
    ResetY,
    SelectCoordinate(String),
}

// ---------------------------------------------------------------------------
// Range synchronizer
// ---------------------------------------------------------------------------

/// Visible x/y ranges of the plot.
///
/// The y range is absolute. The x range is a pair of percentages over the
/// selected coordinate's extent, so it keeps its meaning when the user
/// switches coordinate. Both ranges are kept non-degenerate: every setter
/// clamps its input instead of rejecting it.
#[derive(Debug, Clone)]
pub struct RangeSynchronizer {
    y_global: Extent,
    y: (f64, f64),
    p_low: u32,
    p_high: u32,
    coord_extents: BTreeMap<String, Extent>,
    selected: String,
    x_extent: Extent,
}

impl RangeSynchronizer {
    /// Full x span, global y extent, lexicographically first coordinate.
    pub fn new(array: &LabeledArray) -> Self {
        let coord_extents: BTreeMap<String, Extent> = array
            .coords()
            .iter()
            .map(|(name, c)| (name.clone(), c.extent()))
            .collect();
        let selected = array.default_coord().to_string();
        let x_extent = coord_extents
            .get(&selected)
            .copied()
            .map_or(Extent::UNIT, widened);

        let mut sync = Self {
            y_global: array.extent(),
            y: (0.0, 1.0),
            p_low: 0,
            p_high: PERCENT_MAX,
            coord_extents,
            selected,
            x_extent,
        };
        sync.reset_y();
        sync
    }

    pub fn selected_coord(&self) -> &str {
        &self.selected
    }

    pub fn x_percentages(&self) -> (u32, u32) {
        (self.p_low, self.p_high)
    }

    /// Absolute x bounds over the selected coordinate.
    pub fn x_bounds(&self) -> (f64, f64) {
        let Extent { min, max } = self.x_extent;
        // Interpolate instead of scaling `max - min`, which overflows for
        // extents wider than f64::MAX.
        let at = |percent: u32| {
            let t = f64::from(percent) / f64::from(PERCENT_MAX);
            min * (1.0 - t) + max * t
        };
        separated(at(self.p_low), at(self.p_high))
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        self.y
    }

    /// Spin box step: one percent of the global y span.
    pub fn y_step(&self) -> f64 {
        self.global_y_span() / 100.0
    }

    /// Range accepted by the y spin boxes.
    pub fn y_limits(&self) -> (f64, f64) {
        let span = self.global_y_span();
        (self.y_global.min - 1000.0 * span, self.y_global.max + 1000.0 * span)
    }

    fn global_y_span(&self) -> f64 {
        match self.y_global.span() {
            s if s > 0.0 && s.is_finite() => s,
            _ => 1.0,
        }
    }

    pub fn set_x_percentages(&mut self, low: u32, high: u32) {
        let mut low = low.min(PERCENT_MAX);
        let mut high = high.min(PERCENT_MAX);
        if low == PERCENT_MAX {
            low = PERCENT_MAX - 1;
        }
        if high == 0 {
            high = 1;
        }
        // On a positive span the bounds order follows the percentages.
        if low >= high {
            high = low + 1;
        }
        self.p_low = low;
        self.p_high = high;
    }

    pub fn reset_x(&mut self) {
        self.p_low = 0;
        self.p_high = PERCENT_MAX;
    }

    /// Set both y bounds; a non-finite component keeps its current value.
    ///
    /// If `min >= max`, `max` becomes `min` plus one percent of the global
    /// y span.
    pub fn set_y_bounds(&mut self, min: f64, max: f64) {
        let min = if min.is_finite() { min } else { self.y.0 };
        let mut max = if max.is_finite() { max } else { self.y.1 };
        if min >= max {
            // The second term only matters where the step is below float
            // resolution at `min`.
            max = min + self.y_step().max(min.abs() * f64::EPSILON * 2.0);
        }
        self.y = (min, max);
    }

    pub fn reset_y(&mut self) {
        self.set_y_bounds(self.y_global.min, self.y_global.max);
    }

    /// Switch the x axis to another coordinate, keeping the percentages.
    ///
    /// Returns `false` (and changes nothing) for an unknown name.
    pub fn on_coordinate_change(&mut self, name: &str) -> bool {
        let Some(extent) = self.coord_extents.get(name).copied() else {
            log::warn!("ignoring unknown coordinate '{name}'");
            return false;
        };
        self.selected = name.to_string();
        self.x_extent = widened(extent);
        true
    }

    pub fn dispatch(&mut self, event: RangeEvent) {
        log::debug!("range event: {event:?}");
        match event {
            RangeEvent::XPercentages { low, high } => self.set_x_percentages(low, high),
            RangeEvent::ResetX => self.reset_x(),
            RangeEvent::YBounds { min, max } => self.set_y_bounds(min, max),
            RangeEvent::ResetY => self.reset_y(),
            RangeEvent::SelectCoordinate(name) => {
                self.on_coordinate_change(&name);
            }
        }
    }
}

/// A zero-width extent is widened so percentages still map to distinct
/// bounds: by one unit, or by a few ulps where one unit is lost to rounding.
fn widened(extent: Extent) -> Extent {
    if extent.span() > 0.0 {
        return extent;
    }
    let (min, max) = separated(extent.min, extent.min + 1.0);
    Extent { min, max }
}

/// Pull `hi` above `lo` when rounding collapsed the two. Near the top of
/// the f64 range `lo` moves down instead.
fn separated(lo: f64, hi: f64) -> (f64, f64) {
    if lo < hi {
        return (lo, hi);
    }
    let step = (lo.abs() * f64::EPSILON * 2.0).max(f64::MIN_POSITIVE);
    if (lo + step).is_finite() {
        (lo, lo + step)
    } else {
        (lo - step, lo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Coordinate, DType};

    /// `time` over [0, 13], `iteration` over [0, 1], data over [0, 1].
    fn sample_array() -> LabeledArray {
        let time: Vec<f64> = (0..11).map(|i| i as f64 * 1.3).collect();
        let iteration: Vec<f64> = (0..11).map(|i| i as f64 / 10.0).collect();
        let data: Vec<f64> = (0..11).map(|i| ((i * 7) % 11) as f64 / 10.0).collect();
        let mut coords = BTreeMap::new();
        coords.insert("time".to_string(), Coordinate::new(time, DType::Float64));
        coords.insert("iteration".to_string(), Coordinate::new(iteration, DType::Float64));
        LabeledArray::new("iteration", data, DType::Float64, coords).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn starts_with_full_ranges() {
        let sync = RangeSynchronizer::new(&sample_array());
        assert_eq!(sync.selected_coord(), "iteration");
        assert_eq!(sync.x_percentages(), (0, 100));
        assert_eq!(sync.x_bounds(), (0.0, 1.0));
        assert_eq!(sync.y_bounds(), (0.0, 1.0));
    }

    #[test]
    fn x_range_never_degenerates() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        for low in 0..=100 {
            for high in 0..=100 {
                sync.set_x_percentages(low, high);
                let (p_low, p_high) = sync.x_percentages();
                assert!(p_low < p_high && p_high <= 100, "{low},{high} -> {p_low},{p_high}");
                let (lo, hi) = sync.x_bounds();
                assert!(lo < hi, "{low},{high} -> {lo},{hi}");
            }
        }
    }

    #[test]
    fn x_range_survives_large_offsets() {
        let offset: Vec<f64> = (0..11).map(|i| 1e16 + 5.0 * i as f64).collect();
        let mut coords = BTreeMap::new();
        coords.insert("offset".to_string(), Coordinate::new(offset, DType::Float64));
        let array = LabeledArray::new("offset", vec![0.0; 11], DType::Float64, coords).unwrap();
        let mut sync = RangeSynchronizer::new(&array);
        for low in 0..=100 {
            for high in 0..=100 {
                sync.set_x_percentages(low, high);
                let (lo, hi) = sync.x_bounds();
                assert!(lo < hi, "{low},{high} -> {lo},{hi}");
            }
        }
    }

    #[test]
    fn x_range_spanning_all_floats_stays_finite() {
        let mut coords = BTreeMap::new();
        coords.insert(
            "wide".to_string(),
            Coordinate::new(vec![-f64::MAX, f64::MAX], DType::Float64),
        );
        let array = LabeledArray::new("wide", vec![1.0, 2.0], DType::Float64, coords).unwrap();
        let mut sync = RangeSynchronizer::new(&array);
        assert_eq!(sync.x_bounds(), (-f64::MAX, f64::MAX));
        for (low, high) in [(0, 1), (25, 75), (50, 50), (99, 100)] {
            sync.set_x_percentages(low, high);
            let (lo, hi) = sync.x_bounds();
            assert!(lo.is_finite() && hi.is_finite(), "{low},{high} -> {lo},{hi}");
            assert!(lo < hi, "{low},{high} -> {lo},{hi}");
        }
        sync.set_x_percentages(25, 75);
        let (lo, hi) = sync.x_bounds();
        let half = f64::MAX / 2.0;
        assert!((lo / half + 1.0).abs() < 1e-12 && (hi / half - 1.0).abs() < 1e-12);
    }

    #[test]
    fn constant_huge_coordinate_is_widened() {
        let mut coords = BTreeMap::new();
        coords.insert("c".to_string(), Coordinate::new(vec![1e300; 3], DType::Float64));
        let array = LabeledArray::new("c", vec![1.0, 2.0, 3.0], DType::Float64, coords).unwrap();
        let mut sync = RangeSynchronizer::new(&array);
        sync.set_x_percentages(40, 60);
        let (lo, hi) = sync.x_bounds();
        assert!(lo < hi, "{lo},{hi}");
    }

    #[test]
    fn clamps_slider_extremes() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.set_x_percentages(100, 100);
        assert_eq!(sync.x_percentages(), (99, 100));
        sync.set_x_percentages(0, 0);
        assert_eq!(sync.x_percentages(), (0, 1));
        sync.set_x_percentages(70, 20);
        assert_eq!(sync.x_percentages(), (70, 71));
        sync.set_x_percentages(250, 400);
        assert_eq!(sync.x_percentages(), (99, 100));
    }

    #[test]
    fn equal_percentages_push_high_bound() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        assert!(sync.on_coordinate_change("time"));
        sync.set_x_percentages(50, 50);
        assert_eq!(sync.x_percentages(), (50, 51));
        let (lo, hi) = sync.x_bounds();
        assert!(approx(lo, 6.5));
        assert!(approx(hi, 6.63));
    }

    #[test]
    fn reset_x_is_idempotent() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.on_coordinate_change("time");
        sync.set_x_percentages(10, 40);
        sync.reset_x();
        let after_reset = sync.x_bounds();
        sync.set_x_percentages(0, 100);
        assert_eq!(sync.x_bounds(), after_reset);
        assert!(approx(after_reset.0, 0.0) && approx(after_reset.1, 13.0));
    }

    #[test]
    fn coordinate_change_keeps_percentages() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.set_x_percentages(20, 60);
        let (lo, hi) = sync.x_bounds();
        assert!(approx(lo, 0.2) && approx(hi, 0.6));

        sync.set_y_bounds(0.1, 0.4);
        assert!(sync.on_coordinate_change("time"));
        assert_eq!(sync.selected_coord(), "time");
        assert_eq!(sync.x_percentages(), (20, 60));
        let (lo, hi) = sync.x_bounds();
        assert!(approx(lo, 2.6) && approx(hi, 7.8));
        assert_eq!(sync.y_bounds(), (0.1, 0.4));
    }

    #[test]
    fn unknown_coordinate_is_ignored() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.dispatch(RangeEvent::SelectCoordinate("depth".into()));
        assert_eq!(sync.selected_coord(), "iteration");
        assert!(!sync.on_coordinate_change("depth"));
    }

    #[test]
    fn equal_y_bounds_are_nudged() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.set_y_bounds(0.5, 0.5);
        let (min, max) = sync.y_bounds();
        assert_eq!(min, 0.5);
        assert!(approx(max, 0.51));

        sync.set_y_bounds(0.8, 0.2);
        let (min, max) = sync.y_bounds();
        assert_eq!(min, 0.8);
        assert!(approx(max, 0.81));
    }

    #[test]
    fn y_range_never_degenerates() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        let grid = [-1e6, -3.0, -0.01, 0.0, 0.5, 1.0, 42.0, 1e12, 1e300];
        for &min in &grid {
            for &max in grid.iter().filter(|&&m| m >= min) {
                sync.set_y_bounds(min, max);
                let (lo, hi) = sync.y_bounds();
                assert_eq!(lo, min);
                assert!(hi > lo, "{min},{max} -> {lo},{hi}");
            }
        }
    }

    #[test]
    fn non_finite_y_input_keeps_bound() {
        let mut sync = RangeSynchronizer::new(&sample_array());
        sync.set_y_bounds(0.2, 0.7);
        sync.set_y_bounds(f64::NAN, 0.9);
        assert_eq!(sync.y_bounds(), (0.2, 0.9));
        sync.dispatch(RangeEvent::ResetY);
        assert_eq!(sync.y_bounds(), (0.0, 1.0));
    }

    #[test]
    fn spin_box_support() {
        let sync = RangeSynchronizer::new(&sample_array());
        assert!(approx(sync.y_step(), 0.01));
        assert_eq!(sync.y_limits(), (-1000.0, 1001.0));
    }

    #[test]
    fn constant_data_still_has_ranges() {
        let array = LabeledArray::new("n", vec![3.0; 4], DType::Float64, BTreeMap::new()).unwrap();
        let mut sync = RangeSynchronizer::new(&array);
        let (min, max) = sync.y_bounds();
        assert_eq!(min, 3.0);
        assert!(approx(max, 3.01));

        let single = LabeledArray::new("n", vec![3.0], DType::Float64, BTreeMap::new()).unwrap();
        sync = RangeSynchronizer::new(&single);
        sync.set_x_percentages(50, 50);
        let (lo, hi) = sync.x_bounds();
        assert!(lo < hi);
    }
}
