//! Candle geometry and TA-Lib style candle settings shared by the recognizers.
//!
//! Averages are trailing: the value used at bar `i` is computed from the
//! `period` bars strictly before `i`.

/// TA-Lib candle averaging period for bodies, ranges and shadows.
pub const AVG_PERIOD: usize = 10;
/// TA-Lib period for Near/Far/Equal comparisons.
pub const NEAR_PERIOD: usize = 5;

pub const DOJI_FACTOR: f64 = 0.1;
pub const SHADOW_VERYSHORT_FACTOR: f64 = 0.1;
pub const SHADOW_VERYLONG_FACTOR: f64 = 2.0;
pub const NEAR_FACTOR: f64 = 0.2;
pub const FAR_FACTOR: f64 = 0.6;
pub const EQUAL_FACTOR: f64 = 0.05;

/// Aligned OHLC view over four equal-length slices.
pub struct Candles<'a> {
    open: &'a [f64],
    high: &'a [f64],
    low: &'a [f64],
    close: &'a [f64],
}

impl<'a> Candles<'a> {
    /// `None` when the slices are not the same length.
    pub fn new(open: &'a [f64], high: &'a [f64], low: &'a [f64], close: &'a [f64]) -> Option<Self> {
        let n = open.len();
        if high.len() != n || low.len() != n || close.len() != n {
            return None;
        }
        Some(Self {
            open,
            high,
            low,
            close,
        })
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn open(&self, i: usize) -> f64 {
        self.open[i]
    }

    pub fn high(&self, i: usize) -> f64 {
        self.high[i]
    }

    pub fn low(&self, i: usize) -> f64 {
        self.low[i]
    }

    pub fn close(&self, i: usize) -> f64 {
        self.close[i]
    }

    pub fn body(&self, i: usize) -> f64 {
        (self.close[i] - self.open[i]).abs()
    }

    pub fn range(&self, i: usize) -> f64 {
        self.high[i] - self.low[i]
    }

    pub fn body_top(&self, i: usize) -> f64 {
        self.open[i].max(self.close[i])
    }

    pub fn body_bottom(&self, i: usize) -> f64 {
        self.open[i].min(self.close[i])
    }

    pub fn upper_shadow(&self, i: usize) -> f64 {
        self.high[i] - self.body_top(i)
    }

    pub fn lower_shadow(&self, i: usize) -> f64 {
        self.body_bottom(i) - self.low[i]
    }

    pub fn is_white(&self, i: usize) -> bool {
        self.close[i] > self.open[i]
    }

    pub fn is_black(&self, i: usize) -> bool {
        self.close[i] < self.open[i]
    }

    /// TA-Lib candle color: +1 when close >= open, -1 otherwise.
    pub fn color(&self, i: usize) -> i32 {
        if self.close[i] >= self.open[i] { 1 } else { -1 }
    }

    fn trailing_mean(&self, at: usize, period: usize, f: impl Fn(usize) -> f64) -> f64 {
        if at == 0 {
            return f(0);
        }
        let start = at.saturating_sub(period);
        let sum: f64 = (start..at).map(f).sum();
        sum / (at - start) as f64
    }

    pub fn avg_body(&self, at: usize) -> f64 {
        self.trailing_mean(at, AVG_PERIOD, |i| self.body(i))
    }

    pub fn avg_range(&self, at: usize) -> f64 {
        self.trailing_mean(at, AVG_PERIOD, |i| self.range(i))
    }

    /// Mean of (upper + lower) / 2, TA-Lib's "Shadows" range type.
    pub fn avg_shadow(&self, at: usize) -> f64 {
        self.trailing_mean(at, AVG_PERIOD, |i| {
            (self.upper_shadow(i) + self.lower_shadow(i)) / 2.0
        })
    }

    fn near_range(&self, at: usize) -> f64 {
        self.trailing_mean(at, NEAR_PERIOD, |i| self.range(i))
    }

    pub fn near(&self, at: usize) -> f64 {
        self.near_range(at) * NEAR_FACTOR
    }

    pub fn far(&self, at: usize) -> f64 {
        self.near_range(at) * FAR_FACTOR
    }

    pub fn equal(&self, at: usize) -> f64 {
        self.near_range(at) * EQUAL_FACTOR
    }

    /// `value` lies within the Equal tolerance of `reference`, measured at bar `at`.
    pub fn equals(&self, value: f64, reference: f64, at: usize) -> bool {
        let tol = self.equal(at);
        value <= reference + tol && value >= reference - tol
    }

    // --- gaps between bar `i` and an earlier bar `p` ---

    pub fn body_gap_up(&self, i: usize, p: usize) -> bool {
        self.body_bottom(i) > self.body_top(p)
    }

    pub fn body_gap_down(&self, i: usize, p: usize) -> bool {
        self.body_top(i) < self.body_bottom(p)
    }

    pub fn gap_up(&self, i: usize, p: usize) -> bool {
        self.low[i] > self.high[p]
    }

    pub fn gap_down(&self, i: usize, p: usize) -> bool {
        self.high[i] < self.low[p]
    }

    // --- TA-Lib candle settings ---

    pub fn body_long(&self, i: usize) -> bool {
        self.body(i) > self.avg_body(i)
    }

    pub fn body_short(&self, i: usize) -> bool {
        self.body(i) < self.avg_body(i)
    }

    pub fn body_doji(&self, i: usize) -> bool {
        self.body(i) <= self.avg_range(i) * DOJI_FACTOR
    }

    pub fn shadow_long(&self, shadow: f64, i: usize) -> bool {
        shadow > self.body(i)
    }

    pub fn shadow_very_long(&self, shadow: f64, i: usize) -> bool {
        shadow > self.body(i) * SHADOW_VERYLONG_FACTOR
    }

    pub fn shadow_short(&self, shadow: f64, i: usize) -> bool {
        shadow < self.avg_shadow(i)
    }

    pub fn shadow_very_short(&self, shadow: f64, i: usize) -> bool {
        shadow < self.avg_range(i) * SHADOW_VERYSHORT_FACTOR
    }
}

/// Evaluates `detect` at every bar with at least `lookback` bars of history;
/// earlier bars, and inputs of unequal length, yield 0.
pub fn scan(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    lookback: usize,
    detect: impl Fn(&Candles, usize) -> i32,
) -> Vec<i32> {
    let Some(candles) = Candles::new(open, high, low, close) else {
        return vec![0; open.len()];
    };
    (0..candles.len())
        .map(|i| if i < lookback { 0 } else { detect(&candles, i) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_of_a_white_candle() {
        let (o, h, l, c) = ([10.0], [14.0], [9.0], [12.0]);
        let candles = Candles::new(&o, &h, &l, &c).unwrap();
        assert_eq!(candles.body(0), 2.0);
        assert_eq!(candles.range(0), 5.0);
        assert_eq!(candles.upper_shadow(0), 2.0);
        assert_eq!(candles.lower_shadow(0), 1.0);
        assert_eq!(candles.color(0), 1);
    }

    #[test]
    fn flat_candle_counts_as_white() {
        let v = [10.0];
        let candles = Candles::new(&v, &v, &v, &v).unwrap();
        assert_eq!(candles.color(0), 1);
        assert!(!candles.is_white(0));
    }

    #[test]
    fn gaps_compare_bodies_or_full_ranges() {
        let o = [10.0, 12.0];
        let h = [11.5, 13.0];
        let l = [9.0, 11.0];
        let c = [11.0, 12.5];
        let candles = Candles::new(&o, &h, &l, &c).unwrap();
        assert!(candles.body_gap_up(1, 0));
        assert!(!candles.gap_up(1, 0));
        assert!(!candles.body_gap_down(1, 0));
    }

    #[test]
    fn equal_tolerance_uses_recent_ranges() {
        let o = [10.0; 6];
        let h = [12.0; 6];
        let l = [10.0; 6];
        let c = [11.0; 6];
        let candles = Candles::new(&o, &h, &l, &c).unwrap();
        // range 2.0 * 0.05
        assert!((candles.equal(5) - 0.1).abs() < 1e-12);
        assert!(candles.equals(11.05, 11.0, 5));
        assert!(!candles.equals(11.2, 11.0, 5));
        assert!((candles.far(5) - 1.2).abs() < 1e-12);
    }

    #[test]
    fn averages_exclude_the_current_bar() {
        let o = [0.0, 0.0, 0.0];
        let c = [1.0, 3.0, 100.0];
        let h = [3.0, 3.0, 100.0];
        let l = [0.0, 0.0, 0.0];
        let candles = Candles::new(&o, &h, &l, &c).unwrap();
        assert_eq!(candles.avg_body(2), 2.0);
        assert_eq!(candles.avg_range(2), 3.0);
    }

    #[test]
    fn scan_zero_fills_history_and_mismatched_inputs() {
        let v = [1.0; 4];
        assert_eq!(scan(&v, &v, &v, &v, 2, |_, _| 100), vec![0, 0, 100, 100]);
        assert_eq!(scan(&v, &v[..3], &v, &v, 0, |_, _| 100), vec![0; 4]);
    }
}
