//! Four- and five-bar recognizers, plus the stateful hikkake pair.

use super::candle::{AVG_PERIOD, Candles, NEAR_PERIOD, scan};

const MAT_HOLD_PENETRATION: f64 = 0.5;
/// Bars after a hikkake setup during which a breakout still confirms it.
const HIKKAKE_WINDOW: usize = 3;
const HIKKAKE_LOOKBACK: usize = 5;
const HIKKAKE_MOD_LOOKBACK: usize = NEAR_PERIOD + 5;

fn opens_near_body(c: &Candles, i: usize, p: usize) -> bool {
    c.open(i) >= c.body_bottom(p) - c.near(p) && c.open(i) <= c.body_top(p) + c.near(p)
}

/// Three same-colored candles wiped out by a fourth; the signal follows the three.
pub fn three_line_strike(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, NEAR_PERIOD + 3, |c, i| {
        let (a, b, d) = (i - 3, i - 2, i - 1);
        let color = c.color(d);
        if !(c.color(a) == color && c.color(b) == color && c.color(i) == -color) {
            return 0;
        }
        if !(opens_near_body(c, b, a) && opens_near_body(c, d, b)) {
            return 0;
        }
        let hit = if color == 1 {
            c.close(d) > c.close(b) && c.close(b) > c.close(a) && c.open(i) > c.close(d) && c.close(i) < c.open(a)
        } else {
            c.close(d) < c.close(b) && c.close(b) < c.close(a) && c.open(i) < c.close(d) && c.close(i) > c.open(a)
        };
        if hit { color * 100 } else { 0 }
    })
}

pub fn breakaway(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 4, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let color = c.color(first);
        let shape = c.body_long(first)
            && c.color(second) == color
            && c.color(fourth) == color
            && c.color(i) == -color;
        if !shape {
            return 0;
        }
        if color == -1
            && c.body_gap_down(second, first)
            && c.high(third) < c.high(second)
            && c.low(third) < c.low(second)
            && c.high(fourth) < c.high(third)
            && c.low(fourth) < c.low(third)
            && c.close(i) > c.open(second)
            && c.close(i) < c.close(first)
        {
            100
        } else if color == 1
            && c.body_gap_up(second, first)
            && c.high(third) > c.high(second)
            && c.low(third) > c.low(second)
            && c.high(fourth) > c.high(third)
            && c.low(fourth) > c.low(third)
            && c.close(i) < c.open(second)
            && c.close(i) > c.close(first)
        {
            -100
        } else {
            0
        }
    })
}

/// Two black marubozu, a gapping black with an upper shadow, then an engulfing black.
pub fn concealing_baby_swallow(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 3, |c, i| {
        let (first, second, third) = (i - 3, i - 2, i - 1);
        let marubozu = |k: usize| {
            c.shadow_very_short(c.lower_shadow(k), k) && c.shadow_very_short(c.upper_shadow(k), k)
        };
        let hit = (first..=i).all(|k| c.color(k) == -1)
            && marubozu(first)
            && marubozu(second)
            && c.body_gap_down(third, second)
            && !c.shadow_very_short(c.upper_shadow(third), third)
            && c.high(third) > c.close(second)
            && c.high(i) > c.high(third)
            && c.low(i) < c.low(third);
        if hit { 100 } else { 0 }
    })
}

/// Three falling black candles, a black with an upper shadow, then a white breakout.
pub fn ladder_bottom(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 4, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let hit = (first..=fourth).all(|k| c.color(k) == -1)
            && c.open(first) > c.open(second)
            && c.open(second) > c.open(third)
            && c.close(first) > c.close(second)
            && c.close(second) > c.close(third)
            && !c.shadow_very_short(c.upper_shadow(fourth), fourth)
            && c.color(i) == 1
            && c.open(i) > c.open(fourth)
            && c.close(i) > c.high(fourth);
        if hit { 100 } else { 0 }
    })
}

pub fn mat_hold(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 4, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let floor = c.close(first) - c.body(first) * MAT_HOLD_PENETRATION;
        let hit = c.body_long(first)
            && (second..=fourth).all(|k| c.body_short(k))
            && c.color(first) == 1
            && c.color(second) == -1
            && c.color(i) == 1
            && c.body_gap_up(second, first)
            // reaction days dip into the first body, but not too far
            && c.body_bottom(third) < c.close(first)
            && c.body_bottom(fourth) < c.close(first)
            && c.body_bottom(third) > floor
            && c.body_bottom(fourth) > floor
            && c.body_top(third) < c.open(second)
            && c.body_top(fourth) < c.body_top(third)
            && c.open(i) > c.close(fourth)
            && c.close(i) > c.high(second).max(c.high(third)).max(c.high(fourth));
        if hit { 100 } else { 0 }
    })
}

pub fn rise_fall_three_methods(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 4, |c, i| {
        let (first, second, third, fourth) = (i - 4, i - 3, i - 2, i - 1);
        let color = c.color(first);
        let dir = f64::from(color);
        let hit = c.body_long(first)
            && (second..=fourth).all(|k| c.body_short(k))
            && c.body_long(i)
            && (second..=fourth).all(|k| c.color(k) == -color)
            && c.color(i) == color
            // the reaction stays inside the first range
            && (second..=fourth).all(|k| c.body_bottom(k) < c.high(first) && c.body_top(k) > c.low(first))
            && c.close(third) * dir < c.close(second) * dir
            && c.close(fourth) * dir < c.close(third) * dir
            && c.open(i) * dir > c.close(fourth) * dir
            && c.close(i) * dir > c.close(first) * dir;
        if hit { color * 100 } else { 0 }
    })
}

/// Walks the series keeping the latest hikkake setup alive for a few bars.
/// Setups yield ±100, a close beyond the bar before the setup confirms it with ±200.
fn track_hikkake(
    open: &[f64],
    high: &[f64],
    low: &[f64],
    close: &[f64],
    lookback: usize,
    setup: impl Fn(&Candles, usize) -> Option<i32>,
) -> Vec<i32> {
    let mut out = vec![0; open.len()];
    let Some(c) = Candles::new(open, high, low, close) else {
        return out;
    };
    let mut pending: Option<(usize, i32)> = None;
    for i in lookback.saturating_sub(HIKKAKE_WINDOW).max(2)..c.len() {
        let code = if let Some(dir) = setup(&c, i) {
            pending = Some((i, dir));
            dir * 100
        } else if let Some((at, dir)) = pending {
            let broke = (dir > 0 && c.close(i) > c.high(at - 1)) || (dir < 0 && c.close(i) < c.low(at - 1));
            if i <= at + HIKKAKE_WINDOW && broke {
                pending = None;
                dir * 200
            } else {
                0
            }
        } else {
            0
        };
        if i >= lookback {
            out[i] = code;
        }
    }
    out
}

fn inside(c: &Candles, i: usize, p: usize) -> bool {
    c.high(i) < c.high(p) && c.low(i) > c.low(p)
}

/// Direction of a false breakout of bar `i - 1` by bar `i`.
fn false_breakout(c: &Candles, i: usize) -> Option<i32> {
    let p = i - 1;
    if c.high(i) < c.high(p) && c.low(i) < c.low(p) {
        Some(1)
    } else if c.high(i) > c.high(p) && c.low(i) > c.low(p) {
        Some(-1)
    } else {
        None
    }
}

pub fn hikkake(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    track_hikkake(open, high, low, close, HIKKAKE_LOOKBACK, |c, i| {
        if inside(c, i - 1, i - 2) { false_breakout(c, i) } else { None }
    })
}

/// Hikkake after two nested inside bars, the first of which closed near its extreme.
pub fn hikkake_mod(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    track_hikkake(open, high, low, close, HIKKAKE_MOD_LOOKBACK, |c, i| {
        let nested = i >= 3 && inside(c, i - 2, i - 3) && inside(c, i - 1, i - 2);
        if !nested {
            return None;
        }
        let k = i - 2;
        match false_breakout(c, i)? {
            1 if c.close(k) <= c.low(k) + c.near(k) => Some(1),
            -1 if c.close(k) >= c.high(k) - c.near(k) => Some(-1),
            _ => None,
        }
    })
}
