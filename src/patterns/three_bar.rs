//! Three-bar recognizers: stars, soldiers and crows, inside/outside, gaps.
//!
//! The bars are called `first`, `second` and the current bar `i`.

use super::candle::{AVG_PERIOD, DOJI_FACTOR, NEAR_PERIOD, scan};

/// How far into the first body a star's third candle must close.
const STAR_PENETRATION: f64 = 0.3;

fn bars(i: usize) -> (usize, usize) {
    (i - 2, i - 1)
}

/// Long black, short star gapping below it, white closing well into the first body.
pub fn morning_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, star) = bars(i);
        let hit = c.color(first) == -1
            && c.body_long(first)
            && c.body_short(star)
            && c.body_gap_down(star, first)
            && c.color(i) == 1
            && !c.body_short(i)
            && c.close(i) > c.close(first) + c.body(first) * STAR_PENETRATION;
        if hit { 100 } else { 0 }
    })
}

pub fn evening_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, star) = bars(i);
        let hit = c.color(first) == 1
            && c.body_long(first)
            && c.body_short(star)
            && c.body_gap_up(star, first)
            && c.color(i) == -1
            && !c.body_short(i)
            && c.close(i) < c.close(first) - c.body(first) * STAR_PENETRATION;
        if hit { -100 } else { 0 }
    })
}

pub fn morning_doji_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, star) = bars(i);
        let hit = c.color(first) == -1
            && c.body_long(first)
            && c.body_doji(star)
            && c.body_gap_down(star, first)
            && c.color(i) == 1
            && !c.body_short(i)
            && c.close(i) > c.close(first) + c.body(first) * STAR_PENETRATION;
        if hit { 100 } else { 0 }
    })
}

pub fn evening_doji_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, star) = bars(i);
        let hit = c.color(first) == 1
            && c.body_long(first)
            && c.body_doji(star)
            && c.body_gap_up(star, first)
            && c.color(i) == -1
            && !c.body_short(i)
            && c.close(i) < c.close(first) - c.body(first) * STAR_PENETRATION;
        if hit { -100 } else { 0 }
    })
}

/// Doji star whose shadows also gap away from both neighbours.
pub fn abandoned_baby(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, star) = bars(i);
        if !(c.body_long(first) && c.body_doji(star) && !c.body_short(i)) {
            return 0;
        }
        let penetration = c.body(first) * STAR_PENETRATION;
        if c.color(first) == 1
            && c.color(i) == -1
            && c.close(i) < c.close(first) - penetration
            && c.gap_up(star, first)
            && c.gap_down(i, star)
        {
            -100
        } else if c.color(first) == -1
            && c.color(i) == 1
            && c.close(i) > c.close(first) + penetration
            && c.gap_down(star, first)
            && c.gap_up(i, star)
        {
            100
        } else {
            0
        }
    })
}

pub fn three_white_soldiers(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let hit = (i - 2..=i).all(|k| c.is_white(k) && c.shadow_very_short(c.upper_shadow(k), k))
            && (i - 1..=i).all(|k| {
                c.close(k) > c.close(k - 1) && c.open(k) > c.open(k - 1) && c.open(k) <= c.close(k - 1)
            });
        if hit { 100 } else { 0 }
    })
}

pub fn three_black_crows(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let hit = (i - 2..=i).all(|k| c.is_black(k) && c.shadow_very_short(c.lower_shadow(k), k))
            && (i - 1..=i).all(|k| {
                c.close(k) < c.close(k - 1) && c.open(k) < c.open(k - 1) && c.open(k) >= c.close(k - 1)
            });
        if hit { -100 } else { 0 }
    })
}

/// Three crows where every open sits at the prior close.
pub fn identical_three_crows(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = (first..=i).all(|k| c.color(k) == -1 && c.shadow_very_short(c.lower_shadow(k), k))
            && c.close(first) > c.close(second)
            && c.close(second) > c.close(i)
            && c.equals(c.open(second), c.close(first), first)
            && c.equals(c.open(i), c.close(second), second);
        if hit { -100 } else { 0 }
    })
}

pub fn two_crows(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = c.color(first) == 1
            && c.body_long(first)
            && c.color(second) == -1
            && c.body_gap_up(second, first)
            && c.color(i) == -1
            && c.open(i) < c.open(second)
            && c.open(i) > c.close(second)
            && c.close(i) > c.open(first)
            && c.close(i) < c.close(first);
        if hit { -100 } else { 0 }
    })
}

pub fn upside_gap_two_crows(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = c.color(first) == 1
            && c.body_long(first)
            && c.color(second) == -1
            && c.body_short(second)
            && c.body_gap_up(second, first)
            && c.color(i) == -1
            && c.open(i) > c.open(second)
            && c.close(i) < c.close(second)
            && c.close(i) > c.close(first);
        if hit { -100 } else { 0 }
    })
}

/// Harami confirmed by a third candle closing beyond the first open.
pub fn three_inside(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let harami = c.body_long(first)
            && c.body_short(second)
            && c.body_top(second) < c.body_top(first)
            && c.body_bottom(second) > c.body_bottom(first);
        let confirmed = (c.color(first) == 1 && c.color(i) == -1 && c.close(i) < c.open(first))
            || (c.color(first) == -1 && c.color(i) == 1 && c.close(i) > c.open(first));
        if harami && confirmed { -c.color(first) * 100 } else { 0 }
    })
}

/// Engulfing confirmed by a third close further in the same direction.
pub fn three_outside(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, 2, |c, i| {
        let (first, second) = bars(i);
        if c.color(second) == 1
            && c.color(first) == -1
            && c.close(second) > c.open(first)
            && c.open(second) < c.close(first)
            && c.close(i) > c.close(second)
        {
            100
        } else if c.color(second) == -1
            && c.color(first) == 1
            && c.open(second) > c.close(first)
            && c.close(second) < c.open(first)
            && c.close(i) < c.close(second)
        {
            -100
        } else {
            0
        }
    })
}

pub fn three_stars_in_south(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = (first..=i).all(|k| c.color(k) == -1)
            && c.body_long(first)
            && c.shadow_long(c.lower_shadow(first), first)
            // smaller, opens inside the first range, holds above its low
            && c.body(second) < c.body(first)
            && c.open(second) > c.close(first)
            && c.open(second) <= c.high(first)
            && c.low(second) < c.close(first)
            && c.low(second) >= c.low(first)
            && !c.shadow_very_short(c.lower_shadow(second), second)
            // small marubozu inside the second range
            && c.body_short(i)
            && c.shadow_very_short(c.lower_shadow(i), i)
            && c.shadow_very_short(c.upper_shadow(i), i)
            && c.low(i) > c.low(second)
            && c.high(i) < c.high(second);
        if hit { 100 } else { 0 }
    })
}

/// Three rising white candles that lose strength.
pub fn advance_block(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let advancing = (first..=i).all(|k| c.color(k) == 1)
            && c.close(i) > c.close(second)
            && c.close(second) > c.close(first)
            && c.open(second) > c.open(first)
            && c.open(second) <= c.close(first) + c.near(first)
            && c.open(i) > c.open(second)
            && c.open(i) <= c.close(second) + c.near(second)
            && c.body_long(first)
            && c.shadow_short(c.upper_shadow(first), first);
        if !advancing {
            return 0;
        }
        let (b1, b2, b3) = (c.body(first), c.body(second), c.body(i));
        let weakening = (b2 <= b1 - c.far(first) && b3 < b2 + c.near(second))
            || b3 < b2 - c.far(second)
            || (b3 < b2
                && b2 < b1
                && (c.upper_shadow(i) > c.avg_shadow(i) || c.upper_shadow(second) > c.avg_shadow(second)))
            || (b3 < b2 && c.shadow_long(c.upper_shadow(i), i));
        if weakening { -100 } else { 0 }
    })
}

/// Two strong white candles, then a small one riding on the second's shoulder.
pub fn stalled_pattern(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = (first..=i).all(|k| c.color(k) == 1)
            && c.close(i) > c.close(second)
            && c.close(second) > c.close(first)
            && c.body_long(first)
            && c.body_long(second)
            && c.shadow_very_short(c.upper_shadow(second), second)
            && c.open(second) > c.open(first)
            && c.open(second) <= c.close(first) + c.near(first)
            && c.body_short(i)
            && c.open(i) >= c.close(second) - c.body(i) - c.near(second);
        if hit { -100 } else { 0 }
    })
}

pub fn stick_sandwich(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, NEAR_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = c.color(first) == -1
            && c.color(second) == 1
            && c.color(i) == -1
            && c.low(second) > c.close(first)
            && c.equals(c.close(i), c.close(first), first);
        if hit { 100 } else { 0 }
    })
}

pub fn tasuki_gap(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, NEAR_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let similar = (c.body(second) - c.body(i)).abs() < c.near(second);
        if !similar {
            return 0;
        }
        if c.body_gap_up(second, first)
            && c.color(second) == 1
            && c.color(i) == -1
            && c.open(i) < c.close(second)
            && c.open(i) > c.open(second)
            && c.close(i) < c.open(second)
            && c.close(i) > c.body_top(first)
        {
            100
        } else if c.body_gap_down(second, first)
            && c.color(second) == -1
            && c.color(i) == 1
            && c.open(i) < c.open(second)
            && c.open(i) > c.close(second)
            && c.close(i) > c.open(second)
            && c.close(i) < c.body_bottom(first)
        {
            -100
        } else {
            0
        }
    })
}

/// Two similar white candles side by side after a gap.
pub fn gap_side_side_white(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, NEAR_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let up = c.body_gap_up(second, first) && c.body_gap_up(i, first);
        let down = c.body_gap_down(second, first) && c.body_gap_down(i, first);
        let hit = (up || down)
            && c.color(second) == 1
            && c.color(i) == 1
            && (c.body(i) - c.body(second)).abs() <= c.near(second)
            && c.equals(c.open(i), c.open(second), second);
        match (hit, up) {
            (true, true) => 100,
            (true, false) => -100,
            _ => 0,
        }
    })
}

/// Three dojis measured against the range average before the first one.
pub fn tristar(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let doji = |k: usize| c.body(k) <= c.avg_range(first) * DOJI_FACTOR;
        if !(doji(first) && doji(second) && doji(i)) {
            return 0;
        }
        if c.body_gap_up(second, first) && c.body_top(i) < c.body_top(second) {
            -100
        } else if c.body_gap_down(second, first) && c.body_bottom(i) > c.body_bottom(second) {
            100
        } else {
            0
        }
    })
}

pub fn unique_three_river(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 2, |c, i| {
        let (first, second) = bars(i);
        let hit = c.color(first) == -1
            && c.body_long(first)
            && c.color(second) == -1
            && c.close(second) > c.close(first)
            && c.open(second) <= c.open(first)
            && c.low(second) < c.low(first)
            && c.color(i) == 1
            && c.body_short(i)
            && c.open(i) > c.low(second);
        if hit { 100 } else { 0 }
    })
}

/// Gap between two same-colored candles, filled by an opposite third.
pub fn xside_gap_three_methods(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, 2, |c, i| {
        let (first, second) = bars(i);
        let within = |v: f64, k: usize| v < c.body_top(k) && v > c.body_bottom(k);
        let gapped = (c.color(first) == 1 && c.body_gap_up(second, first))
            || (c.color(first) == -1 && c.body_gap_down(second, first));
        let hit = c.color(first) == c.color(second)
            && c.color(i) == -c.color(second)
            && within(c.open(i), second)
            && within(c.close(i), first)
            && gapped;
        if hit { c.color(first) * 100 } else { 0 }
    })
}
