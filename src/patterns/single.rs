//! Single-bar recognizers: doji family, hammer family, marubozu variants, lines.

use super::candle::{AVG_PERIOD, Candles, scan};

pub fn doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        if c.body_doji(i) { 100 } else { 0 }
    })
}

pub fn dragonfly_doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_doji(i)
            && c.shadow_very_short(c.upper_shadow(i), i)
            && !c.shadow_very_short(c.lower_shadow(i), i);
        if hit { 100 } else { 0 }
    })
}

pub fn gravestone_doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_doji(i)
            && c.shadow_very_short(c.lower_shadow(i), i)
            && !c.shadow_very_short(c.upper_shadow(i), i);
        if hit { 100 } else { 0 }
    })
}

/// Small body with a long lower shadow and almost no upper shadow.
fn umbrella(c: &Candles, i: usize) -> bool {
    c.body_short(i) && c.shadow_long(c.lower_shadow(i), i) && c.shadow_very_short(c.upper_shadow(i), i)
}

/// Small body with a long upper shadow and almost no lower shadow.
fn inverted_umbrella(c: &Candles, i: usize) -> bool {
    c.body_short(i) && c.shadow_long(c.upper_shadow(i), i) && c.shadow_very_short(c.lower_shadow(i), i)
}

/// Umbrella whose body sits at or below the prior bar's low.
pub fn hammer(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = umbrella(c, i) && c.body_bottom(i) <= c.low(i - 1) + c.near(i - 1);
        if hit { 100 } else { 0 }
    })
}

/// Umbrella whose body sits at or above the prior bar's high.
pub fn hanging_man(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = umbrella(c, i) && c.body_bottom(i) >= c.high(i - 1) - c.near(i - 1);
        if hit { -100 } else { 0 }
    })
}

/// Inverted umbrella gapping down from the prior body.
pub fn inverted_hammer(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = inverted_umbrella(c, i) && c.body_top(i) < c.body_bottom(i - 1);
        if hit { 100 } else { 0 }
    })
}

/// Inverted umbrella gapping up from the prior body.
pub fn shooting_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = inverted_umbrella(c, i) && c.body_bottom(i) > c.body_top(i - 1);
        if hit { -100 } else { 0 }
    })
}

pub fn marubozu(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_long(i)
            && c.shadow_very_short(c.upper_shadow(i), i)
            && c.shadow_very_short(c.lower_shadow(i), i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

pub fn spinning_top(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_short(i)
            && c.upper_shadow(i) > c.body(i)
            && c.lower_shadow(i) > c.body(i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

pub fn long_legged_doji(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_doji(i)
            && (c.shadow_long(c.lower_shadow(i), i) || c.shadow_long(c.upper_shadow(i), i));
        if hit { 100 } else { 0 }
    })
}

/// Long-legged doji whose body sits near the middle of the range.
pub fn rickshaw_man(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let mid = c.low(i) + c.range(i) / 2.0;
        let hit = c.body_doji(i)
            && c.shadow_long(c.lower_shadow(i), i)
            && c.shadow_long(c.upper_shadow(i), i)
            && c.body_bottom(i) <= mid + c.near(i)
            && c.body_top(i) >= mid - c.near(i);
        if hit { 100 } else { 0 }
    })
}

pub fn takuri(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_doji(i)
            && c.shadow_very_short(c.upper_shadow(i), i)
            && c.shadow_very_long(c.lower_shadow(i), i);
        if hit { 100 } else { 0 }
    })
}

/// Long body without a shadow on the closing side.
pub fn closing_marubozu(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let closing_shadow = if c.color(i) == 1 { c.upper_shadow(i) } else { c.lower_shadow(i) };
        let hit = c.body_long(i) && c.shadow_very_short(closing_shadow, i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

/// Long body without a shadow on the opening side.
pub fn belt_hold(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let opening_shadow = if c.color(i) == 1 { c.lower_shadow(i) } else { c.upper_shadow(i) };
        let hit = c.body_long(i) && c.shadow_very_short(opening_shadow, i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

pub fn long_line(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_long(i)
            && c.shadow_short(c.upper_shadow(i), i)
            && c.shadow_short(c.lower_shadow(i), i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

pub fn short_line(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_short(i)
            && c.shadow_short(c.upper_shadow(i), i)
            && c.shadow_short(c.lower_shadow(i), i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

pub fn high_wave(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD, |c, i| {
        let hit = c.body_short(i)
            && c.shadow_very_long(c.upper_shadow(i), i)
            && c.shadow_very_long(c.lower_shadow(i), i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}
