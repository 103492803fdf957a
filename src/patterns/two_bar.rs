//! Two-bar recognizers.

use super::candle::{AVG_PERIOD, Candles, NEAR_PERIOD, scan};

/// Share of the first body the reversal candle has to reclaim.
const PENETRATION: f64 = 0.5;

/// 100 when the second body strictly engulfs the first, 80 when one end is shared.
pub fn engulfing(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, 2, |c, i| {
        let p = i - 1;
        let bullish = c.color(i) == 1
            && c.color(p) == -1
            && ((c.close(i) >= c.open(p) && c.open(i) < c.close(p))
                || (c.close(i) > c.open(p) && c.open(i) <= c.close(p)));
        let bearish = c.color(i) == -1
            && c.color(p) == 1
            && ((c.open(i) >= c.close(p) && c.close(i) < c.open(p))
                || (c.open(i) > c.close(p) && c.close(i) <= c.open(p)));
        if !(bullish || bearish) {
            return 0;
        }
        let strict = c.open(i) != c.close(p) && c.close(i) != c.open(p);
        c.color(i) * if strict { 100 } else { 80 }
    })
}

/// Second body inside the first one's body.
/// 100 when strictly inside, 80 when one end is shared.
fn inside_strength(c: &Candles, i: usize) -> i32 {
    let p = i - 1;
    if c.body_top(i) < c.body_top(p) && c.body_bottom(i) > c.body_bottom(p) {
        100
    } else if c.body_top(i) <= c.body_top(p) && c.body_bottom(i) >= c.body_bottom(p) {
        80
    } else {
        0
    }
}

/// Long body followed by a short body inside it; the signal opposes the first candle.
pub fn harami(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        if c.body_long(p) && c.body_short(i) {
            -c.color(p) * inside_strength(c, i)
        } else {
            0
        }
    })
}

pub fn harami_cross(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        if c.body_long(p) && c.body_doji(i) {
            -c.color(p) * inside_strength(c, i)
        } else {
            0
        }
    })
}

pub fn piercing(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = c.color(p) == -1
            && c.body_long(p)
            && c.color(i) == 1
            && c.body_long(i)
            && c.open(i) < c.low(p)
            && c.close(i) < c.open(p)
            && c.close(i) > c.close(p) + c.body(p) * PENETRATION;
        if hit { 100 } else { 0 }
    })
}

pub fn dark_cloud_cover(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = c.color(p) == 1
            && c.body_long(p)
            && c.color(i) == -1
            && c.open(i) > c.high(p)
            && c.close(i) > c.open(p)
            && c.close(i) < c.close(p) - c.body(p) * PENETRATION;
        if hit { -100 } else { 0 }
    })
}

/// Doji whose body gaps away from a long body in the direction of that body.
pub fn doji_star(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let gapped = (c.color(p) == 1 && c.body_gap_up(i, p))
            || (c.color(p) == -1 && c.body_gap_down(i, p));
        if c.body_long(p) && c.body_doji(i) && gapped {
            -c.color(p) * 100
        } else {
            0
        }
    })
}

/// Two long opposite bodies closing at the same level.
pub fn counterattack(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = c.color(p) == -c.color(i)
            && c.body_long(p)
            && c.body_long(i)
            && c.equals(c.close(i), c.close(p), p);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

/// Long black candle, then a white one opening below its low.
fn opens_below_long_black(c: &Candles, i: usize) -> bool {
    let p = i - 1;
    c.color(p) == -1 && c.body_long(p) && c.color(i) == 1 && c.open(i) < c.low(p)
}

pub fn in_neck(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = opens_below_long_black(c, i)
            && c.close(i) <= c.close(p) + c.equal(p)
            && c.close(i) >= c.close(p);
        if hit { -100 } else { 0 }
    })
}

pub fn on_neck(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = opens_below_long_black(c, i) && c.equals(c.close(i), c.low(p), p);
        if hit { -100 } else { 0 }
    })
}

pub fn thrusting(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = opens_below_long_black(c, i)
            && c.close(i) > c.close(p) + c.equal(p)
            && c.close(i) <= c.close(p) + c.body(p) * PENETRATION;
        if hit { -100 } else { 0 }
    })
}

/// Opposite-colored marubozu pair separated by a full candle gap.
fn kicking_pair(c: &Candles, i: usize) -> bool {
    let p = i - 1;
    let marubozu = |k: usize| {
        c.body_long(k)
            && c.shadow_very_short(c.upper_shadow(k), k)
            && c.shadow_very_short(c.lower_shadow(k), k)
    };
    c.color(p) == -c.color(i)
        && marubozu(p)
        && marubozu(i)
        && ((c.color(p) == -1 && c.gap_up(i, p)) || (c.color(p) == 1 && c.gap_down(i, p)))
}

pub fn kicking(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        if kicking_pair(c, i) { c.color(i) * 100 } else { 0 }
    })
}

/// Kicking, with the direction taken from the longer marubozu.
pub fn kicking_by_length(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        if !kicking_pair(c, i) {
            return 0;
        }
        let longer = if c.body(i) > c.body(i - 1) { i } else { i - 1 };
        c.color(longer) * 100
    })
}

pub fn matching_low(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, NEAR_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = c.color(p) == -1 && c.color(i) == -1 && c.equals(c.close(i), c.close(p), p);
        if hit { 100 } else { 0 }
    })
}

/// Short black body inside a long black body.
pub fn homing_pigeon(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let hit = c.color(p) == -1
            && c.color(i) == -1
            && c.body_long(p)
            && c.body_short(i)
            && c.open(i) < c.open(p)
            && c.close(i) > c.close(p);
        if hit { 100 } else { 0 }
    })
}

/// Opposite colors opening at the same price; the second is a belt hold.
pub fn separating_lines(open: &[f64], high: &[f64], low: &[f64], close: &[f64]) -> Vec<i32> {
    scan(open, high, low, close, AVG_PERIOD + 1, |c, i| {
        let p = i - 1;
        let opening_shadow = if c.color(i) == 1 { c.lower_shadow(i) } else { c.upper_shadow(i) };
        let hit = c.color(p) == -c.color(i)
            && c.equals(c.open(i), c.open(p), p)
            && c.body_long(i)
            && c.shadow_very_short(opening_shadow, i);
        if hit { c.color(i) * 100 } else { 0 }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ten small bars (body 0.2, range 1.0) around 10.0, then `tail`.
    fn with_tail(tail: &[(f64, f64, f64, f64)]) -> [Vec<f64>; 4] {
        let mut o = vec![10.0; 10];
        let mut h = vec![10.5; 10];
        let mut l = vec![9.5; 10];
        let mut c = vec![10.2; 10];
        for &(bo, bh, bl, bc) in tail {
            o.push(bo);
            h.push(bh);
            l.push(bl);
            c.push(bc);
        }
        [o, h, l, c]
    }

    #[test]
    fn bullish_and_bearish_engulfing() {
        let [o, h, l, c] = with_tail(&[(10.5, 10.6, 9.8, 10.0), (9.9, 10.8, 9.8, 10.7)]);
        assert_eq!(engulfing(&o, &h, &l, &c)[11], 100);

        let [o, h, l, c] = with_tail(&[(10.0, 10.6, 9.9, 10.5), (10.6, 10.7, 9.8, 9.9)]);
        assert_eq!(engulfing(&o, &h, &l, &c)[11], -100);
    }

    #[test]
    fn engulfing_with_a_shared_end_is_weaker() {
        // opens exactly at the prior close
        let [o, h, l, c] = with_tail(&[(10.5, 10.6, 9.8, 10.0), (10.0, 10.8, 9.9, 10.7)]);
        assert_eq!(engulfing(&o, &h, &l, &c)[11], 80);
    }

    #[test]
    fn harami_opposes_the_mother_candle() {
        let [o, h, l, c] = with_tail(&[(12.0, 12.1, 9.9, 10.0), (10.8, 11.0, 10.6, 11.0)]);
        assert_eq!(harami(&o, &h, &l, &c)[11], 100);
        assert_eq!(harami_cross(&o, &h, &l, &c)[11], 0);
    }

    #[test]
    fn harami_cross_has_a_doji_inside() {
        let [o, h, l, c] = with_tail(&[(10.0, 12.1, 9.9, 12.0), (11.0, 11.2, 10.8, 11.0)]);
        assert_eq!(harami_cross(&o, &h, &l, &c)[11], -100);
    }

    #[test]
    fn piercing_reclaims_half_the_black_body() {
        let [o, h, l, c] = with_tail(&[(11.0, 11.1, 9.9, 10.0), (9.8, 10.7, 9.7, 10.6)]);
        assert_eq!(piercing(&o, &h, &l, &c)[11], 100);
        assert_eq!(dark_cloud_cover(&o, &h, &l, &c)[11], 0);
    }

    #[test]
    fn dark_cloud_cover_gives_back_half_the_white_body() {
        let [o, h, l, c] = with_tail(&[(10.0, 11.1, 9.9, 11.0), (11.2, 11.3, 10.3, 10.4)]);
        assert_eq!(dark_cloud_cover(&o, &h, &l, &c)[11], -100);
    }

    #[test]
    fn doji_star_gaps_with_the_trend() {
        let [o, h, l, c] = with_tail(&[(10.0, 11.1, 9.9, 11.0), (11.3, 11.5, 11.2, 11.3)]);
        assert_eq!(doji_star(&o, &h, &l, &c)[11], -100);
        // same doji without the gap
        let [o, h, l, c] = with_tail(&[(10.0, 11.1, 9.9, 11.0), (10.9, 11.1, 10.8, 10.9)]);
        assert_eq!(doji_star(&o, &h, &l, &c)[11], 0);
    }

    #[test]
    fn counterattack_closes_meet() {
        let [o, h, l, c] = with_tail(&[(11.0, 11.1, 9.9, 10.0), (9.0, 10.1, 8.9, 10.01)]);
        assert_eq!(counterattack(&o, &h, &l, &c)[11], 100);
    }

    #[test]
    fn neck_patterns_differ_by_close() {
        // long black 11.0 -> 10.0, low 9.9
        let black = (11.0, 11.1, 9.9, 10.0);
        let [o, h, l, c] = with_tail(&[black, (9.5, 10.05, 9.4, 10.02)]);
        assert_eq!(in_neck(&o, &h, &l, &c)[11], -100);
        assert_eq!(thrusting(&o, &h, &l, &c)[11], 0);

        let [o, h, l, c] = with_tail(&[black, (9.5, 9.95, 9.4, 9.9)]);
        assert_eq!(on_neck(&o, &h, &l, &c)[11], -100);
        assert_eq!(in_neck(&o, &h, &l, &c)[11], 0);

        let [o, h, l, c] = with_tail(&[black, (9.5, 10.4, 9.4, 10.4)]);
        assert_eq!(thrusting(&o, &h, &l, &c)[11], -100);
    }

    #[test]
    fn kicking_marubozu_pair_gaps_up() {
        let [o, h, l, c] = with_tail(&[(11.0, 11.0, 10.0, 10.0), (11.5, 13.0, 11.5, 13.0)]);
        assert_eq!(kicking(&o, &h, &l, &c)[11], 100);
        assert_eq!(kicking_by_length(&o, &h, &l, &c)[11], 100);
    }

    #[test]
    fn kicking_by_length_follows_the_longer_body() {
        let [o, h, l, c] = with_tail(&[(13.0, 13.0, 10.0, 10.0), (10.5, 11.5, 10.5, 11.5)]);
        assert_eq!(kicking(&o, &h, &l, &c)[11], 0);

        let [o, h, l, c] = with_tail(&[(10.0, 13.0, 10.0, 13.0), (9.5, 9.5, 8.5, 8.5)]);
        assert_eq!(kicking(&o, &h, &l, &c)[11], -100);
        assert_eq!(kicking_by_length(&o, &h, &l, &c)[11], 100);
    }

    #[test]
    fn matching_low_and_homing_pigeon() {
        let [o, h, l, c] = with_tail(&[(10.8, 10.9, 9.9, 10.0), (10.3, 10.4, 9.95, 10.0)]);
        assert_eq!(matching_low(&o, &h, &l, &c)[11], 100);

        let [o, h, l, c] = with_tail(&[(11.0, 11.1, 9.9, 10.0), (10.6, 10.7, 10.3, 10.4)]);
        assert_eq!(homing_pigeon(&o, &h, &l, &c)[11], 100);
    }

    #[test]
    fn separating_lines_open_together() {
        let [o, h, l, c] = with_tail(&[(10.0, 10.1, 9.4, 9.5), (10.0, 11.2, 10.0, 11.0)]);
        assert_eq!(separating_lines(&o, &h, &l, &c)[11], 100);
    }

    #[test]
    fn quiet_market_fires_nothing() {
        let [o, h, l, c] = with_tail(&[]);
        for out in [
            engulfing(&o, &h, &l, &c),
            harami(&o, &h, &l, &c),
            counterattack(&o, &h, &l, &c),
            kicking(&o, &h, &l, &c),
        ] {
            assert_eq!(out.len(), 10);
            assert!(out.iter().all(|&v| v == 0));
        }
    }
}
