//! Candlestick pattern catalog.
//!
//! Every entry pairs a TA-Lib style identifier with its display labels and a
//! plain function pointer, so recognizers are looked up through a table built
//! once instead of by name at call time.

pub mod candle;
pub mod multi_bar;
pub mod single;
pub mod three_bar;
pub mod two_bar;

use crate::error::{AppError, Result};

/// Takes aligned open/high/low/close and returns one code per bar.
/// Negative is bearish and positive bullish: 100 for a clean match, 80 for a
/// relaxed engulfing or harami, 200 for a confirmed hikkake. 0 means nothing.
pub type Recognizer = fn(&[f64], &[f64], &[f64], &[f64]) -> Vec<i32>;

pub const PATTERN_GROUP: &str = "Pattern Recognition";

#[derive(Debug, Clone, Copy)]
pub struct PatternEntry {
    pub id: &'static str,
    pub group: &'static str,
    pub name: &'static str,
    pub recognizer: Recognizer,
}

impl PatternEntry {
    pub const fn new(id: &'static str, name: &'static str, recognizer: Recognizer) -> Self {
        Self {
            id,
            group: PATTERN_GROUP,
            name,
            recognizer,
        }
    }

    /// Header text used by reports, e.g. `Pattern Recognition: Doji (CDLDOJI)`.
    pub fn label(&self) -> String {
        format!("{}: {} ({})", self.group, self.name, self.id)
    }
}

const BUILTIN: &[PatternEntry] = &[
    PatternEntry::new("CDL2CROWS", "Two Crows", three_bar::two_crows),
    PatternEntry::new("CDL3BLACKCROWS", "Three Black Crows", three_bar::three_black_crows),
    PatternEntry::new("CDL3INSIDE", "Three Inside Up/Down", three_bar::three_inside),
    PatternEntry::new("CDL3LINESTRIKE", "Three-Line Strike", multi_bar::three_line_strike),
    PatternEntry::new("CDL3OUTSIDE", "Three Outside Up/Down", three_bar::three_outside),
    PatternEntry::new("CDL3STARSINSOUTH", "Three Stars In The South", three_bar::three_stars_in_south),
    PatternEntry::new("CDL3WHITESOLDIERS", "Three Advancing White Soldiers", three_bar::three_white_soldiers),
    PatternEntry::new("CDLABANDONEDBABY", "Abandoned Baby", three_bar::abandoned_baby),
    PatternEntry::new("CDLADVANCEBLOCK", "Advance Block", three_bar::advance_block),
    PatternEntry::new("CDLBELTHOLD", "Belt-hold", single::belt_hold),
    PatternEntry::new("CDLBREAKAWAY", "Breakaway", multi_bar::breakaway),
    PatternEntry::new("CDLCLOSINGMARUBOZU", "Closing Marubozu", single::closing_marubozu),
    PatternEntry::new("CDLCONCEALBABYSWALL", "Concealing Baby Swallow", multi_bar::concealing_baby_swallow),
    PatternEntry::new("CDLCOUNTERATTACK", "Counterattack", two_bar::counterattack),
    PatternEntry::new("CDLDARKCLOUDCOVER", "Dark Cloud Cover", two_bar::dark_cloud_cover),
    PatternEntry::new("CDLDOJI", "Doji", single::doji),
    PatternEntry::new("CDLDOJISTAR", "Doji Star", two_bar::doji_star),
    PatternEntry::new("CDLDRAGONFLYDOJI", "Dragonfly Doji", single::dragonfly_doji),
    PatternEntry::new("CDLENGULFING", "Engulfing Pattern", two_bar::engulfing),
    PatternEntry::new("CDLEVENINGDOJISTAR", "Evening Doji Star", three_bar::evening_doji_star),
    PatternEntry::new("CDLEVENINGSTAR", "Evening Star", three_bar::evening_star),
    PatternEntry::new("CDLGAPSIDESIDEWHITE", "Up/Down-gap side-by-side white lines", three_bar::gap_side_side_white),
    PatternEntry::new("CDLGRAVESTONEDOJI", "Gravestone Doji", single::gravestone_doji),
    PatternEntry::new("CDLHAMMER", "Hammer", single::hammer),
    PatternEntry::new("CDLHANGINGMAN", "Hanging Man", single::hanging_man),
    PatternEntry::new("CDLHARAMI", "Harami Pattern", two_bar::harami),
    PatternEntry::new("CDLHARAMICROSS", "Harami Cross Pattern", two_bar::harami_cross),
    PatternEntry::new("CDLHIGHWAVE", "High-Wave Candle", single::high_wave),
    PatternEntry::new("CDLHIKKAKE", "Hikkake Pattern", multi_bar::hikkake),
    PatternEntry::new("CDLHIKKAKEMOD", "Modified Hikkake Pattern", multi_bar::hikkake_mod),
    PatternEntry::new("CDLHOMINGPIGEON", "Homing Pigeon", two_bar::homing_pigeon),
    PatternEntry::new("CDLIDENTICAL3CROWS", "Identical Three Crows", three_bar::identical_three_crows),
    PatternEntry::new("CDLINNECK", "In-Neck Pattern", two_bar::in_neck),
    PatternEntry::new("CDLINVERTEDHAMMER", "Inverted Hammer", single::inverted_hammer),
    PatternEntry::new("CDLKICKING", "Kicking", two_bar::kicking),
    PatternEntry::new(
        "CDLKICKINGBYLENGTH",
        "Kicking - bull/bear determined by the longer marubozu",
        two_bar::kicking_by_length,
    ),
    PatternEntry::new("CDLLADDERBOTTOM", "Ladder Bottom", multi_bar::ladder_bottom),
    PatternEntry::new("CDLLONGLEGGEDDOJI", "Long Legged Doji", single::long_legged_doji),
    PatternEntry::new("CDLLONGLINE", "Long Line Candle", single::long_line),
    PatternEntry::new("CDLMARUBOZU", "Marubozu", single::marubozu),
    PatternEntry::new("CDLMATCHINGLOW", "Matching Low", two_bar::matching_low),
    PatternEntry::new("CDLMATHOLD", "Mat Hold", multi_bar::mat_hold),
    PatternEntry::new("CDLMORNINGDOJISTAR", "Morning Doji Star", three_bar::morning_doji_star),
    PatternEntry::new("CDLMORNINGSTAR", "Morning Star", three_bar::morning_star),
    PatternEntry::new("CDLONNECK", "On-Neck Pattern", two_bar::on_neck),
    PatternEntry::new("CDLPIERCING", "Piercing Pattern", two_bar::piercing),
    PatternEntry::new("CDLRICKSHAWMAN", "Rickshaw Man", single::rickshaw_man),
    PatternEntry::new("CDLRISEFALL3METHODS", "Rising/Falling Three Methods", multi_bar::rise_fall_three_methods),
    PatternEntry::new("CDLSEPARATINGLINES", "Separating Lines", two_bar::separating_lines),
    PatternEntry::new("CDLSHOOTINGSTAR", "Shooting Star", single::shooting_star),
    PatternEntry::new("CDLSHORTLINE", "Short Line Candle", single::short_line),
    PatternEntry::new("CDLSPINNINGTOP", "Spinning Top", single::spinning_top),
    PatternEntry::new("CDLSTALLEDPATTERN", "Stalled Pattern", three_bar::stalled_pattern),
    PatternEntry::new("CDLSTICKSANDWICH", "Stick Sandwich", three_bar::stick_sandwich),
    PatternEntry::new(
        "CDLTAKURI",
        "Takuri (Dragonfly Doji with very long lower shadow)",
        single::takuri,
    ),
    PatternEntry::new("CDLTASUKIGAP", "Tasuki Gap", three_bar::tasuki_gap),
    PatternEntry::new("CDLTHRUSTING", "Thrusting Pattern", two_bar::thrusting),
    PatternEntry::new("CDLTRISTAR", "Tristar Pattern", three_bar::tristar),
    PatternEntry::new("CDLUNIQUE3RIVER", "Unique 3 River", three_bar::unique_three_river),
    PatternEntry::new("CDLUPSIDEGAP2CROWS", "Upside Gap Two Crows", three_bar::upside_gap_two_crows),
    PatternEntry::new("CDLXSIDEGAP3METHODS", "Upside/Downside Gap Three Methods", three_bar::xside_gap_three_methods),
];

/// Ordered, immutable set of patterns; its order is the report column order.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    entries: Vec<PatternEntry>,
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PatternCatalog {
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN.to_vec(),
        }
    }

    pub fn from_entries(entries: Vec<PatternEntry>) -> Self {
        Self { entries }
    }

    /// Keeps only the listed ids, in catalog order. Unknown ids are a configuration error.
    pub fn select<S: AsRef<str>>(&self, ids: &[S]) -> Result<Self> {
        if let Some(unknown) = ids.iter().find(|id| self.get(id.as_ref()).is_none()) {
            return Err(AppError::Config(format!(
                "unknown pattern '{}'",
                unknown.as_ref()
            )));
        }
        let entries = self
            .entries
            .iter()
            .filter(|e| ids.iter().any(|id| id.as_ref().eq_ignore_ascii_case(e.id)))
            .copied()
            .collect();
        Ok(Self { entries })
    }

    pub fn get(&self, id: &str) -> Option<&PatternEntry> {
        self.entries.iter().find(|e| e.id.eq_ignore_ascii_case(id))
    }

    pub fn entries(&self) -> &[PatternEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_ids_are_unique_and_grouped() {
        let catalog = PatternCatalog::builtin();
        let ids: HashSet<_> = catalog.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.entries().iter().all(|e| e.group == PATTERN_GROUP));
    }

    #[test]
    fn builtin_covers_the_whole_group_in_id_order() {
        let catalog = PatternCatalog::builtin();
        assert_eq!(catalog.len(), 61);
        let ids: Vec<_> = catalog.entries().iter().map(|e| e.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn select_finds_multi_bar_and_stateful_patterns() {
        let ids = ["CDLHIKKAKE", "CDL3INSIDE", "CDLBELTHOLD", "CDLLONGLEGGEDDOJI"];
        let catalog = PatternCatalog::builtin().select(&ids).unwrap();
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn every_recognizer_preserves_length() {
        let n = 40;
        let open: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin() * 3.0).collect();
        let close: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.9).cos() * 3.0).collect();
        let high: Vec<f64> = open.iter().zip(&close).map(|(o, c)| o.max(*c) + 0.5).collect();
        let low: Vec<f64> = open.iter().zip(&close).map(|(o, c)| o.min(*c) - 0.5).collect();
        for entry in PatternCatalog::builtin().entries() {
            let out = (entry.recognizer)(&open, &high, &low, &close);
            assert_eq!(out.len(), n, "{}", entry.id);
            assert!(
                out.iter().all(|v| [-200, -100, -80, 0, 80, 100, 200].contains(v)),
                "{}",
                entry.id
            );
        }
    }

    #[test]
    fn select_keeps_catalog_order() {
        let catalog = PatternCatalog::builtin()
            .select(&["CDLENGULFING", "cdldoji"])
            .unwrap();
        let ids: Vec<_> = catalog.entries().iter().map(|e| e.id).collect();
        assert_eq!(ids, ["CDLDOJI", "CDLENGULFING"]);
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let err = PatternCatalog::builtin().select(&["CDLNOPE"]).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn label_joins_group_and_name() {
        let entry = PatternCatalog::builtin().get("CDLHAMMER").copied().unwrap();
        assert_eq!(entry.label(), "Pattern Recognition: Hammer (CDLHAMMER)");
    }
}
