use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::content::kana::KanaPair;

pub const WRONG_PENALTY: u32 = 5;
pub const CORRECT_RELIEF: u32 = 1;
pub const BASE_WEIGHT: f64 = 1.0;
pub const WEIGHT_PER_ERROR: f64 = 3.0;

/// Persistent per-pair error weights driving weighted practice.
///
/// Serialized as a flat `{"<kana>|<romaji>": weight}` object. Loading is
/// per-entry best effort: malformed keys and non-integer values are dropped
/// and negative weights clamp to zero, so one bad entry never discards the
/// rest of the history.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, serde_json::Value>",
    into = "BTreeMap<String, u32>"
)]
pub struct ErrorStats {
    weights: BTreeMap<KanaPair, u32>,
}

impl From<BTreeMap<String, serde_json::Value>> for ErrorStats {
    fn from(raw: BTreeMap<String, serde_json::Value>) -> Self {
        let weights = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let pair = KanaPair::from_key(&key)?;
                let weight = value.as_i64()?.clamp(0, u32::MAX as i64) as u32;
                Some((pair, weight))
            })
            .collect();
        Self { weights }
    }
}

impl From<ErrorStats> for BTreeMap<String, u32> {
    fn from(stats: ErrorStats) -> Self {
        stats
            .weights
            .into_iter()
            .map(|(pair, weight)| (pair.key(), weight))
            .collect()
    }
}

impl ErrorStats {
    pub fn record_wrong(&mut self, pair: &KanaPair) {
        let weight = self.weights.entry(pair.clone()).or_default();
        *weight = weight.saturating_add(WRONG_PENALTY);
    }

    pub fn record_correct(&mut self, pair: &KanaPair) {
        let weight = self.weights.entry(pair.clone()).or_default();
        *weight = weight.saturating_sub(CORRECT_RELIEF);
    }

    pub fn weight(&self, pair: &KanaPair) -> u32 {
        self.weights.get(pair).copied().unwrap_or(0)
    }

    pub fn sampling_weight(&self, pair: &KanaPair) -> f64 {
        BASE_WEIGHT + self.weight(pair) as f64 * WEIGHT_PER_ERROR
    }

    pub fn reset(&mut self) {
        self.weights.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Pairs with a positive weight, heaviest first.
    pub fn hardest(&self, limit: usize) -> Vec<(KanaPair, u32)> {
        let mut hard: Vec<(KanaPair, u32)> = self
            .weights
            .iter()
            .filter(|(_, w)| **w > 0)
            .map(|(p, w)| (p.clone(), *w))
            .collect();
        hard.sort_by(|a, b| b.1.cmp(&a.1));
        hard.truncate(limit);
        hard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(kana: &str, romaji: &str) -> KanaPair {
        KanaPair::new(kana, romaji)
    }

    #[test]
    fn test_unknown_pair_has_base_weight() {
        let stats = ErrorStats::default();
        assert_eq!(stats.weight(&pair("あ", "a")), 0);
        assert_eq!(stats.sampling_weight(&pair("あ", "a")), 1.0);
    }

    #[test]
    fn test_wrong_adds_five_correct_removes_one() {
        let mut stats = ErrorStats::default();
        let a = pair("あ", "a");
        stats.record_wrong(&a);
        assert_eq!(stats.weight(&a), 5);
        stats.record_correct(&a);
        assert_eq!(stats.weight(&a), 4);
        assert_eq!(stats.sampling_weight(&a), 13.0);
    }

    #[test]
    fn test_weight_never_goes_below_zero() {
        let mut stats = ErrorStats::default();
        let a = pair("あ", "a");
        for _ in 0..10 {
            stats.record_correct(&a);
        }
        assert_eq!(stats.weight(&a), 0);

        // Mixed sequence: 2 wrong (10), 13 correct -> floored at 0 along the way.
        stats.record_wrong(&a);
        stats.record_wrong(&a);
        for _ in 0..13 {
            stats.record_correct(&a);
        }
        assert_eq!(stats.weight(&a), 0);
    }

    #[test]
    fn test_serializes_as_flat_key_map() {
        let mut stats = ErrorStats::default();
        stats.record_wrong(&pair("か", "ka"));
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json, serde_json::json!({"か|ka": 5}));
    }

    #[test]
    fn test_load_skips_bad_entries() {
        let json = r#"{"か|ka": 7, "broken": 3, "|x": 1, "き|ki": "lots", "く|ku": -4}"#;
        let stats: ErrorStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.weight(&pair("か", "ka")), 7);
        assert_eq!(stats.weight(&pair("く", "ku")), 0);
    }

    #[test]
    fn test_hardest_orders_by_weight() {
        let mut stats = ErrorStats::default();
        stats.record_wrong(&pair("あ", "a"));
        stats.record_wrong(&pair("い", "i"));
        stats.record_wrong(&pair("い", "i"));
        stats.record_correct(&pair("う", "u"));
        let hard = stats.hardest(5);
        assert_eq!(hard.len(), 2);
        assert_eq!(hard[0], (pair("い", "i"), 10));
        assert_eq!(hard[1], (pair("あ", "a"), 5));
    }
}
