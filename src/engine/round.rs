use std::collections::HashMap;

use crate::content::kana::KanaPair;
use crate::engine::settings::QuizSettings;

/// State of one alphabet round: the full pool (each enabled pair repeated
/// `times_to_show` times), what is still unanswered, and per-pair miss counts
/// for the end-of-round summary.
#[derive(Clone, Debug)]
pub struct RoundState {
    distinct: Vec<KanaPair>,
    pool_size: usize,
    unanswered: Vec<KanaPair>,
    incorrect_marks: HashMap<KanaPair, u32>,
    pub correct_count: u32,
    pub retry_count: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    /// Distinct pairs never answered wrong this round.
    pub correct: usize,
    /// Distinct pairs answered wrong at least once.
    pub incorrect: usize,
    /// Pairs answered wrong more than once, in table order.
    pub hard: Vec<KanaPair>,
}

impl RoundSummary {
    pub fn is_clean(&self) -> bool {
        self.incorrect == 0
    }
}

/// Build a fresh round from a settings snapshot. Deterministic: the pool
/// is in table order and prompts are drawn from it at random.
pub fn rebuild_round(settings: &QuizSettings) -> RoundState {
    let distinct = settings.enabled_pairs();
    let times = settings.times_to_show.max(1) as usize;
    let unanswered: Vec<KanaPair> = distinct
        .iter()
        .flat_map(|pair| std::iter::repeat_n(pair.clone(), times))
        .collect();
    RoundState {
        pool_size: unanswered.len(),
        distinct,
        unanswered,
        incorrect_marks: HashMap::new(),
        correct_count: 0,
        retry_count: 0,
    }
}

impl RoundState {
    /// True when no pair is enabled; no prompt can be produced.
    pub fn is_empty_selection(&self) -> bool {
        self.distinct.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.is_empty_selection() && self.unanswered.is_empty()
    }

    pub fn unanswered(&self) -> &[KanaPair] {
        &self.unanswered
    }

    pub fn remaining(&self) -> usize {
        self.unanswered.len()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    pub fn distinct_pairs(&self) -> &[KanaPair] {
        &self.distinct
    }

    /// Count a correct answer and retire one occurrence of `pair`. Returns
    /// true when that was the pair's last occurrence in the round.
    pub fn record_correct(&mut self, pair: &KanaPair) -> bool {
        self.correct_count += 1;
        match self.unanswered.iter().position(|p| p == pair) {
            Some(idx) => {
                self.unanswered.remove(idx);
                !self.unanswered.contains(pair)
            }
            None => false,
        }
    }

    pub fn record_incorrect(&mut self, pair: &KanaPair) {
        self.retry_count += 1;
        *self.incorrect_marks.entry(pair.clone()).or_default() += 1;
    }

    pub fn incorrect_marks(&self, pair: &KanaPair) -> u32 {
        self.incorrect_marks.get(pair).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> RoundSummary {
        let mut correct = 0;
        let mut incorrect = 0;
        let mut hard = Vec::new();
        for pair in &self.distinct {
            let misses = self.incorrect_marks(pair);
            if misses == 0 {
                correct += 1;
            } else {
                incorrect += 1;
                if misses > 1 {
                    hard.push(pair.clone());
                }
            }
        }
        RoundSummary {
            correct,
            incorrect,
            hard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a_i_settings(times: u32) -> QuizSettings {
        let mut settings = QuizSettings::default();
        settings.katakana.enabled = false;
        settings.kanji.enabled = false;
        settings.hiragana.rows = vec![false; 16];
        settings.hiragana.rows[7] = true; // や ゆ よ
        settings.times_to_show = times;
        settings
    }

    fn pair(kana: &str, romaji: &str) -> KanaPair {
        KanaPair::new(kana, romaji)
    }

    #[test]
    fn test_pool_repeats_each_pair() {
        let round = rebuild_round(&a_i_settings(2));
        assert_eq!(round.pool_size(), 6);
        let ya = pair("や", "ya");
        assert_eq!(round.unanswered().iter().filter(|p| **p == ya).count(), 2);
        assert!(!round.is_complete());
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let settings = a_i_settings(3);
        let a = rebuild_round(&settings);
        let b = rebuild_round(&settings);
        assert_eq!(a.unanswered(), b.unanswered());
        assert_eq!(a.distinct_pairs(), b.distinct_pairs());
    }

    #[test]
    fn test_correct_removes_one_occurrence() {
        let mut round = rebuild_round(&a_i_settings(2));
        let ya = pair("や", "ya");
        assert!(!round.record_correct(&ya));
        assert_eq!(round.remaining(), 5);
        assert!(round.record_correct(&ya));
        assert_eq!(round.remaining(), 4);
        assert_eq!(round.correct_count, 2);
    }

    #[test]
    fn test_incorrect_never_shrinks_pool() {
        let mut round = rebuild_round(&a_i_settings(1));
        round.record_incorrect(&pair("や", "ya"));
        assert_eq!(round.remaining(), 3);
        assert_eq!(round.retry_count, 1);
    }

    #[test]
    fn test_summary_partitions_distinct_pairs() {
        let mut round = rebuild_round(&a_i_settings(1));
        let (ya, yu, yo) = (pair("や", "ya"), pair("ゆ", "yu"), pair("よ", "yo"));
        round.record_incorrect(&yu);
        round.record_incorrect(&yo);
        round.record_incorrect(&yo);
        for p in [&ya, &yu, &yo] {
            round.record_correct(p);
        }
        assert!(round.is_complete());
        let summary = round.summary();
        assert_eq!(summary.correct + summary.incorrect, 3);
        assert_eq!(summary.correct, 1);
        assert_eq!(summary.incorrect, 2);
        assert_eq!(summary.hard, vec![yo]);
        assert!(!summary.is_clean());
    }

    #[test]
    fn test_empty_selection_is_never_complete() {
        let mut settings = a_i_settings(1);
        settings.hiragana.enabled = false;
        let round = rebuild_round(&settings);
        assert!(round.is_empty_selection());
        assert!(!round.is_complete());
    }
}
