use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::content::vocabulary::{ALL_VOCABULARIES, SELECTED_WORDS};
use crate::engine::error_stats::ErrorStats;
use crate::engine::settings::{QuizSettings, ScriptSelection};

pub const DEFAULT_MESSAGE_DURATION: u32 = 2;

/// Contents of `profiles/<name>.json`.
///
/// Key names match files written by earlier versions of the quiz, and any
/// key this struct does not know about is carried through a load/save cycle
/// untouched. Each known key is read on its own: a malformed value falls
/// back to that key's default without touching its siblings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct ProfilePreferences {
    pub hiragana_cb: bool,
    pub katakana_cb: bool,
    pub kanji_cb: bool,
    pub hide_tables_cb: bool,
    pub hiragana_rows: Vec<bool>,
    pub katakana_rows: Vec<bool>,
    pub kanji_rows: Vec<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_size: Option<[u32; 2]>,
    pub times_to_show: u32,
    pub weighted_practice: bool,
    #[serde(skip_serializing_if = "ErrorStats::is_empty")]
    pub error_stats: ErrorStats,
    #[serde(rename = "messageDuration")]
    pub message_duration: u32,
    #[serde(rename = "showCommentsOnCorrect")]
    pub show_comments_on_correct: bool,
    #[serde(rename = "selectedWords", skip_serializing_if = "Vec::is_empty")]
    pub selected_words: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Move `key` out of `doc` into `slot`. A value of the wrong shape is
/// dropped and `slot` keeps its default.
fn take_key<T: DeserializeOwned>(doc: &mut Map<String, Value>, key: &str, slot: &mut T) {
    let Some(value) = doc.remove(key) else {
        return;
    };
    match serde_json::from_value(value) {
        Ok(parsed) => *slot = parsed,
        Err(e) => warn!(key, error = %e, "malformed preference, using its default"),
    }
}

impl From<Map<String, Value>> for ProfilePreferences {
    fn from(mut doc: Map<String, Value>) -> Self {
        let mut prefs = Self::default();
        take_key(&mut doc, "hiragana_cb", &mut prefs.hiragana_cb);
        take_key(&mut doc, "katakana_cb", &mut prefs.katakana_cb);
        take_key(&mut doc, "kanji_cb", &mut prefs.kanji_cb);
        take_key(&mut doc, "hide_tables_cb", &mut prefs.hide_tables_cb);
        take_key(&mut doc, "hiragana_rows", &mut prefs.hiragana_rows);
        take_key(&mut doc, "katakana_rows", &mut prefs.katakana_rows);
        take_key(&mut doc, "kanji_rows", &mut prefs.kanji_rows);
        take_key(&mut doc, "window_size", &mut prefs.window_size);
        take_key(&mut doc, "times_to_show", &mut prefs.times_to_show);
        take_key(&mut doc, "weighted_practice", &mut prefs.weighted_practice);
        take_key(&mut doc, "error_stats", &mut prefs.error_stats);
        take_key(&mut doc, "messageDuration", &mut prefs.message_duration);
        take_key(&mut doc, "showCommentsOnCorrect", &mut prefs.show_comments_on_correct);
        take_key(&mut doc, "selectedWords", &mut prefs.selected_words);
        prefs.extra = doc;
        prefs
    }
}

impl Default for ProfilePreferences {
    fn default() -> Self {
        Self {
            hiragana_cb: true,
            katakana_cb: true,
            kanji_cb: true,
            hide_tables_cb: false,
            hiragana_rows: Vec::new(),
            katakana_rows: Vec::new(),
            kanji_rows: Vec::new(),
            window_size: None,
            times_to_show: 1,
            weighted_practice: false,
            error_stats: ErrorStats::default(),
            message_duration: DEFAULT_MESSAGE_DURATION,
            show_comments_on_correct: true,
            selected_words: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl ProfilePreferences {
    /// Alphabet quiz settings described by these preferences, with short or
    /// missing row lists filled in and empty tables repaired.
    pub fn quiz_settings(&self) -> QuizSettings {
        QuizSettings {
            hiragana: ScriptSelection {
                enabled: self.hiragana_cb,
                rows: self.hiragana_rows.clone(),
            },
            katakana: ScriptSelection {
                enabled: self.katakana_cb,
                rows: self.katakana_rows.clone(),
            },
            kanji: ScriptSelection {
                enabled: self.kanji_cb,
                rows: self.kanji_rows.clone(),
            },
            times_to_show: self.times_to_show,
            weighted: self.weighted_practice,
        }
        .normalized()
    }

    pub fn set_quiz_settings(&mut self, settings: &QuizSettings) {
        self.hiragana_cb = settings.hiragana.enabled;
        self.katakana_cb = settings.katakana.enabled;
        self.kanji_cb = settings.kanji.enabled;
        self.hiragana_rows = settings.hiragana.rows.clone();
        self.katakana_rows = settings.katakana.rows.clone();
        self.kanji_rows = settings.kanji.rows.clone();
        self.times_to_show = settings.times_to_show;
        self.weighted_practice = settings.weighted;
    }
}

/// Best results of one profile on one vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyScore {
    #[serde(default)]
    pub best_romaji_percent: f64,
    #[serde(default)]
    pub best_english_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// `scores.json`: profile name, then vocabulary name, then best scores.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoresFile {
    pub profiles: BTreeMap<String, BTreeMap<String, VocabularyScore>>,
}

impl ScoresFile {
    pub fn lookup(&self, profile: &str, vocabulary: &str) -> Option<&VocabularyScore> {
        self.profiles.get(profile)?.get(vocabulary)
    }

    pub fn for_profile(&self, profile: &str) -> Option<&BTreeMap<String, VocabularyScore>> {
        self.profiles.get(profile)
    }

    /// Raise the stored bests where the new percentages beat them. Each
    /// category only moves up. Returns whether anything changed.
    ///
    /// Only named vocabularies are scored: the merged set, the custom
    /// selection and unnamed sets never get a record.
    pub fn record(&mut self, profile: &str, vocabulary: &str, romaji: f64, english: f64) -> bool {
        if profile.is_empty()
            || vocabulary.is_empty()
            || vocabulary == ALL_VOCABULARIES
            || vocabulary == SELECTED_WORDS
        {
            return false;
        }
        let entry = self
            .profiles
            .entry(profile.to_string())
            .or_default()
            .entry(vocabulary.to_string())
            .or_default();

        let mut improved = false;
        if romaji > entry.best_romaji_percent {
            entry.best_romaji_percent = romaji;
            improved = true;
        }
        if english > entry.best_english_percent {
            entry.best_english_percent = english;
            improved = true;
        }
        if improved {
            entry.last_updated = Some(Utc::now());
        }
        improved
    }
}
