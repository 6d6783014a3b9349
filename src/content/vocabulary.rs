use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the pseudo-vocabulary that merges every loaded list. Scores are
/// never recorded against it.
pub const ALL_VOCABULARIES: &str = "All Vocabularies";

/// Name shown for a custom "selected words" practice set.
pub const SELECTED_WORDS: &str = "Selected Words";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct VocabularyWord {
    pub japanese: String,
    pub romaji: String,
    pub english: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kanji: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl VocabularyWord {
    pub fn new(japanese: &str, romaji: &str, english: &str) -> Self {
        Self {
            japanese: japanese.to_string(),
            romaji: romaji.to_string(),
            english: english.to_string(),
            kanji: None,
            comment: None,
            hint: None,
        }
    }

    pub fn with_comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hint = Some(hint.to_string());
        self
    }

    pub fn with_kanji(mut self, kanji: &str) -> Self {
        self.kanji = Some(kanji.to_string());
        self
    }

    pub fn primary_form(&self) -> &str {
        if self.japanese.is_empty() {
            self.kanji.as_deref().unwrap_or_default()
        } else {
            &self.japanese
        }
    }

    /// Key stored in a profile's `selectedWords` list.
    pub fn selection_key(&self) -> String {
        format!("{}|{}|{}", self.primary_form(), self.romaji, self.english)
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.is_empty())
    }

    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref().filter(|h| !h.is_empty())
    }
}

/// Field-by-field tolerant form of a word as found on disk.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawWord {
    japanese: Option<String>,
    romaji: Option<String>,
    english: Option<String>,
    kanji: Option<String>,
    comment: Option<String>,
    hint: Option<String>,
}

impl RawWord {
    fn into_word(self) -> Option<VocabularyWord> {
        let japanese = self.japanese.filter(|s| !s.is_empty())?;
        let romaji = self.romaji.filter(|s| !s.is_empty())?;
        let english = self.english.filter(|s| !s.is_empty())?;
        Some(VocabularyWord {
            japanese,
            romaji,
            english,
            kanji: self.kanji.filter(|s| !s.is_empty()),
            comment: self.comment.filter(|s| !s.is_empty()),
            hint: self.hint.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    #[serde(rename = "Vocabulary")]
    pub name: String,
    pub words: Vec<VocabularyWord>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawVocabulary {
    #[serde(rename = "Vocabulary")]
    name: Option<String>,
    words: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyFile {
    #[serde(rename = "Vocabularies", deserialize_with = "lenient_vocabularies")]
    pub vocabularies: Vec<Vocabulary>,
}

/// Drops malformed entries instead of failing the whole document: words
/// missing japanese/romaji/english and vocabularies without a name.
fn lenient_vocabularies<'de, D>(deserializer: D) -> Result<Vec<Vocabulary>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    let vocabularies = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value::<RawVocabulary>(value).ok())
        .filter_map(|rv| {
            let name = rv.name.filter(|n| !n.is_empty())?;
            let words = rv
                .words
                .into_iter()
                .filter_map(|w| serde_json::from_value::<RawWord>(w).ok())
                .filter_map(RawWord::into_word)
                .collect();
            Some(Vocabulary { name, words })
        })
        .collect();
    Ok(vocabularies)
}

impl VocabularyFile {
    pub fn names(&self) -> Vec<&str> {
        self.vocabularies.iter().map(|v| v.name.as_str()).collect()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.vocabularies.iter().position(|v| v.name == name)
    }

    pub fn all_words(&self) -> Vec<VocabularyWord> {
        self.vocabularies
            .iter()
            .flat_map(|v| v.words.iter().cloned())
            .collect()
    }

    /// Words whose selection key appears in `keys`, in file order.
    pub fn select_words(&self, keys: &[String]) -> Vec<VocabularyWord> {
        let wanted: HashSet<&str> = keys.iter().map(String::as_str).collect();
        self.vocabularies
            .iter()
            .flat_map(|v| v.words.iter())
            .filter(|w| wanted.contains(w.selection_key().as_str()))
            .cloned()
            .collect()
    }

    /// Resolve a practice set to its display name and word list. Returns
    /// `None` for an index past the loaded list.
    pub fn resolve(
        &self,
        set: &PracticeSet,
        selected_keys: &[String],
    ) -> Option<(String, Vec<VocabularyWord>)> {
        match set {
            PracticeSet::Named(idx) => self
                .vocabularies
                .get(*idx)
                .map(|v| (v.name.clone(), v.words.clone())),
            PracticeSet::All => Some((ALL_VOCABULARIES.to_string(), self.all_words())),
            PracticeSet::Selected => {
                Some((SELECTED_WORDS.to_string(), self.select_words(selected_keys)))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PracticeSet {
    Named(usize),
    All,
    Selected,
}

pub fn default_vocabularies() -> VocabularyFile {
    VocabularyFile {
        vocabularies: vec![Vocabulary {
            name: "Basic Words".to_string(),
            words: vec![
                VocabularyWord::new("こんにちは", "konnichiwa", "hello"),
                VocabularyWord::new("ありがとう", "arigatou", "thank you"),
                VocabularyWord::new("さようなら", "sayounara", "goodbye"),
                VocabularyWord::new("はい", "hai", "yes"),
                VocabularyWord::new("いいえ", "iie", "no"),
            ],
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_incomplete_words_and_unnamed_vocabularies() {
        let json = r#"{
            "Vocabularies": [
                {"Vocabulary": "Food", "words": [
                    {"japanese": "すし", "romaji": "sushi", "english": "sushi", "hint": "rice"},
                    {"japanese": "みず", "romaji": "mizu"},
                    42
                ]},
                {"words": [{"japanese": "ねこ", "romaji": "neko", "english": "cat"}]},
                "garbage"
            ]
        }"#;
        let file: VocabularyFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.vocabularies.len(), 1);
        let food = &file.vocabularies[0];
        assert_eq!(food.name, "Food");
        assert_eq!(food.words.len(), 1);
        assert_eq!(food.words[0].hint(), Some("rice"));
        assert_eq!(food.words[0].comment(), None);
    }

    #[test]
    fn optional_fields_are_omitted_when_absent() {
        let json = serde_json::to_string(&default_vocabularies()).unwrap();
        assert!(json.contains("\"Vocabularies\""));
        assert!(json.contains("\"Vocabulary\":\"Basic Words\""));
        assert!(!json.contains("hint"));
        assert!(!json.contains("kanji"));
    }

    #[test]
    fn selection_key_falls_back_to_kanji() {
        let mut word = VocabularyWord::new("", "yama", "mountain").with_kanji("山");
        assert_eq!(word.selection_key(), "山|yama|mountain");
        word.japanese = "やま".to_string();
        assert_eq!(word.selection_key(), "やま|yama|mountain");
    }

    #[test]
    fn resolve_named_all_and_selected() {
        let mut file = default_vocabularies();
        file.vocabularies.push(Vocabulary {
            name: "Animals".to_string(),
            words: vec![VocabularyWord::new("ねこ", "neko", "cat")],
        });

        let (name, words) = file.resolve(&PracticeSet::Named(1), &[]).unwrap();
        assert_eq!(name, "Animals");
        assert_eq!(words.len(), 1);

        let (name, words) = file.resolve(&PracticeSet::All, &[]).unwrap();
        assert_eq!(name, ALL_VOCABULARIES);
        assert_eq!(words.len(), 6);

        let keys = vec!["ねこ|neko|cat".to_string(), "はい|hai|yes".to_string()];
        let (_, words) = file.resolve(&PracticeSet::Selected, &keys).unwrap();
        let romaji: Vec<&str> = words.iter().map(|w| w.romaji.as_str()).collect();
        assert_eq!(romaji, vec!["hai", "neko"]);

        assert!(file.resolve(&PracticeSet::Named(9), &[]).is_none());
    }
}
