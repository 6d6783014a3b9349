use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KanaEntry {
    pub kana: &'static str,
    pub romaji: &'static str,
}

impl KanaEntry {
    const fn new(kana: &'static str, romaji: &'static str) -> Self {
        Self { kana, romaji }
    }

    /// Empty cells keep the grid rectangular; they are never quizzed.
    pub fn is_empty(&self) -> bool {
        self.kana.is_empty()
    }

    pub fn to_pair(&self) -> KanaPair {
        KanaPair::new(self.kana, self.romaji)
    }
}

const NONE: KanaEntry = KanaEntry::new("", "");

const fn k(kana: &'static str, romaji: &'static str) -> KanaEntry {
    KanaEntry::new(kana, romaji)
}

pub const HIRAGANA: &[&[KanaEntry]] = &[
    &[k("あ", "a"), k("い", "i"), k("う", "u"), k("え", "e"), k("お", "o")],
    &[k("か", "ka"), k("き", "ki"), k("く", "ku"), k("け", "ke"), k("こ", "ko")],
    &[k("さ", "sa"), k("し", "shi"), k("す", "su"), k("せ", "se"), k("そ", "so")],
    &[k("た", "ta"), k("ち", "chi"), k("つ", "tsu"), k("て", "te"), k("と", "to")],
    &[k("な", "na"), k("に", "ni"), k("ぬ", "nu"), k("ね", "ne"), k("の", "no")],
    &[k("は", "ha"), k("ひ", "hi"), k("ふ", "fu"), k("へ", "he"), k("ほ", "ho")],
    &[k("ま", "ma"), k("み", "mi"), k("む", "mu"), k("め", "me"), k("も", "mo")],
    &[k("や", "ya"), NONE, k("ゆ", "yu"), NONE, k("よ", "yo")],
    &[k("ら", "ra"), k("り", "ri"), k("る", "ru"), k("れ", "re"), k("ろ", "ro")],
    &[k("わ", "wa"), NONE, NONE, NONE, k("を", "wo")],
    &[k("ん", "n"), NONE, NONE, NONE, NONE],
    // dakuon
    &[k("が", "ga"), k("ぎ", "gi"), k("ぐ", "gu"), k("げ", "ge"), k("ご", "go")],
    &[k("ざ", "za"), k("じ", "ji"), k("ず", "zu"), k("ぜ", "ze"), k("ぞ", "zo")],
    &[k("だ", "da"), k("ぢ", "ji"), k("づ", "zu"), k("で", "de"), k("ど", "do")],
    &[k("ば", "ba"), k("び", "bi"), k("ぶ", "bu"), k("べ", "be"), k("ぼ", "bo")],
    // handakuon
    &[k("ぱ", "pa"), k("ぴ", "pi"), k("ぷ", "pu"), k("ぺ", "pe"), k("ぽ", "po")],
];

pub const KATAKANA: &[&[KanaEntry]] = &[
    &[k("ア", "a"), k("イ", "i"), k("ウ", "u"), k("エ", "e"), k("オ", "o")],
    &[k("カ", "ka"), k("キ", "ki"), k("ク", "ku"), k("ケ", "ke"), k("コ", "ko")],
    &[k("サ", "sa"), k("シ", "shi"), k("ス", "su"), k("セ", "se"), k("ソ", "so")],
    &[k("タ", "ta"), k("チ", "chi"), k("ツ", "tsu"), k("テ", "te"), k("ト", "to")],
    &[k("ナ", "na"), k("ニ", "ni"), k("ヌ", "nu"), k("ネ", "ne"), k("ノ", "no")],
    &[k("ハ", "ha"), k("ヒ", "hi"), k("フ", "fu"), k("ヘ", "he"), k("ホ", "ho")],
    &[k("マ", "ma"), k("ミ", "mi"), k("ム", "mu"), k("メ", "me"), k("モ", "mo")],
    &[k("ヤ", "ya"), NONE, k("ユ", "yu"), NONE, k("ヨ", "yo")],
    &[k("ラ", "ra"), k("リ", "ri"), k("ル", "ru"), k("レ", "re"), k("ロ", "ro")],
    &[k("ワ", "wa"), NONE, NONE, NONE, k("ヲ", "wo")],
    &[k("ン", "n"), NONE, NONE, NONE, NONE],
    // dakuon
    &[k("ガ", "ga"), k("ギ", "gi"), k("グ", "gu"), k("ゲ", "ge"), k("ゴ", "go")],
    &[k("ザ", "za"), k("ジ", "ji"), k("ズ", "zu"), k("ゼ", "ze"), k("ゾ", "zo")],
    &[k("ダ", "da"), k("ヂ", "ji"), k("ヅ", "zu"), k("デ", "de"), k("ド", "do")],
    &[k("バ", "ba"), k("ビ", "bi"), k("ブ", "bu"), k("ベ", "be"), k("ボ", "bo")],
    // handakuon
    &[k("パ", "pa"), k("ピ", "pi"), k("プ", "pu"), k("ペ", "pe"), k("ポ", "po")],
];

pub const KANJI: &[&[KanaEntry]] = &[
    &[k("日", "nichi"), k("月", "getsu"), k("火", "ka"), k("水", "sui"), k("木", "moku")],
    &[k("金", "kin"), k("土", "do"), k("山", "yama"), k("川", "kawa"), k("人", "hito")],
    &[k("口", "kuchi"), k("目", "me"), k("耳", "mimi"), k("手", "te"), k("足", "ashi")],
    &[k("力", "chikara")],
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Script {
    Hiragana,
    Katakana,
    Kanji,
}

impl Script {
    pub const ALL: [Script; 3] = [Script::Hiragana, Script::Katakana, Script::Kanji];

    pub fn as_str(self) -> &'static str {
        match self {
            Script::Hiragana => "hiragana",
            Script::Katakana => "katakana",
            Script::Kanji => "kanji",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(name.trim()))
    }

    pub fn rows(self) -> &'static [&'static [KanaEntry]] {
        match self {
            Script::Hiragana => HIRAGANA,
            Script::Katakana => KATAKANA,
            Script::Kanji => KANJI,
        }
    }

    pub fn row_count(self) -> usize {
        self.rows().len()
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (kana, romaji) prompt. Two entries with the same glyph but different
/// readings are distinct pairs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KanaPair {
    pub kana: String,
    pub romaji: String,
}

impl KanaPair {
    pub fn new(kana: impl Into<String>, romaji: impl Into<String>) -> Self {
        Self {
            kana: kana.into(),
            romaji: romaji.into(),
        }
    }

    /// Persisted form used as the error-stats map key.
    pub fn key(&self) -> String {
        format!("{}|{}", self.kana, self.romaji)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        match key.find('|') {
            Some(sep) if sep > 0 => Some(Self::new(&key[..sep], &key[sep + 1..])),
            _ => None,
        }
    }
}

impl fmt::Display for KanaPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kana, self.romaji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kana_tables_are_rectangular() {
        for table in [HIRAGANA, KATAKANA] {
            assert_eq!(table.len(), 16);
            assert!(table.iter().all(|row| row.len() == 5));
        }
        assert_eq!(KANJI.len(), 4);
        assert_eq!(KANJI[3].len(), 1);
    }

    #[test]
    fn empty_cells_have_no_romaji() {
        for script in Script::ALL {
            for row in script.rows() {
                for entry in row.iter() {
                    assert_eq!(entry.is_empty(), entry.romaji.is_empty());
                }
            }
        }
    }

    #[test]
    fn key_splits_at_first_separator() {
        let pair = KanaPair::from_key("あ|a|b").unwrap();
        assert_eq!(pair.kana, "あ");
        assert_eq!(pair.romaji, "a|b");
        assert_eq!(KanaPair::new("い", "i").key(), "い|i");
    }

    #[test]
    fn key_without_kana_is_rejected() {
        assert!(KanaPair::from_key("|a").is_none());
        assert!(KanaPair::from_key("nokey").is_none());
    }

    #[test]
    fn script_from_name_is_case_insensitive() {
        assert_eq!(Script::from_name("Katakana"), Some(Script::Katakana));
        assert_eq!(Script::from_name("kanji "), Some(Script::Kanji));
        assert_eq!(Script::from_name("hangul"), None);
    }
}
