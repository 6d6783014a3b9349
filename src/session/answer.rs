use icu_normalizer::ComposingNormalizerBorrowed;

/// Canonical form for comparing typed answers: trimmed, NFC-composed and
/// lowercased. Composition keeps IME output such as `か` + `゛` equal to `が`.
pub fn normalize_answer(raw: &str) -> String {
    let nfc = ComposingNormalizerBorrowed::new_nfc();
    nfc.normalize(raw.trim()).to_lowercase()
}

/// Split a combined "romaji,english" answer.
///
/// The input is split on every comma. Exactly two parts are read as
/// (romaji, english); any other count falls back to using the first part
/// for both fields, so an answer without a comma is checked against each
/// target on its own.
pub fn split_combined(input: &str) -> (String, String) {
    let parts: Vec<&str> = input.split(',').collect();
    if parts.len() == 2 {
        (parts[0].trim().to_string(), parts[1].trim().to_string())
    } else {
        let only = parts[0].trim().to_string();
        (only.clone(), only)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DiffChar {
    pub ch: char,
    pub matches: bool,
}

/// Mark each character of `expected` as matching the character the user
/// typed at the same position. Extra typed characters are ignored.
pub fn char_diff(expected: &str, given: &str) -> Vec<DiffChar> {
    let given: Vec<char> = given.chars().collect();
    expected
        .chars()
        .enumerate()
        .map(|(i, ch)| DiffChar {
            ch,
            matches: given.get(i) == Some(&ch),
        })
        .collect()
}
