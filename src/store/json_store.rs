use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::content::vocabulary::{VocabularyFile, default_vocabularies};
use crate::engine::error_stats::ErrorStats;
use crate::store::schema::{ProfilePreferences, ScoresFile};

const PROFILES_DIR: &str = "profiles";
const VOCABULARIES_FILE: &str = "vocabularies.json";
const SCORES_FILE: &str = "scores.json";

pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kanadr");
        Self::with_base_dir(base_dir)
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join(PROFILES_DIR))?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    fn profile_file(profile: &str) -> Result<String> {
        if profile.is_empty() || profile.contains(['/', '\\']) || profile.starts_with('.') {
            bail!("Invalid profile name: {profile:?}");
        }
        Ok(format!("{PROFILES_DIR}/{profile}.json"))
    }

    fn read<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let path = self.file_path(name);
        if !path.exists() {
            return None;
        }
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable data file, using defaults");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed data file, using defaults");
                None
            }
        }
    }

    fn load<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.read(name).unwrap_or_default()
    }

    fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    pub fn load_preferences(&self, profile: &str) -> ProfilePreferences {
        match Self::profile_file(profile) {
            Ok(name) => self.load(&name),
            Err(e) => {
                warn!(error = %e, "using default preferences");
                ProfilePreferences::default()
            }
        }
    }

    pub fn save_preferences(&self, profile: &str, prefs: &ProfilePreferences) -> Result<()> {
        self.save(&Self::profile_file(profile)?, prefs)
    }

    /// Overwrite only the given keys of a profile document, leaving every
    /// other key as it is on disk.
    fn merge_preference_keys(&self, profile: &str, entries: Vec<(&str, Value)>) -> Result<()> {
        let name = Self::profile_file(profile)?;
        let mut doc: Map<String, Value> = self.load(&name);
        for (key, value) in entries {
            doc.insert(key.to_string(), value);
        }
        self.save(&name, &doc)
    }

    pub fn save_error_stats(&self, profile: &str, stats: &ErrorStats) -> Result<()> {
        self.merge_preference_keys(profile, vec![("error_stats", serde_json::to_value(stats)?)])
    }

    pub fn set_show_comments(&self, profile: &str, show: bool) -> Result<()> {
        self.merge_preference_keys(profile, vec![("showCommentsOnCorrect", Value::Bool(show))])
    }

    pub fn set_message_duration(&self, profile: &str, seconds: u32) -> Result<()> {
        self.merge_preference_keys(profile, vec![("messageDuration", Value::from(seconds))])
    }

    pub fn save_selected_words(&self, profile: &str, keys: &[String]) -> Result<()> {
        self.merge_preference_keys(profile, vec![("selectedWords", serde_json::to_value(keys)?)])
    }

    /// Load the shared vocabulary list. A missing file is created with the
    /// built-in starter vocabulary; a corrupt one is left alone.
    pub fn load_vocabularies(&self) -> VocabularyFile {
        if let Some(file) = self.read::<VocabularyFile>(VOCABULARIES_FILE) {
            return file;
        }
        let defaults = default_vocabularies();
        if !self.file_path(VOCABULARIES_FILE).exists() {
            match self.save(VOCABULARIES_FILE, &defaults) {
                Ok(()) => info!("created starter vocabulary file"),
                Err(e) => warn!(error = %e, "could not create vocabulary file"),
            }
        }
        defaults
    }

    pub fn load_scores(&self) -> ScoresFile {
        self.load(SCORES_FILE)
    }

    pub fn save_scores(&self, data: &ScoresFile) -> Result<()> {
        self.save(SCORES_FILE, data)
    }

    /// Read-modify-write of the scores file. Returns whether a best score
    /// was raised.
    pub fn record_score(
        &self,
        profile: &str,
        vocabulary: &str,
        romaji: f64,
        english: f64,
    ) -> Result<bool> {
        let mut scores = self.load_scores();
        if !scores.record(profile, vocabulary, romaji, english) {
            return Ok(false);
        }
        self.save_scores(&scores)?;
        info!(profile, vocabulary, romaji, english, "new best score");
        Ok(true)
    }

    /// Names of all profiles with a preferences file, sorted.
    pub fn list_profiles(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.base_dir.join(PROFILES_DIR)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && p.extension().and_then(|x| x.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    pub fn profile_exists(&self, profile: &str) -> bool {
        Self::profile_file(profile)
            .map(|name| self.file_path(&name).is_file())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::kana::KanaPair;
    use crate::content::vocabulary::ALL_VOCABULARIES;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_missing_profile_loads_defaults() {
        let (_dir, store) = make_test_store();
        assert_eq!(store.load_preferences("alice"), ProfilePreferences::default());
        assert!(!store.profile_exists("alice"));
    }

    #[test]
    fn test_corrupt_profile_loads_defaults() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path("profiles/alice.json"), "{ not json").unwrap();
        assert_eq!(store.load_preferences("alice"), ProfilePreferences::default());
    }

    #[test]
    fn test_preferences_round_trip() {
        let (_dir, store) = make_test_store();
        let mut prefs = ProfilePreferences::default();
        prefs.times_to_show = 3;
        prefs.weighted_practice = true;
        prefs.error_stats.record_wrong(&KanaPair::new("ぬ", "nu"));
        store.save_preferences("alice", &prefs).unwrap();

        assert!(store.profile_exists("alice"));
        assert_eq!(store.load_preferences("alice"), prefs);
        assert!(!store.file_path("profiles/alice.tmp").exists());
    }

    #[test]
    fn test_bad_key_does_not_wipe_profile_on_save() {
        let (_dir, store) = make_test_store();
        let json = r#"{
            "times_to_show": -1,
            "error_stats": {"あ|a": 9},
            "selectedWords": ["はい|hai|yes"]
        }"#;
        fs::write(store.file_path("profiles/alice.json"), json).unwrap();

        let prefs = store.load_preferences("alice");
        store.save_preferences("alice", &prefs).unwrap();

        let reloaded = store.load_preferences("alice");
        assert_eq!(reloaded.times_to_show, 1);
        assert_eq!(reloaded.error_stats.weight(&KanaPair::new("あ", "a")), 9);
        assert_eq!(reloaded.selected_words, vec!["はい|hai|yes".to_string()]);
    }

    #[test]
    fn test_partial_saves_keep_other_keys() {
        let (_dir, store) = make_test_store();
        fs::write(
            store.file_path("profiles/alice.json"),
            r#"{"times_to_show": 4, "window_size": [900, 700], "theme": "dark"}"#,
        )
        .unwrap();

        let mut stats = ErrorStats::default();
        stats.record_wrong(&KanaPair::new("ね", "ne"));
        store.save_error_stats("alice", &stats).unwrap();
        store.set_show_comments("alice", false).unwrap();
        store.save_selected_words("alice", &["はい|hai|yes".to_string()]).unwrap();

        let prefs = store.load_preferences("alice");
        assert_eq!(prefs.times_to_show, 4);
        assert_eq!(prefs.window_size, Some([900, 700]));
        assert_eq!(prefs.extra["theme"], "dark");
        assert_eq!(prefs.error_stats.weight(&KanaPair::new("ね", "ne")), 5);
        assert!(!prefs.show_comments_on_correct);
        assert_eq!(prefs.selected_words, vec!["はい|hai|yes".to_string()]);
    }

    #[test]
    fn test_invalid_profile_names_are_refused() {
        let (_dir, store) = make_test_store();
        assert!(store.save_preferences("../escape", &ProfilePreferences::default()).is_err());
        assert!(store.set_show_comments("", true).is_err());
        assert!(!store.profile_exists("a/b"));
    }

    #[test]
    fn test_vocabularies_created_on_first_load() {
        let (_dir, store) = make_test_store();
        assert!(!store.file_path(VOCABULARIES_FILE).exists());
        let file = store.load_vocabularies();
        assert_eq!(file.names(), vec!["Basic Words"]);
        assert!(store.file_path(VOCABULARIES_FILE).exists());
    }

    #[test]
    fn test_corrupt_vocabularies_are_not_overwritten() {
        let (_dir, store) = make_test_store();
        fs::write(store.file_path(VOCABULARIES_FILE), "oops").unwrap();
        let file = store.load_vocabularies();
        assert_eq!(file.names(), vec!["Basic Words"]);
        assert_eq!(fs::read_to_string(store.file_path(VOCABULARIES_FILE)).unwrap(), "oops");
    }

    #[test]
    fn test_best_score_only_rises() {
        let (_dir, store) = make_test_store();
        assert!(store.record_score("alice", "Food", 40.0, 0.0).unwrap());
        assert!(store.record_score("alice", "Food", 70.0, 0.0).unwrap());
        assert!(!store.record_score("alice", "Food", 55.0, 0.0).unwrap());

        let scores = store.load_scores();
        assert_eq!(scores.lookup("alice", "Food").unwrap().best_romaji_percent, 70.0);
    }

    #[test]
    fn test_merged_vocabulary_score_is_not_saved() {
        let (_dir, store) = make_test_store();
        assert!(!store.record_score("alice", ALL_VOCABULARIES, 100.0, 100.0).unwrap());
        assert!(!store.file_path(SCORES_FILE).exists());
    }

    #[test]
    fn test_list_profiles_ignores_shared_files() {
        let (_dir, store) = make_test_store();
        store.save_preferences("bob", &ProfilePreferences::default()).unwrap();
        store.save_preferences("alice", &ProfilePreferences::default()).unwrap();
        store.load_vocabularies();
        store.record_score("alice", "Food", 10.0, 0.0).unwrap();

        assert_eq!(store.list_profiles(), vec!["alice".to_string(), "bob".to_string()]);
    }
}
