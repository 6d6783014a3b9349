use std::collections::HashSet;

use crate::content::kana::{KanaPair, Script};
use crate::error::{QuizError, QuizResult};

/// Enable state of one script table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScriptSelection {
    pub enabled: bool,
    pub rows: Vec<bool>,
}

impl ScriptSelection {
    pub fn all(script: Script) -> Self {
        Self {
            enabled: true,
            rows: vec![true; script.row_count()],
        }
    }

    pub fn checked_rows(&self) -> usize {
        self.rows.iter().filter(|&&on| on).count()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Toggle {
    Applied,
    Unchanged,
    /// The change would leave a script with no checked rows; it was reverted.
    Rejected,
}

/// Snapshot of everything that shapes an alphabet round. A new snapshot
/// means a new round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizSettings {
    pub hiragana: ScriptSelection,
    pub katakana: ScriptSelection,
    pub kanji: ScriptSelection,
    pub times_to_show: u32,
    pub weighted: bool,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            hiragana: ScriptSelection::all(Script::Hiragana),
            katakana: ScriptSelection::all(Script::Katakana),
            kanji: ScriptSelection::all(Script::Kanji),
            times_to_show: 1,
            weighted: false,
        }
    }
}

impl QuizSettings {
    pub fn script(&self, script: Script) -> &ScriptSelection {
        match script {
            Script::Hiragana => &self.hiragana,
            Script::Katakana => &self.katakana,
            Script::Kanji => &self.kanji,
        }
    }

    fn script_mut(&mut self, script: Script) -> &mut ScriptSelection {
        match script {
            Script::Hiragana => &mut self.hiragana,
            Script::Katakana => &mut self.katakana,
            Script::Kanji => &mut self.kanji,
        }
    }

    pub fn any_script_enabled(&self) -> bool {
        Script::ALL.iter().any(|&s| self.script(s).enabled)
    }

    /// Distinct, non-empty pairs from checked rows of enabled scripts, in
    /// table order.
    pub fn enabled_pairs(&self) -> Vec<KanaPair> {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for script in Script::ALL {
            let selection = self.script(script);
            if !selection.enabled {
                continue;
            }
            for (row, entries) in script.rows().iter().enumerate() {
                if !selection.rows.get(row).copied().unwrap_or(false) {
                    continue;
                }
                for entry in entries.iter().filter(|e| !e.is_empty()) {
                    let pair = entry.to_pair();
                    if seen.insert(pair.clone()) {
                        pairs.push(pair);
                    }
                }
            }
        }
        pairs
    }

    pub fn set_script_enabled(&mut self, script: Script, enabled: bool) -> Toggle {
        let selection = self.script_mut(script);
        if selection.enabled == enabled {
            return Toggle::Unchanged;
        }
        selection.enabled = enabled;
        Toggle::Applied
    }

    pub fn set_row_enabled(
        &mut self,
        script: Script,
        row: usize,
        enabled: bool,
    ) -> QuizResult<Toggle> {
        let rows = script.row_count();
        let selection = self.script_mut(script);
        let Some(current) = selection.rows.get(row).copied() else {
            return Err(QuizError::RowOutOfRange { script, row, rows });
        };
        if current == enabled {
            return Ok(Toggle::Unchanged);
        }
        if !enabled && selection.checked_rows() <= 1 {
            return Ok(Toggle::Rejected);
        }
        selection.rows[row] = enabled;
        Ok(Toggle::Applied)
    }

    pub fn set_times_to_show(&mut self, times: u32) -> Toggle {
        let times = times.max(1);
        if self.times_to_show == times {
            return Toggle::Unchanged;
        }
        self.times_to_show = times;
        Toggle::Applied
    }

    /// Repair a snapshot read from disk: row vectors sized to the tables,
    /// at least one checked row per script, and a positive repeat count.
    pub fn normalized(mut self) -> Self {
        for script in Script::ALL {
            let selection = self.script_mut(script);
            selection.rows.resize(script.row_count(), true);
            if selection.checked_rows() == 0 {
                selection.rows[0] = true;
            }
        }
        self.times_to_show = self.times_to_show.max(1);
        self
    }
}
