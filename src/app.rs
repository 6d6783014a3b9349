use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use chrono::Local;
use tracing::{info, warn};

use kanadr::config::Config;
use kanadr::content::kana::Script;
use kanadr::content::vocabulary::{PracticeSet, VocabularyFile};
use kanadr::engine::settings::Toggle;
use kanadr::engine::{AlphabetQuiz, AnswerOutcome, PendingAdvance};
use kanadr::error::QuizError;
use kanadr::session::answer::DiffChar;
use kanadr::session::feedback::{Countdown, Feedback, FieldCheck, Tick};
use kanadr::session::result::VocabularyReport;
use kanadr::session::vocabulary::{Categories, VocabularyQuiz};
use kanadr::store::json_store::JsonStore;
use kanadr::store::schema::ProfilePreferences;

const HARDEST_LISTED: usize = 10;

const ALPHABET_HELP: &[&str] = &[
    ":row <script> <n> on|off   toggle a table row (1-based)",
    ":script <script> on|off    toggle hiragana, katakana or kanji",
    ":times <n>                 repeats of each character per round",
    ":weighted on|off           favour characters you miss",
    ":hard                      list the most missed characters",
    ":reset-stats               forget missed-character history",
    ":quit",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct AlphabetScreen {
    quiz: AlphabetQuiz,
    pending: Option<(PendingAdvance, Instant)>,
}

struct VocabularyScreen {
    quiz: VocabularyQuiz,
    name: String,
    countdown: Option<(Countdown, Instant)>,
}

enum Screen {
    Alphabet(AlphabetScreen),
    Vocabulary(VocabularyScreen),
}

pub struct App<W: Write> {
    profile: String,
    store: JsonStore,
    prefs: ProfilePreferences,
    screen: Screen,
    out: W,
}

impl<W: Write> App<W> {
    pub fn alphabet(store: JsonStore, profile: &str, config: &Config, out: W) -> Result<Self> {
        let prefs = store.load_preferences(profile);
        let mut settings = prefs.quiz_settings();
        if !store.profile_exists(profile) {
            settings.times_to_show = config.default_times_to_show;
        }
        let quiz = AlphabetQuiz::new(settings, prefs.error_stats.clone())
            .with_advance_delay(config.advance_delay());
        info!(profile, "starting alphabet quiz");

        let mut app = Self {
            profile: profile.to_string(),
            store,
            prefs,
            screen: Screen::Alphabet(AlphabetScreen {
                quiz,
                pending: None,
            }),
            out,
        };
        writeln!(app.out, "Type the romaji for each character. :help lists commands.")?;
        app.show_prompt()?;
        Ok(app)
    }

    pub fn vocabulary(
        store: JsonStore,
        profile: &str,
        vocabularies: &VocabularyFile,
        set: PracticeSet,
        categories: Categories,
        out: W,
    ) -> Result<Self> {
        let prefs = store.load_preferences(profile);
        let (name, words) = vocabularies
            .resolve(&set, &prefs.selected_words)
            .ok_or_else(|| anyhow!("No such vocabulary"))?;
        let quiz = VocabularyQuiz::new(words, categories)?
            .with_comments_on_correct(prefs.show_comments_on_correct);
        info!(profile, vocabulary = %name, words = quiz.words().len(), "starting vocabulary quiz");

        let mut app = Self {
            profile: profile.to_string(),
            store,
            prefs,
            screen: Screen::Vocabulary(VocabularyScreen {
                quiz,
                name,
                countdown: None,
            }),
            out,
        };
        if let Screen::Vocabulary(screen) = &app.screen {
            writeln!(
                app.out,
                "Vocabulary: {}. :hint shows a hint, :quit leaves.",
                screen.name
            )?;
        }
        app.show_prompt()?;
        Ok(app)
    }

    #[allow(dead_code)]
    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn handle_line(&mut self, line: &str, now: Instant) -> Result<Flow> {
        match self.screen {
            Screen::Alphabet(_) => self.alphabet_line(line.trim(), now),
            Screen::Vocabulary(_) => self.vocabulary_line(line.trim(), now),
        }
    }

    pub fn handle_tick(&mut self, now: Instant) -> Result<()> {
        match &mut self.screen {
            Screen::Alphabet(screen) => {
                let Some((advance, due)) = screen.pending else {
                    return Ok(());
                };
                if now < due {
                    return Ok(());
                }
                screen.pending = None;
                if screen.quiz.fire_advance(advance) {
                    self.show_prompt()?;
                }
            }
            Screen::Vocabulary(screen) => {
                let Some((countdown, last)) = &mut screen.countdown else {
                    return Ok(());
                };
                if now.duration_since(*last) < Duration::from_secs(1) {
                    return Ok(());
                }
                *last += Duration::from_secs(1);
                if countdown.tick() == Tick::Expired {
                    screen.countdown = None;
                    screen.quiz.acknowledge();
                    self.after_vocabulary_step()?;
                }
            }
        }
        Ok(())
    }

    /// Persist what the current screen owns before exiting.
    pub fn shutdown(&mut self) -> Result<()> {
        if let Screen::Alphabet(screen) = &self.screen {
            self.prefs.set_quiz_settings(screen.quiz.settings());
            self.prefs.error_stats = screen.quiz.stats().clone();
            self.store.save_preferences(&self.profile, &self.prefs)?;
        }
        Ok(())
    }

    fn show_prompt(&mut self) -> Result<()> {
        match &self.screen {
            Screen::Alphabet(screen) => match screen.quiz.prompt() {
                Ok(pair) => {
                    let (correct, retries) = screen.quiz.counters();
                    writeln!(
                        self.out,
                        "Correct: {correct} | Retries: {retries} | Left: {}",
                        screen.quiz.remaining()
                    )?;
                    writeln!(self.out, "  {}", pair.kana)?;
                }
                Err(e) => writeln!(self.out, "{e}")?,
            },
            Screen::Vocabulary(screen) => {
                if let Some(word) = screen.quiz.current() {
                    writeln!(self.out, "{}", screen.quiz.status_line())?;
                    match &word.kanji {
                        Some(kanji) if !word.japanese.is_empty() => {
                            writeln!(self.out, "  {} ({kanji})", word.japanese)?
                        }
                        _ => writeln!(self.out, "  {}", word.primary_form())?,
                    }
                    writeln!(self.out, "{}", screen.quiz.categories().prompt_label())?;
                }
            }
        }
        Ok(())
    }

    fn alphabet_line(&mut self, line: &str, now: Instant) -> Result<Flow> {
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        if let Some(command) = line.strip_prefix(':') {
            return self.alphabet_command(command);
        }
        let Screen::Alphabet(screen) = &mut self.screen else {
            return Ok(Flow::Continue);
        };

        match screen.quiz.submit(line) {
            Ok(AnswerOutcome::Correct { pair, round, .. }) => {
                screen.pending = None;
                writeln!(self.out, "Correct! {pair}")?;
                if let Some(summary) = round {
                    writeln!(
                        self.out,
                        "Round complete: {} correct, {} missed.",
                        summary.correct, summary.incorrect
                    )?;
                    if summary.is_clean() {
                        writeln!(self.out, "Perfect round!")?;
                    } else if !summary.hard.is_empty() {
                        let hard: Vec<String> =
                            summary.hard.iter().map(|p| p.to_string()).collect();
                        writeln!(self.out, "Missed more than once: {}", hard.join(", "))?;
                    }
                    writeln!(self.out, "Starting a new round.")?;
                }
                self.save_error_stats();
                self.show_prompt()?;
            }
            Ok(AnswerOutcome::Incorrect { pair, advance }) => {
                screen.pending = Some((advance, now + advance.delay));
                writeln!(self.out, "Incorrect. {} is \"{}\".", pair.kana, pair.romaji)?;
                self.save_error_stats();
            }
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(Flow::Continue)
    }

    fn alphabet_command(&mut self, command: &str) -> Result<Flow> {
        let Screen::Alphabet(screen) = &mut self.screen else {
            return Ok(Flow::Continue);
        };
        let args: Vec<&str> = command.split_whitespace().collect();
        let mut restarted = false;

        match args.as_slice() {
            ["quit"] | ["q"] => {
                self.shutdown()?;
                return Ok(Flow::Quit);
            }
            ["help"] => {
                for line in ALPHABET_HELP {
                    writeln!(self.out, "{line}")?;
                }
            }
            ["row", script, row, state] => {
                let (Some(script), Ok(row), Some(on)) =
                    (Script::from_name(script), row.parse::<usize>(), parse_switch(state))
                else {
                    writeln!(self.out, "Usage: :row <script> <n> on|off")?;
                    return Ok(Flow::Continue);
                };
                match screen.quiz.set_row_enabled(script, row.wrapping_sub(1), on) {
                    Ok(Toggle::Applied) => restarted = true,
                    Ok(Toggle::Unchanged) => {
                        writeln!(self.out, "Row {row} of {script} is already {state}.")?
                    }
                    Ok(Toggle::Rejected) => {
                        writeln!(self.out, "At least one {script} row must stay selected.")?
                    }
                    Err(QuizError::RowOutOfRange { rows, .. }) => {
                        writeln!(self.out, "{script} has rows 1 to {rows}.")?
                    }
                    Err(e) => writeln!(self.out, "{e}")?,
                }
            }
            ["script", script, state] => {
                let (Some(script), Some(on)) = (Script::from_name(script), parse_switch(state))
                else {
                    writeln!(self.out, "Usage: :script <script> on|off")?;
                    return Ok(Flow::Continue);
                };
                restarted = screen.quiz.set_script_enabled(script, on) == Toggle::Applied;
            }
            ["times", n] => {
                let Ok(n) = n.parse::<u32>() else {
                    writeln!(self.out, "Usage: :times <n>")?;
                    return Ok(Flow::Continue);
                };
                restarted = screen.quiz.set_times_to_show(n) == Toggle::Applied;
            }
            ["weighted", state] => {
                let Some(on) = parse_switch(state) else {
                    writeln!(self.out, "Usage: :weighted on|off")?;
                    return Ok(Flow::Continue);
                };
                screen.quiz.set_weighted(on);
                writeln!(self.out, "Weighted practice {state}.")?;
                self.save_settings();
            }
            ["hard"] => {
                let hardest = screen.quiz.stats().hardest(HARDEST_LISTED);
                if hardest.is_empty() {
                    writeln!(self.out, "No missed characters recorded.")?;
                }
                for (pair, weight) in hardest {
                    writeln!(self.out, "  {pair}: {weight}")?;
                }
            }
            ["reset-stats"] => {
                screen.quiz.reset_error_stats();
                screen.pending = None;
                self.save_error_stats();
                writeln!(self.out, "Missed-character history cleared.")?;
                self.show_prompt()?;
            }
            _ => writeln!(self.out, "Unknown command :{command}. Try :help.")?,
        }

        if restarted {
            if let Screen::Alphabet(screen) = &mut self.screen {
                screen.pending = None;
            }
            writeln!(self.out, "Settings changed, starting a new round.")?;
            self.save_settings();
            self.show_prompt()?;
        }
        Ok(Flow::Continue)
    }

    fn save_settings(&mut self) {
        let Screen::Alphabet(screen) = &self.screen else {
            return;
        };
        self.prefs.set_quiz_settings(screen.quiz.settings());
        self.prefs.error_stats = screen.quiz.stats().clone();
        if let Err(e) = self.store.save_preferences(&self.profile, &self.prefs) {
            warn!(error = %e, "could not save preferences");
        }
    }

    fn save_error_stats(&mut self) {
        let Screen::Alphabet(screen) = &self.screen else {
            return;
        };
        if let Err(e) = self.store.save_error_stats(&self.profile, screen.quiz.stats()) {
            warn!(error = %e, "could not save error stats");
        }
    }

    fn vocabulary_line(&mut self, line: &str, now: Instant) -> Result<Flow> {
        let Screen::Vocabulary(screen) = &mut self.screen else {
            return Ok(Flow::Continue);
        };

        if screen.quiz.is_finished() {
            match line {
                "r" => {
                    screen.quiz.restart();
                    writeln!(self.out, "Reshuffled. Starting again.")?;
                    self.show_prompt()?;
                }
                "q" | ":quit" => return Ok(Flow::Quit),
                _ => writeln!(self.out, "Press r to restart or q to quit.")?,
            }
            return Ok(Flow::Continue);
        }

        if screen.quiz.is_awaiting_ack() {
            screen.countdown = None;
            screen.quiz.acknowledge();
            return self.after_vocabulary_step().map(|()| Flow::Continue);
        }

        match line {
            ":quit" => return Ok(Flow::Quit),
            ":hint" => {
                match screen.quiz.request_hint() {
                    Some(hint) => writeln!(self.out, "Hint: {hint}")?,
                    None => writeln!(self.out, "No hint for this word.")?,
                }
                return Ok(Flow::Continue);
            }
            _ => {}
        }
        if let Some(command) = line.strip_prefix(':') {
            let args: Vec<&str> = command.split_whitespace().collect();
            match args.as_slice() {
                ["comments", state] if parse_switch(state).is_some() => {
                    let show = parse_switch(state) == Some(true);
                    screen.quiz.set_show_comments_on_correct(show);
                    self.prefs.show_comments_on_correct = show;
                    if let Err(e) = self.store.set_show_comments(&self.profile, show) {
                        warn!(error = %e, "could not save preferences");
                    }
                    writeln!(self.out, "Comments on correct answers {state}.")?;
                }
                ["duration", n] if n.parse::<u32>().is_ok_and(|n| (1..=10).contains(&n)) => {
                    let seconds = n.parse::<u32>().unwrap_or(self.prefs.message_duration);
                    self.prefs.message_duration = seconds;
                    if let Err(e) = self.store.set_message_duration(&self.profile, seconds) {
                        warn!(error = %e, "could not save preferences");
                    }
                    writeln!(self.out, "Feedback stays up for {seconds} seconds.")?;
                }
                [field @ ("romaji" | "english"), state] if parse_switch(state).is_some() => {
                    let on = parse_switch(state) == Some(true);
                    let mut categories = screen.quiz.categories();
                    if *field == "romaji" {
                        categories.set_romaji(on);
                    } else {
                        categories.set_english(on);
                    }
                    if categories == screen.quiz.categories() {
                        writeln!(self.out, "Nothing to change.")?;
                        return Ok(Flow::Continue);
                    }
                    screen.quiz.set_categories(categories);
                    writeln!(self.out, "Answer fields changed, starting the pass over.")?;
                    self.show_prompt()?;
                }
                _ => writeln!(
                    self.out,
                    "Commands: :hint, :romaji on|off, :english on|off, :comments on|off, \
                     :duration <1-10>, :quit"
                )?,
            }
            return Ok(Flow::Continue);
        }

        match screen.quiz.submit(line) {
            Ok(None) => {}
            Ok(Some(feedback)) => {
                render_feedback(&mut self.out, &feedback)?;
                if feedback.needs_ack {
                    let countdown = Countdown::new(self.prefs.message_duration);
                    writeln!(self.out, "{} Press Enter to continue.", countdown.label())?;
                    screen.countdown = Some((countdown, now));
                } else {
                    self.after_vocabulary_step()?;
                }
            }
            Err(e) => writeln!(self.out, "{e}")?,
        }
        Ok(Flow::Continue)
    }

    /// Show the next word, or the report once the pass is over.
    fn after_vocabulary_step(&mut self) -> Result<()> {
        let Screen::Vocabulary(screen) = &self.screen else {
            return Ok(());
        };
        let Some(report) = screen.quiz.report() else {
            return self.show_prompt();
        };

        render_report(&mut self.out, &report)?;
        match self.store.record_score(
            &self.profile,
            &screen.name,
            report.romaji_percent(),
            report.english_percent(),
        ) {
            Ok(true) => writeln!(self.out, "New best score for {}!", screen.name)?,
            Ok(false) => {}
            Err(e) => warn!(error = %e, "could not save score"),
        }
        writeln!(self.out, "Press r to restart or q to quit.")?;
        Ok(())
    }
}

/// A change to a profile's custom word selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionEdit {
    List,
    Add(Vec<usize>),
    AddAll,
    Remove(Vec<usize>),
    Clear,
}

/// Show or change the words practiced with the "Selected Words" set. Words
/// are numbered from 1 across every vocabulary, in file order.
pub fn edit_selection<W: Write>(
    store: &JsonStore,
    profile: &str,
    vocabularies: &VocabularyFile,
    edit: &SelectionEdit,
    out: &mut W,
) -> Result<()> {
    let words = vocabularies.all_words();
    let mut selected = store.load_preferences(profile).selected_words;
    let word_at = |n: usize| n.checked_sub(1).and_then(|i| words.get(i));

    match edit {
        SelectionEdit::List => {
            let mut number = 0;
            for vocabulary in &vocabularies.vocabularies {
                writeln!(out, "{}", vocabulary.name)?;
                for word in &vocabulary.words {
                    number += 1;
                    let mark = if selected.contains(&word.selection_key()) {
                        'x'
                    } else {
                        ' '
                    };
                    writeln!(
                        out,
                        "  [{mark}] {number}. {} ({}, {})",
                        word.primary_form(),
                        word.romaji,
                        word.english
                    )?;
                }
            }
            let count = words
                .iter()
                .filter(|w| selected.contains(&w.selection_key()))
                .count();
            writeln!(out, "{count} of {} words selected.", words.len())?;
            return Ok(());
        }
        SelectionEdit::Add(numbers) => {
            for &n in numbers {
                match word_at(n) {
                    Some(word) => {
                        let key = word.selection_key();
                        if !selected.contains(&key) {
                            selected.push(key);
                        }
                    }
                    None => writeln!(out, "No word numbered {n}.")?,
                }
            }
        }
        SelectionEdit::AddAll => {
            for word in &words {
                let key = word.selection_key();
                if !selected.contains(&key) {
                    selected.push(key);
                }
            }
        }
        SelectionEdit::Remove(numbers) => {
            for &n in numbers {
                match word_at(n) {
                    Some(word) => {
                        let key = word.selection_key();
                        selected.retain(|k| *k != key);
                    }
                    None => writeln!(out, "No word numbered {n}.")?,
                }
            }
        }
        SelectionEdit::Clear => selected.clear(),
    }

    store.save_selected_words(profile, &selected)?;
    info!(profile, selected = selected.len(), "word selection saved");
    writeln!(out, "{} words selected.", selected.len())?;
    Ok(())
}

fn parse_switch(state: &str) -> Option<bool> {
    match state {
        "on" => Some(true),
        "off" => Some(false),
        _ => None,
    }
}

/// Mismatched characters are wrapped in brackets.
fn render_diff(diff: &[DiffChar]) -> String {
    diff.iter()
        .map(|d| {
            if d.matches {
                d.ch.to_string()
            } else {
                format!("[{}]", d.ch)
            }
        })
        .collect()
}

fn render_check<W: Write>(out: &mut W, label: &str, check: &FieldCheck) -> Result<()> {
    if check.correct {
        writeln!(out, "  {label}: {} (correct)", check.expected)?;
    } else if label == "Romaji" {
        writeln!(
            out,
            "  {label}: you typed \"{}\", answer is {}",
            check.given,
            render_diff(&check.diff())
        )?;
    } else {
        writeln!(
            out,
            "  {label}: you typed \"{}\", answer is {}",
            check.given, check.expected
        )?;
    }
    Ok(())
}

fn render_feedback<W: Write>(out: &mut W, feedback: &Feedback) -> Result<()> {
    if feedback.correct {
        writeln!(out, "Correct!")?;
    } else {
        writeln!(out, "Not quite.")?;
        if let Some(check) = &feedback.romaji {
            render_check(out, "Romaji", check)?;
        }
        if let Some(check) = &feedback.english {
            render_check(out, "English", check)?;
        }
    }
    if let Some(comment) = &feedback.comment {
        writeln!(out, "Note: {comment}")?;
    }
    Ok(())
}

fn render_report<W: Write>(out: &mut W, report: &VocabularyReport) -> Result<()> {
    writeln!(
        out,
        "Finished! ({})",
        report.finished_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
    )?;
    if let Some(score) = report.romaji {
        writeln!(
            out,
            "  Romaji:  {:.1}% ({} of {}), {}",
            score.percent(),
            score.correct,
            score.attempts(),
            score.grade().label()
        )?;
    }
    if let Some(score) = report.english {
        writeln!(
            out,
            "  English: {:.1}% ({} of {}), {}",
            score.percent(),
            score.correct,
            score.attempts(),
            score.grade().label()
        )?;
    }
    if let Some(overall) = report.overall_percent() {
        writeln!(out, "  Overall: {overall:.1}%")?;
    }
    writeln!(out, "  Hints used: {}", report.hints_used)?;
    if report.is_perfect() {
        writeln!(out, "Perfect! No mistakes.")?;
    } else {
        writeln!(out, "Words to review:")?;
        for mistake in &report.mistakes {
            let plural = if mistake.count == 1 { "" } else { "s" };
            writeln!(
                out,
                "  {} ({}, {}): {} mistake{plural}",
                mistake.word.primary_form(),
                mistake.word.romaji,
                mistake.word.english,
                mistake.count
            )?;
        }
    }
    Ok(())
}
