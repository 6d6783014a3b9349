mod app;
mod event;

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Flow, SelectionEdit, edit_selection};
use event::{AppEvent, EventHandler};
use kanadr::config::Config;
use kanadr::content::vocabulary::PracticeSet;
use kanadr::session::vocabulary::Categories;
use kanadr::store::json_store::JsonStore;

#[derive(Parser)]
#[command(
    name = "kanadr",
    version,
    about = "Terminal kana and vocabulary quiz with adaptive practice"
)]
struct Cli {
    #[arg(short, long, default_value = "default", help = "Profile name")]
    profile: String,

    #[arg(long, help = "Directory holding profiles, vocabularies and scores")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Practice reading hiragana, katakana and kanji
    Alphabet,
    /// Practice a vocabulary list
    Vocab(VocabArgs),
    /// List known profiles
    Profiles,
    /// Show best vocabulary scores for the profile
    Scores,
    /// Choose the words practiced with `vocab --selected`
    Select {
        #[command(subcommand)]
        action: SelectAction,
    },
    /// Write the current settings to the config file
    Config,
}

#[derive(Subcommand)]
enum SelectAction {
    /// Number every word and mark the selected ones
    List,
    /// Select words by number, or every word with --all
    Add {
        #[arg(required_unless_present = "all")]
        numbers: Vec<usize>,
        #[arg(long, conflicts_with = "numbers")]
        all: bool,
    },
    /// Deselect words by number
    Remove {
        #[arg(required = true)]
        numbers: Vec<usize>,
    },
    /// Deselect every word
    Clear,
}

#[derive(Args)]
struct VocabArgs {
    #[arg(
        long,
        conflicts_with_all = ["selected", "name"],
        help = "Practice every vocabulary at once"
    )]
    all: bool,

    #[arg(long, conflicts_with = "name", help = "Practice the profile's selected words")]
    selected: bool,

    #[arg(long, help = "Vocabulary to practice (defaults to the first one)")]
    name: Option<String>,

    #[arg(long, help = "Ask for romaji")]
    romaji: bool,

    #[arg(long, help = "Ask for the English meaning")]
    english: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_default();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("kanadr={}", config.log_level))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(|| config.data_path());
    let store = JsonStore::with_base_dir(data_dir)?;
    let stdout = io::stdout();

    let mut app = match cli.command {
        Command::Alphabet => App::alphabet(store, &cli.profile, &config, stdout)?,
        Command::Vocab(args) => {
            let vocabularies = store.load_vocabularies();
            let set = if args.all {
                PracticeSet::All
            } else if args.selected {
                PracticeSet::Selected
            } else if let Some(name) = &args.name {
                let idx = vocabularies.find(name).ok_or_else(|| {
                    anyhow!(
                        "Unknown vocabulary {name:?}. Known: {}",
                        vocabularies.names().join(", ")
                    )
                })?;
                PracticeSet::Named(idx)
            } else {
                PracticeSet::Named(0)
            };
            let categories = if !args.romaji && !args.english {
                Categories::BOTH
            } else {
                Categories::new(args.romaji, args.english)
            };
            App::vocabulary(store, &cli.profile, &vocabularies, set, categories, stdout)?
        }
        Command::Profiles => {
            let mut out = stdout.lock();
            for profile in store.list_profiles() {
                writeln!(out, "{profile}")?;
            }
            return Ok(());
        }
        Command::Scores => {
            let mut out = stdout.lock();
            let scores = store.load_scores();
            let Some(entries) = scores.for_profile(&cli.profile) else {
                writeln!(out, "No scores recorded for {}.", cli.profile)?;
                return Ok(());
            };
            for (vocabulary, score) in entries {
                writeln!(
                    out,
                    "{vocabulary}: romaji {:.1}%, english {:.1}%",
                    score.best_romaji_percent, score.best_english_percent
                )?;
            }
            return Ok(());
        }
        Command::Select { action } => {
            let vocabularies = store.load_vocabularies();
            let edit = match action {
                SelectAction::List => SelectionEdit::List,
                SelectAction::Add { all: true, .. } => SelectionEdit::AddAll,
                SelectAction::Add { numbers, .. } => SelectionEdit::Add(numbers),
                SelectAction::Remove { numbers } => SelectionEdit::Remove(numbers),
                SelectAction::Clear => SelectionEdit::Clear,
            };
            let mut out = stdout.lock();
            return edit_selection(&store, &cli.profile, &vocabularies, &edit, &mut out);
        }
        Command::Config => {
            config.save()?;
            writeln!(stdout.lock(), "Wrote {}", Config::config_path().display())?;
            return Ok(());
        }
    };

    let events = EventHandler::new(Duration::from_millis(100));
    run_app(&mut app, &events)
}

fn run_app<W: Write>(app: &mut App<W>, events: &EventHandler) -> Result<()> {
    loop {
        match events.next()? {
            AppEvent::Line(line) => {
                if app.handle_line(&line, Instant::now())? == Flow::Quit {
                    return Ok(());
                }
            }
            AppEvent::Tick => app.handle_tick(Instant::now())?,
            AppEvent::Eof => return app.shutdown(),
        }
    }
}
