use std::fmt;
use std::path::{Path, PathBuf};

use cefr_core::model::{GrammarItem, Level, QuizMode, SelfGrade, VocabularyItem};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, Clock, PreconditionError};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: &'static str, flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => write!(f, "{command} requires {flag}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cefr-drill next          --level <A1|A2|B1|B2> --words <file.json> [--listening] [--count <n>]");
    eprintln!("  cefr-drill grade         --level <lvl> --headword <word> --mode <1-5> --score <0|5|10>");
    eprintln!("  cefr-drill scores        --level <lvl> (--words <file.json> | --headword <word>)");
    eprintln!("  cefr-drill read          --level <lvl> --name <grammar item>");
    eprintln!("  cefr-drill grammar-stats --level <lvl> --grammar <file.json>");
    eprintln!("  cefr-drill export        [--out <file.json>]");
    eprintln!("  cefr-drill import        --in <file.json>");
    eprintln!();
    eprintln!("Options for every command:");
    eprintln!("  --db <sqlite_url>        durable store (default sqlite://progress.sqlite3)");
    eprintln!("  --session-file <path>    volatile store loaded from and saved to a progress document");
    eprintln!("  --seed <u64>             reproducible draws");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  CEFR_DB_URL, CEFR_SESSION_FILE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Next,
    Grade,
    Scores,
    Read,
    GrammarStats,
    Export,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "next" => Some(Self::Next),
            "grade" => Some(Self::Grade),
            "scores" => Some(Self::Scores),
            "read" => Some(Self::Read),
            "grammar-stats" => Some(Self::GrammarStats),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Next => "next",
            Self::Grade => "grade",
            Self::Scores => "scores",
            Self::Read => "read",
            Self::GrammarStats => "grammar-stats",
            Self::Export => "export",
            Self::Import => "import",
        }
    }

    fn mutates(self) -> bool {
        matches!(self, Self::Grade | Self::Read | Self::Import)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Backend {
    Sqlite(String),
    Session(PathBuf),
}

#[derive(Debug, Default)]
struct Args {
    db_url: Option<String>,
    session_file: Option<PathBuf>,
    seed: Option<u64>,
    level: Option<String>,
    words: Option<PathBuf>,
    grammar: Option<PathBuf>,
    headword: Option<String>,
    name: Option<String>,
    mode: Option<i64>,
    score: Option<i64>,
    count: Option<usize>,
    listening: bool,
    out: Option<PathBuf>,
    input: Option<PathBuf>,
}

fn parse_number<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("CEFR_DB_URL").ok().map(normalize_sqlite_url),
            session_file: std::env::var("CEFR_SESSION_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),
            ..Self::default()
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = Some(normalize_sqlite_url(value));
                }
                "--session-file" => {
                    parsed.session_file = Some(require_value(args, "--session-file")?.into());
                }
                "--seed" => parsed.seed = Some(parse_number(require_value(args, "--seed")?, "--seed")?),
                "--level" => parsed.level = Some(require_value(args, "--level")?),
                "--words" => parsed.words = Some(require_value(args, "--words")?.into()),
                "--grammar" => parsed.grammar = Some(require_value(args, "--grammar")?.into()),
                "--headword" => parsed.headword = Some(require_value(args, "--headword")?),
                "--name" => parsed.name = Some(require_value(args, "--name")?),
                "--mode" => parsed.mode = Some(parse_number(require_value(args, "--mode")?, "--mode")?),
                "--score" => {
                    parsed.score = Some(parse_number(require_value(args, "--score")?, "--score")?);
                }
                "--count" => {
                    parsed.count = Some(parse_number(require_value(args, "--count")?, "--count")?);
                }
                "--listening" => parsed.listening = true,
                "--out" => parsed.out = Some(require_value(args, "--out")?.into()),
                "--in" => parsed.input = Some(require_value(args, "--in")?.into()),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn backend(&self) -> Backend {
        match (&self.session_file, &self.db_url) {
            (Some(path), _) => Backend::Session(path.clone()),
            (None, Some(url)) => Backend::Sqlite(url.clone()),
            (None, None) => Backend::Sqlite(normalize_sqlite_url("sqlite://progress.sqlite3".into())),
        }
    }

    fn level(&self, command: Command) -> Result<Level, Box<dyn std::error::Error>> {
        let raw = required(&self.level, command, "--level")?;
        Ok(raw.parse::<Level>().map_err(PreconditionError::from)?)
    }

    fn enabled_modes(&self) -> &'static [QuizMode] {
        if self.listening {
            &QuizMode::ALL
        } else {
            &QuizMode::WITHOUT_LISTENING
        }
    }
}

fn required<'a, T>(
    value: &'a Option<T>,
    command: Command,
    flag: &'static str,
) -> Result<&'a T, ArgsError> {
    value.as_ref().ok_or(ArgsError::MissingFlag {
        command: command.name(),
        flag,
    })
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.starts_with("sqlite:file:") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite:file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Reads a JSON array of vocabulary rows, dropping rows without a headword.
fn load_words(path: &Path) -> Result<Vec<VocabularyItem>, Box<dyn std::error::Error>> {
    let rows: Vec<VocabularyItem> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let total = rows.len();
    let kept: Vec<VocabularyItem> = rows.into_iter().filter(|r| r.validate().is_ok()).collect();
    if kept.len() < total {
        log::warn!(
            "{}: dropped {} row(s) with an empty headword",
            path.display(),
            total - kept.len()
        );
    }
    Ok(kept)
}

fn load_grammar(path: &Path) -> Result<Vec<GrammarItem>, Box<dyn std::error::Error>> {
    let rows: Vec<GrammarItem> = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let total = rows.len();
    let kept: Vec<GrammarItem> = rows.into_iter().filter(|r| r.validate().is_ok()).collect();
    if kept.len() < total {
        log::warn!(
            "{}: dropped {} row(s) with an empty name",
            path.display(),
            total - kept.len()
        );
    }
    Ok(kept)
}

async fn open_services(backend: &Backend) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::System;
    match backend {
        Backend::Sqlite(url) => {
            prepare_sqlite_file(url)?;
            Ok(AppServices::new_sqlite(url, clock).await?)
        }
        Backend::Session(path) => {
            let app = AppServices::in_memory(clock);
            if path.exists() {
                let json = std::fs::read_to_string(path)?;
                app.serializer().import_json(&json).await?;
                log::debug!("session store loaded from {}", path.display());
            }
            Ok(app)
        }
    }
}

async fn save_session(app: &AppServices, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let json = app.serializer().export_json().await?;
    std::fs::write(path, json)?;
    log::debug!("session store saved to {}", path.display());
    Ok(())
}

async fn execute(
    cmd: Command,
    args: &Args,
    app: &AppServices,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Command::Next => {
            let level = args.level(cmd)?;
            let words = load_words(required(&args.words, cmd, "--words")?)?;
            let mut rng = match args.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            for _ in 0..args.count.unwrap_or(1) {
                let turn = app
                    .selector()
                    .next_turn(level, &words, args.enabled_modes(), &mut rng)
                    .await?;
                let item = &words[turn.index];
                if !item.supports_mode(turn.mode) {
                    log::warn!(
                        "{:?} has no example sentence; {} cannot be presented",
                        item.headword,
                        turn.mode.label()
                    );
                }
                println!("{}\t{}\t{}", item.headword, turn.mode.number(), turn.mode.label());
            }
        }
        Command::Grade => {
            let level = args.level(cmd)?;
            let headword = required(&args.headword, cmd, "--headword")?;
            let mode = QuizMode::try_from(*required(&args.mode, cmd, "--mode")?)?;
            let grade = SelfGrade::from_points(*required(&args.score, cmd, "--score")?)?;
            let stored = app
                .progress()
                .set_word_mode_score(level, headword, mode, grade)
                .await?;
            println!("score {} attempts {}", stored.score, stored.attempts);
        }
        Command::Scores => {
            let level = args.level(cmd)?;
            if let Some(headword) = &args.headword {
                let breakdown = app.progress().word_mode_breakdown(level, headword).await?;
                for mode in QuizMode::ALL {
                    let score = breakdown.get(mode);
                    println!(
                        "{}\t{}\t{}\t{}",
                        mode.number(),
                        mode.label(),
                        score.score,
                        score.attempts
                    );
                }
                println!("total\t{}", breakdown.total());
            } else {
                let words = load_words(required(&args.words, cmd, "--words")?)?;
                let headwords: Vec<&str> = words.iter().map(|w| w.headword.as_str()).collect();
                let totals = app.aggregator().get_all_word_totals(level, &headwords).await?;
                let mut rows: Vec<(&String, &i64)> = totals.iter().collect();
                rows.sort();
                for (headword, total) in rows {
                    println!("{headword}\t{total}");
                }
            }
        }
        Command::Read => {
            let level = args.level(cmd)?;
            let name = required(&args.name, cmd, "--name")?;
            let count = app.progress().mark_grammar_read(level, name).await?;
            println!("read {count} time(s)");
        }
        Command::GrammarStats => {
            let level = args.level(cmd)?;
            let items = load_grammar(required(&args.grammar, cmd, "--grammar")?)?;
            let names: Vec<&str> = items.iter().map(|g| g.name.as_str()).collect();
            let stats = app.progress().grammar_read_stats(level, &names).await?;
            println!("{}/{}", stats.read_unique, stats.total);
        }
        Command::Export => {
            let json = app.serializer().export_json().await?;
            match &args.out {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
        }
        Command::Import => {
            let path = required(&args.input, cmd, "--in")?;
            let doc = app
                .serializer()
                .import_json(&std::fs::read_to_string(path)?)
                .await?;
            println!(
                "imported {} word score(s), {} grammar read(s)",
                doc.word_score_count(),
                doc.grammar_read_count()
            );
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            print_usage();
            ArgsError::UnknownCommand(first)
        })?,
    };

    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let backend = args.backend();
    let app = open_services(&backend).await?;
    execute(cmd, &args, &app).await?;

    if let Backend::Session(path) = &backend {
        if cmd.mutates() {
            save_session(&app, path).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
