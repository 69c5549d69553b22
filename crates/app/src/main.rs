use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use services::{AppServices, Clock};
use storage::repository::StoreScope;
use study_core::game::{EliminationPolicy, GameConfig, TimerMode};
use study_core::model::{AiSettings, AiSettingsDraft, AiSettingsError, Category};

mod play;

const DEFAULT_DB_URL: &str = "sqlite://study.sqlite3";
const DEFAULT_PLAYER: &str = "guest";

#[derive(Debug, Error)]
enum ArgsError {
    #[error("invalid --db value: {raw}")]
    InvalidDbUrl { raw: String },
}

#[derive(Parser)]
#[command(name = "study-quiz", version, about = "Levelled quiz games in the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game
    Play(PlayArgs),
    /// List categories and their default rules
    Categories,
    /// Show saved progress for a player
    Progress(StoreArgs),
}

#[derive(clap::Args)]
struct StoreArgs {
    /// Player id (defaults to STUDY_PLAYER, then "guest")
    #[arg(long)]
    player: Option<String>,
    /// SQLite URL or path (defaults to STUDY_DB_URL)
    #[arg(long)]
    db: Option<String>,
}

#[derive(clap::Args)]
struct PlayArgs {
    #[arg(long, default_value = "k12-quiz")]
    category: Category,
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
    /// Countdown in seconds; shared by the whole game unless --per-problem
    #[arg(long, conflicts_with = "untimed")]
    timer: Option<u32>,
    /// Restart the countdown for every problem
    #[arg(long, requires = "timer")]
    per_problem: bool,
    #[arg(long)]
    untimed: bool,
    #[arg(long)]
    max_level: Option<u32>,
    /// Skip penalty per level; skipping is disabled with --no-skip
    #[arg(long, conflicts_with = "no_skip")]
    skip_rate: Option<f64>,
    #[arg(long)]
    no_skip: bool,
    /// Play on built-in practice problems only
    #[arg(long)]
    offline: bool,
    #[command(flatten)]
    store: StoreArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Strict,
    Reveal,
}

impl From<PolicyArg> for EliminationPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Strict => EliminationPolicy::StrictElimination,
            PolicyArg::Reveal => EliminationPolicy::RevealAndContinue,
        }
    }
}

impl PlayArgs {
    /// Category defaults with command-line overrides applied.
    fn game_config(&self) -> Result<GameConfig, study_core::Error> {
        let defaults = GameConfig::for_category(self.category);

        let timer = match (self.untimed, self.timer, self.per_problem) {
            (true, _, _) => TimerMode::Untimed,
            (false, Some(secs), true) => TimerMode::PerProblem(secs),
            (false, Some(secs), false) => TimerMode::PerSession(secs),
            (false, None, _) => defaults.timer(),
        };
        let skip_rate = if self.no_skip {
            None
        } else {
            self.skip_rate.or(defaults.skip_penalty_rate())
        };

        Ok(GameConfig::new(
            self.category,
            self.max_level.unwrap_or(defaults.max_level()),
            self.policy.map_or(defaults.policy(), Into::into),
            timer,
            skip_rate,
        )?)
    }
}

impl StoreArgs {
    fn scope(&self) -> Result<StoreScope, Box<dyn std::error::Error>> {
        let player = self
            .player
            .clone()
            .or_else(|| std::env::var("STUDY_PLAYER").ok())
            .unwrap_or_else(|| DEFAULT_PLAYER.to_string());
        Ok(StoreScope::new(&player)?)
    }

    fn db_url(&self) -> Result<String, ArgsError> {
        let raw = self
            .db
            .clone()
            .or_else(|| std::env::var("STUDY_DB_URL").ok())
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        if raw.trim().is_empty() {
            return Err(ArgsError::InvalidDbUrl { raw });
        }
        Ok(normalize_sqlite_url(raw))
    }

    async fn open(
        &self,
        ai: Option<AiSettings>,
    ) -> Result<AppServices, Box<dyn std::error::Error>> {
        let db_url = self.db_url()?;
        ensure_parent_dir(&db_url)?;
        Ok(AppServices::new_sqlite(&db_url, Clock::system(), ai).await?)
    }
}

/// Model settings from the environment; a missing key means offline play.
fn ai_settings(offline: bool) -> Result<Option<AiSettings>, AiSettingsError> {
    if offline {
        return Ok(None);
    }
    match AiSettingsDraft::from_env().validate() {
        Ok(settings) => Ok(Some(settings)),
        Err(AiSettingsError::MissingApiKey) => Ok(None),
        Err(err) => Err(err),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// `SQLite` creates the database file but not its directory.
fn ensure_parent_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = Path::new(path.split('?').next().unwrap_or(path));
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn describe_timer(timer: TimerMode) -> String {
    match timer {
        TimerMode::Untimed => "untimed".to_string(),
        TimerMode::PerSession(secs) => format!("{secs}s per game"),
        TimerMode::PerProblem(secs) => format!("{secs}s per problem"),
    }
}

fn print_categories() {
    for category in Category::ALL {
        let config = GameConfig::for_category(category);
        let policy = match config.policy() {
            EliminationPolicy::StrictElimination => "strict",
            EliminationPolicy::RevealAndContinue => "reveal",
        };
        let skip = config
            .skip_penalty_rate()
            .map_or_else(|| "no skip".to_string(), |rate| format!("skip costs {rate}×level"));
        println!(
            "{:<18} {:<16} {} levels, {policy}, {}, {skip}",
            category.slug(),
            category.title(),
            config.max_level(),
            describe_timer(config.timer()),
        );
    }
}

async fn print_progress(args: &StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let scope = args.scope()?;
    let services = args.open(None).await?;
    let entries = services.progress().all(&scope).await?;
    if entries.is_empty() {
        println!("No games recorded for {scope} yet.");
        return Ok(());
    }

    println!("Progress for {scope}:");
    for (category, progress) in entries {
        let last = progress
            .last_played_at
            .map_or_else(String::new, |at| format!(", last played {}", at.format("%Y-%m-%d")));
        println!(
            "  {:<16} {} games, best score {}, highest level {}{last}",
            category.title(),
            progress.games_played,
            progress.best_score,
            progress.highest_level,
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    match Cli::parse().command {
        Commands::Play(args) => {
            let config = args.game_config()?;
            let scope = args.store.scope()?;
            let ai = ai_settings(args.offline)?;
            let services = args.store.open(ai).await?;
            play::run(&services, &scope, config).await
        }
        Commands::Categories => {
            print_categories();
            Ok(())
        }
        Commands::Progress(args) => print_progress(&args).await,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("error: {err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> PlayArgs {
        let mut argv = vec!["study-quiz", "play"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Play(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn defaults_follow_the_category() {
        let config = parse(&["--category", "bodmas"]).game_config().unwrap();
        assert_eq!(config, GameConfig::for_category(Category::Bodmas));
    }

    #[test]
    fn overrides_replace_defaults() {
        let config = parse(&[
            "--category",
            "logic-riddle",
            "--policy",
            "strict",
            "--timer",
            "20",
            "--per-problem",
            "--max-level",
            "3",
            "--skip-rate",
            "2",
        ])
        .game_config()
        .unwrap();

        assert_eq!(config.policy(), EliminationPolicy::StrictElimination);
        assert_eq!(config.timer(), TimerMode::PerProblem(20));
        assert_eq!(config.max_level(), 3);
        assert_eq!(config.skip_penalty_rate(), Some(2.0));
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        let err = parse(&["--max-level", "0"]).game_config().unwrap_err();
        assert!(matches!(err, study_core::Error::GameConfig(_)));

        assert!(Cli::try_parse_from(["study-quiz", "play", "--category", "chess"]).is_err());
    }

    #[test]
    fn relative_paths_become_absolute_urls() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/q.sqlite3".into()),
            "sqlite:///tmp/q.sqlite3"
        );
        assert!(normalize_sqlite_url("data/q.sqlite3".into()).starts_with("sqlite:///"));
    }
}
