//! questd: run quest verifications and chapter unlocks from the command line.

use anyhow::Context;
use clap::Parser;
use quest_engine::{CompletionService, EngineConfig, EngineMetrics, LogFormat, StoryService};
use quest_store::MemoryCompletionStore;
use quest_types::{QuestId, QuestRequirement, SubmissionEvidence, SystemClock, UnlockPayload, UserId};
use quest_verification::Chapter;
use quest_vision::UnconfiguredPolicy;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const SALT_LEN: usize = 16;

#[derive(Parser)]
#[command(name = "questd", about = "Quest completion verification engine")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "QUEST_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "QUEST_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "QUEST_LOG_FORMAT")]
    log_format: Option<String>,

    /// Classifier base URL (overrides `[vision] endpoint`).
    #[arg(long, env = "QUEST_VISION_ENDPOINT")]
    vision_endpoint: Option<String>,

    /// Classifier API key (overrides `[vision] api_key`).
    #[arg(long, env = "QUEST_VISION_API_KEY", hide_env_values = true)]
    vision_api_key: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Verify one submission against a quest and print the attempt as JSON.
    ///
    /// Completion counters live in memory for the duration of the command.
    Verify {
        /// Quest requirement JSON file.
        #[arg(long)]
        quest: PathBuf,
        /// Submission evidence JSON file.
        #[arg(long)]
        evidence: PathBuf,
        /// Submitting user id.
        #[arg(long)]
        user: String,
        /// Quest id (defaults to the requirement file stem).
        #[arg(long)]
        quest_id: Option<String>,
        /// Accept AI layers without a classifier, tagged as unverified.
        #[arg(long)]
        stand_in_ai: bool,
    },
    /// Try to unlock a chapter and print the outcome as JSON.
    Unlock {
        /// Chapter JSON file (id, condition, history).
        #[arg(long)]
        chapter: PathBuf,
        /// Unlock payload JSON file.
        #[arg(long)]
        payload: PathBuf,
        #[arg(long)]
        user: String,
        /// Treat the previous chapter as unlocked for this user.
        #[arg(long)]
        previous_unlocked: bool,
        /// Write the chapter (with its updated history) back to the file.
        #[arg(long)]
        save: bool,
    },
    /// Print the SHA-256 hash to store for a QR code payload.
    HashQr { code: String },
    /// Print an argon2 PHC hash to store for a chapter password.
    HashPassword { password: String },
    /// Print the effective configuration as TOML.
    Config,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

/// Fresh salt from the OS random source.
fn random_salt() -> anyhow::Result<[u8; SALT_LEN]> {
    let mut salt = [0u8; SALT_LEN];
    getrandom::getrandom(&mut salt)
        .map_err(|e| anyhow::anyhow!("failed to generate password salt: {e}"))?;
    Ok(salt)
}

fn load_config(cli: &Cli) -> anyhow::Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(endpoint) = &cli.vision_endpoint {
        config.vision.endpoint = Some(endpoint.clone());
    }
    if let Some(key) = &cli.vision_api_key {
        config.vision.api_key = Some(key.clone());
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(&cli)?;
    let format: LogFormat = config.log_format()?;
    quest_engine::init_logging(format, &config.log_level)?;

    let metrics = if config.enable_metrics {
        Some(Arc::new(EngineMetrics::new()?))
    } else {
        None
    };

    match cli.command {
        Command::Verify {
            quest,
            evidence,
            user,
            quest_id,
            stand_in_ai,
        } => {
            let requirement: QuestRequirement = read_json(&quest)?;
            let submission: SubmissionEvidence = read_json(&evidence)?;
            let quest_id = quest_id.unwrap_or_else(|| {
                quest
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "quest".to_string())
            });
            if stand_in_ai {
                config.vision.unconfigured_policy = UnconfiguredPolicy::StandIn;
            }

            let mut service = CompletionService::from_config(
                &config,
                Arc::new(MemoryCompletionStore::new()),
                Arc::new(SystemClock),
            )?;
            if let Some(m) = &metrics {
                service = service.with_metrics(Arc::clone(m));
            }

            let attempt = service
                .submit(
                    &QuestId::new(quest_id),
                    &requirement,
                    &UserId::new(user),
                    &submission,
                )
                .await?;
            if let Some(ms) = attempt.result().and_then(|r| r.duration_ms()) {
                tracing::info!(
                    state = %attempt.state().kind(),
                    took = %quest_utils::format_duration_ms(ms),
                    "verification finished"
                );
            }
            println!("{}", serde_json::to_string_pretty(&attempt)?);
        }
        Command::Unlock {
            chapter,
            payload,
            user,
            previous_unlocked,
            save,
        } => {
            let mut ch: Chapter = read_json(&chapter)?;
            let submitted: UnlockPayload = read_json(&payload)?;
            let mut service = StoryService::new(Arc::new(SystemClock));
            if let Some(m) = &metrics {
                service = service.with_metrics(Arc::clone(m));
            }
            let outcome = service.unlock(&mut ch, &UserId::new(user), &submitted, previous_unlocked)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if save {
                std::fs::write(&chapter, serde_json::to_string_pretty(&ch)?)
                    .with_context(|| format!("failed to write {}", chapter.display()))?;
            }
        }
        Command::HashQr { code } => {
            println!("{}", quest_crypto::sha256_hex(&code));
        }
        Command::HashPassword { password } => {
            let salt = random_salt()?;
            println!("{}", quest_crypto::hash_password(&password, &salt)?);
        }
        Command::Config => {
            print!("{}", config.redacted().to_toml_string()?);
        }
    }

    if let Some(m) = &metrics {
        eprintln!("{}", m.encode()?);
    }

    Ok(())
}
