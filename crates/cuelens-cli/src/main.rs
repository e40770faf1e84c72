//! Cuelens CLI
//!
//! Headless driver for the overlay engine. Replays a recorded script of
//! playback and input events against a cue file and prints one JSON line per
//! overlay event, or answers one-off active-cue queries.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};
use cuelens_core::core::cues::{locate, CueList};
use cuelens_core::core::settings::{OverlaySettings, SettingsStore};
use cuelens_core::core::source::{CueSourceLoader, FileJsonSource};
use cuelens_core::{parse_script, EchoProvider, EventSink, OverlayEvent, ReplayDriver};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cuelens-cli", about = "Replay subtitle overlay sessions headlessly")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a script of host events and print every overlay event
    Replay {
        /// Cue list (JSON)
        #[arg(long)]
        cues: PathBuf,

        /// Script: JSON array of steps
        #[arg(long)]
        script: PathBuf,

        /// Overlay settings file
        #[arg(long)]
        settings: Option<PathBuf>,
    },
    /// Print the cue active at a playback time
    Locate {
        /// Cue list (JSON)
        #[arg(long)]
        cues: PathBuf,

        /// Playback time in seconds
        #[arg(long, allow_negative_numbers = true)]
        time: f64,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Failed to read script {path}: {source}")]
    ScriptUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid script {path}: {reason}")]
    ScriptInvalid { path: PathBuf, reason: String },
}

// =============================================================================
// Output
// =============================================================================

/// Writes each event as one JSON line
struct JsonLinesSink<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: OverlayEvent) {
        let line = match event.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize overlay event: {}", e);
                return;
            }
        };
        let Ok(mut out) = self.out.lock() else {
            return;
        };
        if let Err(e) = writeln!(out, "{}", line) {
            warn!("Failed to write overlay event: {}", e);
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocateOutput {
    time: f64,
    index: Option<usize>,
    cue_id: Option<String>,
}

// =============================================================================
// Commands
// =============================================================================

/// Loads cues through the source loader; failures yield an empty list
async fn load_cues(path: &Path) -> CueList {
    let mut loader = CueSourceLoader::new();
    let (generation, result) = loader
        .load(Arc::new(FileJsonSource::new(path)))
        .wait()
        .await;
    loader.finish(generation, result).unwrap_or_default()
}

fn load_settings(path: Option<&Path>) -> OverlaySettings {
    match path {
        Some(path) => SettingsStore::at_path(path).load(),
        None => OverlaySettings::default(),
    }
}

async fn run_replay<W: Write + Send>(
    cues: &Path,
    script: &Path,
    settings: Option<&Path>,
    sink: JsonLinesSink<W>,
) -> Result<JsonLinesSink<W>, CliError> {
    let payload = tokio::fs::read_to_string(script)
        .await
        .map_err(|source| CliError::ScriptUnreadable {
            path: script.to_path_buf(),
            source,
        })?;
    let steps = parse_script(&payload).map_err(|e| CliError::ScriptInvalid {
        path: script.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut driver = ReplayDriver::new(load_settings(settings), Arc::new(EchoProvider), sink);
    driver.load_cues(load_cues(cues).await);
    driver.run(steps).await;

    Ok(driver.into_sink())
}

async fn run_locate(cues: &Path, time: f64) -> LocateOutput {
    let list = load_cues(cues).await;
    let index = locate(&list.cues, time, None);
    LocateOutput {
        time,
        index,
        cue_id: index.and_then(|i| list.get(i)).map(|cue| cue.id.clone()),
    }
}

fn init_logging() {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Replay {
            cues,
            script,
            settings,
        } => {
            info!("Replaying {} against {}", script.display(), cues.display());
            run_replay(
                &cues,
                &script,
                settings.as_deref(),
                JsonLinesSink::new(std::io::stdout()),
            )
            .await?;
        }
        Command::Locate { cues, time } => {
            let output = run_locate(&cues, time).await;
            println!("{}", serde_json::to_string(&output)?);
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CUES: &str = r#"{ "cues": [
        { "id": "a", "start": 0.0, "end": 2.0,
          "tracks": { "translation": { "tokens": ["hi", "there"] } } },
        { "id": "b", "start": 2.0, "end": 5.0,
          "tracks": { "translation": { "tokens": ["bye"] } } }
    ] }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_replay_args() {
        let cli = Cli::try_parse_from([
            "cuelens-cli",
            "replay",
            "--cues",
            "c.json",
            "--script",
            "s.json",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Replay { settings: None, .. }
        ));
    }

    #[test]
    fn test_parse_locate_requires_time() {
        assert!(Cli::try_parse_from(["cuelens-cli", "locate", "--cues", "c.json"]).is_err());
    }

    #[tokio::test]
    async fn test_replay_prints_json_lines() {
        let dir = TempDir::new().unwrap();
        let cues = write(&dir, "cues.json", CUES);
        let script = write(
            &dir,
            "script.json",
            r#"[ { "type": "seek", "time": 2.5 }, { "type": "key", "key": "enter" } ]"#,
        );

        let sink = run_replay(&cues, &script, None, JsonLinesSink::new(Vec::new()))
            .await
            .unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines[0]["event"], "cuesLoaded");
        assert_eq!(lines[1]["frame"]["cueId"], "b");
        assert_eq!(lines[2]["event"], "lookupIssued");
        assert_eq!(lines[3]["shown"], true);
        assert_eq!(lines[4]["frame"]["lookup"]["status"]["text"], "bye (translation)");
    }

    #[tokio::test]
    async fn test_replay_missing_script_is_error() {
        let dir = TempDir::new().unwrap();
        let cues = write(&dir, "cues.json", CUES);
        let result = run_replay(
            &cues,
            &dir.path().join("missing.json"),
            None,
            JsonLinesSink::new(Vec::new()),
        )
        .await;
        assert!(matches!(result, Err(CliError::ScriptUnreadable { .. })));
    }

    #[tokio::test]
    async fn test_replay_with_broken_cues_runs_empty() {
        let dir = TempDir::new().unwrap();
        let cues = write(&dir, "cues.json", "not json");
        let script = write(&dir, "script.json", r#"[ { "type": "play" } ]"#);

        let sink = run_replay(&cues, &script, None, JsonLinesSink::new(Vec::new()))
            .await
            .unwrap();
        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.starts_with(r#"{"event":"cuesLoaded","count":0}"#));
    }

    #[tokio::test]
    async fn test_locate() {
        let dir = TempDir::new().unwrap();
        let cues = write(&dir, "cues.json", CUES);

        let inside = run_locate(&cues, 1.5).await;
        assert_eq!(inside.index, Some(0));
        assert_eq!(inside.cue_id.as_deref(), Some("a"));

        let boundary = run_locate(&cues, 2.0).await;
        assert_eq!(boundary.index, Some(1));

        let after = run_locate(&cues, 6.0).await;
        assert_eq!(after.index, None);
        assert_eq!(after.cue_id, None);
    }
}
