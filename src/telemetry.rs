use std::collections::{BTreeMap, BTreeSet};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::RuntimeConfig;

pub fn unix_ms_now() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Rounds a latency figure to two decimals for event payloads.
pub fn round_metric(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One line of the JSONL event stream. Payload fields sit next to the
/// envelope fields rather than under a nested key.
#[derive(Debug, Serialize)]
struct EventRecord<'a> {
    ts_unix_ms: u128,
    event: &'a str,
    run_id: &'a str,
    command: &'a str,
    profile: &'a str,
    #[serde(flatten)]
    payload: Map<String, Value>,
}

/// Appends crew lifecycle events to a JSONL file. Write failures are logged
/// and never interrupt a run.
#[derive(Debug, Clone)]
pub struct TelemetrySink {
    pub enabled: bool,
    pub path: PathBuf,
    pub run_id: String,
    pub command: String,
    pub profile: String,
    file_lock: Arc<Mutex<()>>,
}

impl TelemetrySink {
    pub fn new(cfg: &RuntimeConfig, command: String) -> Self {
        Self {
            enabled: cfg.telemetry_enabled,
            path: PathBuf::from(&cfg.telemetry_path),
            run_id: format!("crew-{}-{}", unix_ms_now(), std::process::id()),
            command,
            profile: cfg.profile.clone(),
            file_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn emit(&self, event: &str, payload: Value) {
        if !self.enabled {
            return;
        }

        let record = EventRecord {
            ts_unix_ms: unix_ms_now(),
            event,
            run_id: &self.run_id,
            command: &self.command,
            profile: &self.profile,
            payload: match payload {
                Value::Object(map) => map,
                Value::Null => Map::new(),
                other => Map::from_iter([("value".to_string(), other)]),
            },
        };

        if let Err(err) = self.append(&record) {
            tracing::warn!(event, path = %self.path.display(), error = %err, "telemetry write failed");
        }
    }

    fn append(&self, record: &EventRecord<'_>) -> Result<()> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create telemetry directory '{}'", dir.display()))?;
        }

        let line = serde_json::to_string(record)
            .with_context(|| format!("failed to encode telemetry event '{}'", record.event))?;

        let _guard = self.file_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open telemetry path '{}'", self.path.display()))?;
        writeln!(file, "{line}").context("failed to append telemetry event")
    }
}

/// Envelope fields the report reads back. Unknown payload keys are ignored.
#[derive(Debug, Deserialize)]
struct LoggedEvent {
    #[serde(default)]
    ts_unix_ms: Option<u64>,
    #[serde(default)]
    event: String,
    #[serde(default)]
    run_id: String,
    #[serde(default)]
    command: String,
    #[serde(default)]
    latency_ms: Option<f64>,
}

#[derive(Debug, Default)]
pub struct TelemetrySummary {
    pub total_lines: usize,
    pub parsed_events: usize,
    pub parse_errors: usize,
    pub unique_runs: BTreeSet<String>,
    pub command_counts: BTreeMap<String, usize>,
    pub pipeline_started: usize,
    pub pipeline_completed: usize,
    pub pipeline_failed: usize,
    pub runs_blocked: usize,
    pub completed_latency_ms: Vec<f64>,
    pub last_event_ts_unix_ms: Option<u128>,
}

impl TelemetrySummary {
    pub fn mean_completed_latency_ms(&self) -> Option<f64> {
        if self.completed_latency_ms.is_empty() {
            return None;
        }
        let total = self.completed_latency_ms.iter().sum::<f64>();
        Some(round_metric(total / self.completed_latency_ms.len() as f64))
    }

    fn record(&mut self, event: LoggedEvent) {
        self.parsed_events += 1;
        if !event.run_id.is_empty() {
            self.unique_runs.insert(event.run_id);
        }
        if !event.command.is_empty() {
            *self.command_counts.entry(event.command).or_default() += 1;
        }
        if let Some(ts) = event.ts_unix_ms.map(u128::from) {
            self.last_event_ts_unix_ms = Some(self.last_event_ts_unix_ms.map_or(ts, |last| last.max(ts)));
        }

        match event.event.as_str() {
            "pipeline.started" => self.pipeline_started += 1,
            "pipeline.completed" => {
                self.pipeline_completed += 1;
                self.completed_latency_ms.extend(event.latency_ms);
            }
            "pipeline.failed" => self.pipeline_failed += 1,
            "session.blocked" => self.runs_blocked += 1,
            _ => {}
        }
    }
}

/// Summarizes the most recent `limit` lines of an event stream.
pub fn summarize_telemetry_lines(lines: Vec<String>, limit: usize) -> TelemetrySummary {
    let mut summary = TelemetrySummary {
        total_lines: lines.len(),
        ..TelemetrySummary::default()
    };

    for line in lines.iter().rev().take(limit.max(1)) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<LoggedEvent>(line) {
            Ok(event) => summary.record(event),
            Err(_) => summary.parse_errors += 1,
        }
    }

    summary
}

pub fn format_telemetry_report(path: &Path, summary: &TelemetrySummary) -> String {
    let mut out = format!(
        "Telemetry report\nPath: {}\nLines in file: {}\nEvents analyzed: {} (parse_errors={})\nUnique runs: {}\n",
        path.display(),
        summary.total_lines,
        summary.parsed_events,
        summary.parse_errors,
        summary.unique_runs.len()
    );
    out.push_str(&format!(
        "Crew runs: started={} completed={} failed={} blocked={}\n",
        summary.pipeline_started,
        summary.pipeline_completed,
        summary.pipeline_failed,
        summary.runs_blocked
    ));
    if let Some(mean) = summary.mean_completed_latency_ms() {
        out.push_str(&format!("Mean completed run latency: {mean} ms\n"));
    }

    let mut commands = summary.command_counts.iter().collect::<Vec<_>>();
    commands.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    if !commands.is_empty() {
        out.push_str("Top commands:\n");
        for (name, count) in commands.into_iter().take(5) {
            out.push_str(&format!("- {name}: {count}\n"));
        }
    }
    if let Some(ts) = summary.last_event_ts_unix_ms {
        out.push_str(&format!("Last event ts_unix_ms: {ts}\n"));
    }
    out
}

pub fn run_telemetry_report(
    cfg: &RuntimeConfig,
    path_override: Option<String>,
    limit: usize,
) -> Result<()> {
    let path = PathBuf::from(path_override.unwrap_or_else(|| cfg.telemetry_path.clone()));
    if !path.exists() {
        println!("No telemetry recorded yet at '{}'.", path.display());
        return Ok(());
    }

    let file = File::open(&path)
        .with_context(|| format!("failed to open telemetry file '{}'", path.display()))?;
    let lines = BufReader::new(file)
        .lines()
        .collect::<std::io::Result<Vec<String>>>()
        .with_context(|| format!("failed to read telemetry file '{}'", path.display()))?;

    print!("{}", format_telemetry_report(&path, &summarize_telemetry_lines(lines, limit)));
    Ok(())
}
