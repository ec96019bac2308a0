//! `syncdev replay`: feed recorded backend events through a fresh store.

use std::fmt::Write as _;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use syncdev_config::Config;
use syncdev_core::model::FolderPairId;
use syncdev_core::{
    Derivations, Derived, EventFilter, Observable, PairingSession, Progress, RawEvent,
    SinkStats, StateStore, Subscription, SyncStatus, UpdateSink, sink_channel, spawn_update_sink,
};

use super::util::open_input;
use crate::cli::{OutputFormat, ReplayArgs};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output::{self, Painter};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── Status line ─────────────────────────────────────────────────────

/// The derived progress strings a status bar would show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusLine {
    syncing: bool,
    percentage: f64,
    files: String,
    transfer: String,
    speed: String,
    eta: String,
}

impl StatusLine {
    fn is_idle(&self) -> bool {
        !self.syncing
            && self.percentage.abs() < f64::EPSILON
            && [&self.files, &self.transfer, &self.speed, &self.eta]
                .iter()
                .all(|s| s.is_empty())
    }

    fn render(&self) -> String {
        if self.is_idle() {
            return "idle".into();
        }
        let parts: Vec<&str> = [&self.files, &self.transfer, &self.speed, &self.eta]
            .into_iter()
            .map(String::as_str)
            .filter(|s| !s.is_empty())
            .collect();
        format!("{:>5.1}%  {}", self.percentage, parts.join("  "))
    }
}

/// Handles on the derived values that make up a status line.
struct Readout {
    is_syncing: Derived<bool>,
    percentage: Derived<f64>,
    files: Derived<String>,
    transfer: Derived<String>,
    speed: Derived<String>,
    eta: Derived<String>,
}

impl Readout {
    fn new(d: &Derivations) -> Self {
        Self {
            is_syncing: d.is_syncing.clone(),
            percentage: d.overall_percentage.clone(),
            files: d.file_count_progress.clone(),
            transfer: d.formatted_transfer.clone(),
            speed: d.formatted_speed.clone(),
            eta: d.formatted_eta.clone(),
        }
    }

    fn line(&self) -> StatusLine {
        StatusLine {
            syncing: *self.is_syncing.get(),
            percentage: *self.percentage.get(),
            files: self.files.get().to_string(),
            transfer: self.transfer.get().to_string(),
            speed: self.speed.get().to_string(),
            eta: self.eta.get().to_string(),
        }
    }
}

/// Records every change of the status line caused by a progress update.
struct StatusRecorder {
    lines: Arc<Mutex<Vec<StatusLine>>>,
    _subscription: Subscription,
}

impl StatusRecorder {
    fn attach(store: &StateStore) -> Self {
        let readout = Readout::new(store.derived());
        let lines = Arc::new(Mutex::new(Vec::new()));
        let last: Mutex<Option<StatusLine>> = Mutex::new(None);

        let sink = Arc::clone(&lines);
        let subscription = store.progress().subscribe(move |_: &Progress| {
            let line = readout.line();
            let mut last = lock(&last);
            if last.as_ref() == Some(&line) {
                return;
            }
            // The priming call only establishes the baseline.
            let primed = last.is_some();
            *last = Some(line.clone());
            if primed {
                lock(&sink).push(line);
            }
        });

        Self {
            lines,
            _subscription: subscription,
        }
    }

    fn take(&self) -> Vec<StatusLine> {
        std::mem::take(&mut *lock(&self.lines))
    }
}

// ── Report ──────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LineError {
    line: usize,
    error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PeerCounts {
    known: usize,
    online: usize,
    paired: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ActivityCounts {
    entries: usize,
    problems: usize,
    latest: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    sync_status: Arc<SyncStatus>,
    peers: PeerCounts,
    folder_pairs: usize,
    unreachable_folder_pairs: Arc<Vec<FolderPairId>>,
    activity: ActivityCounts,
    pairing: Arc<PairingSession>,
}

impl Summary {
    fn collect(store: &StateStore) -> Self {
        let d = store.derived();
        let events = store.events().get();
        let problems = EventFilter::Problems;

        Self {
            sync_status: store.sync_status().get(),
            peers: PeerCounts {
                known: store.peers().get().len(),
                online: *d.online_peer_count.get(),
                paired: d.paired_peers.get().len(),
            },
            folder_pairs: store.folder_pairs().get().len(),
            unreachable_folder_pairs: d.unreachable_folder_pairs.get(),
            activity: ActivityCounts {
                entries: events.len(),
                problems: events.iter().filter(|e| problems.matches(e)).count(),
                latest: events.latest().map(|e| e.message.clone()),
            },
            pairing: store.pairing().get(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplayReport {
    status_lines: Vec<StatusLine>,
    unparseable: Vec<LineError>,
    stats: SinkStats,
    summary: Summary,
}

impl ReplayReport {
    fn rejected(&self) -> u64 {
        self.stats.dropped + u64::try_from(self.unparseable.len()).unwrap_or(u64::MAX)
    }

    fn render_text(&self, p: Painter) -> String {
        let mut out = String::new();
        for line in &self.status_lines {
            let _ = writeln!(out, "{}", line.render());
        }
        if !self.status_lines.is_empty() {
            out.push('\n');
        }

        let s = &self.summary;
        let _ = writeln!(out, "{}", p.heading("Summary"));

        let rejected = self.rejected();
        let counts = format!(
            "{} applied, {} dropped, {} unparseable",
            self.stats.applied,
            self.stats.dropped,
            self.unparseable.len()
        );
        let counts = if rejected == 0 { p.good(&counts) } else { p.bad(&counts) };
        let _ = writeln!(out, "  events     {counts}");

        let status = if s.sync_status.action.is_empty() {
            s.sync_status.state.to_string()
        } else {
            format!("{} ({})", s.sync_status.state, s.sync_status.action)
        };
        let _ = writeln!(out, "  status     {status}");
        let _ = writeln!(
            out,
            "  peers      {} known, {} online, {} paired",
            s.peers.known, s.peers.online, s.peers.paired
        );
        let _ = writeln!(
            out,
            "  folders    {} configured, {} unreachable",
            s.folder_pairs,
            s.unreachable_folder_pairs.len()
        );

        let mut activity = format!(
            "{} entries, {} problems",
            s.activity.entries, s.activity.problems
        );
        if let Some(latest) = &s.activity.latest {
            let _ = write!(activity, "; latest: {}", p.dim(latest));
        }
        let _ = writeln!(out, "  activity   {activity}");

        let pairing = match &*s.pairing {
            PairingSession::Idle => "idle".to_owned(),
            PairingSession::Active { code, target } => match target {
                Some(peer) => format!("code {code} with {}", peer.display_name()),
                None => format!("code {code}"),
            },
        };
        let _ = write!(out, "  pairing    {pairing}");

        for bad in &self.unparseable {
            let _ = write!(out, "\n{}", p.bad(&format!("line {}: {}", bad.line, bad.error)));
        }
        out
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ReplayArgs, cfg: &Config, settings: Resolved) -> Result<(), CliError> {
    let mut store_config = cfg.to_store_config();
    if let Some(capacity) = args.capacity {
        store_config.event_log_capacity = capacity;
    }
    let store = Arc::new(StateStore::new(store_config));
    let recorder = StatusRecorder::attach(&store);

    let sink = Arc::new(UpdateSink::new(Arc::clone(&store)));
    let (handle, rx) = sink_channel();
    let task = spawn_update_sink(sink, rx, CancellationToken::new());

    let mut lines = open_input(&args.input).await?.lines();
    let mut line_no = 0;
    let mut unparseable = Vec::new();
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<RawEvent>(trimmed) {
            Ok(event) => handle.send(event)?,
            Err(e) => {
                warn!(line = line_no, error = %e, "skipping unparseable line");
                unparseable.push(LineError {
                    line: line_no,
                    error: e.to_string(),
                });
            }
        }
    }
    drop(handle);

    let stats = task.await?;
    info!(lines = line_no, applied = stats.applied, "replay finished");

    let report = ReplayReport {
        status_lines: recorder.take(),
        unparseable,
        stats,
        summary: Summary::collect(&store),
    };

    let rendered = match settings.output {
        OutputFormat::Text => {
            report.render_text(Painter::new(output::should_color(settings.color)))
        }
        OutputFormat::Json => output::render_json(&report)?,
    };
    output::print_output(&rendered, settings.quiet);

    let rejected = report.rejected();
    if args.strict && rejected > 0 {
        return Err(CliError::EventsRejected { count: rejected });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(syncing: bool, percentage: f64, speed: &str) -> StatusLine {
        StatusLine {
            syncing,
            percentage,
            files: if syncing { "4 of 10 files".into() } else { String::new() },
            transfer: String::new(),
            speed: speed.into(),
            eta: String::new(),
        }
    }

    #[test]
    fn idle_line_renders_as_idle() {
        assert_eq!(line(false, 0.0, "").render(), "idle");
    }

    #[test]
    fn active_line_skips_empty_parts() {
        assert_eq!(
            line(true, 40.0, "1.5 KB/s").render(),
            " 40.0%  4 of 10 files  1.5 KB/s"
        );
    }

    #[test]
    fn recorder_skips_priming_and_repeats() {
        let store = Arc::new(StateStore::default());
        let recorder = StatusRecorder::attach(&store);
        let sink = UpdateSink::new(Arc::clone(&store));

        let progress = serde_json::json!({
            "status": "syncing",
            "totalFiles": 10,
            "completedFiles": 4,
            "totalBytes": 1000,
            "transferredBytes": 400,
            "percentage": 40.0,
            "bytesPerSecond": 1536.0,
            "eta": 125,
            "activeFiles": []
        });
        sink.ingest(RawEvent::new("sync:progress", progress.clone())).unwrap();
        sink.ingest(RawEvent::new("sync:progress", progress)).unwrap();
        sink.ingest(RawEvent::new("sync:end", serde_json::Value::Null)).unwrap();

        let lines = recorder.take();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].speed, "1.5 KB/s");
        assert_eq!(lines[0].eta, "2:05 remaining");
        assert!(lines[1].is_idle());
    }
}
