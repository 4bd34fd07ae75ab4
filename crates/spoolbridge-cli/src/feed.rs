//! Line-oriented report feed.
//!
//! Reads `<topic> <payload>` lines, the format `mosquitto_sub -v` prints,
//! and hands each one to the [`ReportRouter`]. Lines for printers that are
//! not configured are ignored.
//!
//! A printer counts as connected from its first line on. Routing waits
//! whenever a printer's queue is full, so one slow printer paces the whole
//! feed.

use spoolbridge_telemetry::{ReportRouter, TelemetryError, TelemetryEvent, printer_id_from_topic};
use std::collections::HashSet;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Counters for one feed run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedStats {
    pub routed: usize,
    pub ignored: usize,
}

/// Split a feed line into topic and payload.
pub fn split_line(line: &str) -> Option<(&str, &str)> {
    let (topic, payload) = line.trim().split_once(char::is_whitespace)?;
    Some((topic, payload.trim_start()))
}

/// Route every line until the input ends or the workers stop.
pub async fn run_feed<R>(reader: R, router: &ReportRouter) -> std::io::Result<FeedStats>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut stats = FeedStats::default();
    let mut connected: HashSet<String> = HashSet::new();

    while let Some(line) = lines.next_line().await? {
        let Some((topic, payload)) = split_line(&line) else {
            if !line.trim().is_empty() {
                debug!(line = %line, "Ignoring line without payload");
                stats.ignored += 1;
            }
            continue;
        };

        if let Some(printer) = printer_id_from_topic(topic)
            && !connected.contains(printer)
            && router.send(printer, TelemetryEvent::Connected).await.is_ok()
        {
            debug!(printer, "First report from printer");
            connected.insert(printer.to_string());
        }

        match router.route(topic, payload.as_bytes()).await {
            Ok(()) => stats.routed += 1,
            Err(TelemetryError::WorkerStopped(printer)) => {
                warn!(printer = %printer, "Printer worker stopped, ending feed");
                break;
            }
            Err(e) => {
                debug!(topic, error = %e, "Ignoring message");
                stats.ignored += 1;
            }
        }
    }

    Ok(stats)
}
