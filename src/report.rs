//! Text rendering for log lines and summary files.
//!
//! The log line layout is read by external tools (a viewer and an outage
//! histogram script), so the timestamp prefix and the outage banner must stay
//! stable.

use time::OffsetDateTime;

use crate::clock::{format_elapsed, format_timestamp};
use crate::hosts::Target;
use crate::session::SummarySnapshot;
use crate::stats::StatsSnapshot;
use crate::types::{Markers, Outage, ProbeOutcome, ProbeResult};

/// Most recent outages listed in a summary.
pub const OUTAGE_HISTORY_LIMIT: usize = 100;

const CELL_WIDTH: usize = 12;
const NAME_INDENT: usize = 22;
const NAME_WIDTH: usize = 17;

pub const OUTAGE_BANNER: &str = "Internet Outage";

/// Column header printed at start and after each console summary.
pub fn host_names_line(targets: &[Target]) -> String {
    let mut line = " ".repeat(NAME_INDENT);
    for t in targets {
        line.push_str(&format!("{:<w$}", t.name, w = NAME_WIDTH));
    }
    line
}

/// Opening block written once per session.
pub fn session_header(targets: &[Target]) -> String {
    let names = host_names_line(targets);
    format!(
        "\nMonitoring internet uptime by pinging DNS servers:\n{}\n\n{}",
        "-".repeat(names.chars().count()),
        names
    )
}

/// Always fenced with emoji crosses, whatever markers the cells use, so the
/// banner pattern stays the same for log readers.
pub fn outage_line(at: OffsetDateTime) -> String {
    let fence = Markers::EMOJI.fail.repeat(7);
    format!("{} - {fence} {OUTAGE_BANNER} {fence}", format_timestamp(at))
}

pub fn results_line(at: OffsetDateTime, results: &[ProbeResult], markers: &Markers) -> String {
    let cells: Vec<String> = results
        .iter()
        .map(|r| match r.outcome {
            ProbeOutcome::Success { latency_ms } => {
                format!("{:<w$}", format!("{} {latency_ms:.2} ms", markers.ok), w = CELL_WIDTH)
            }
            ProbeOutcome::Failure => format!("{:<w$}", markers.fail, w = CELL_WIDTH),
            ProbeOutcome::Timeout => {
                format!("{:<w$}", format!("{} timeout", markers.timeout), w = CELL_WIDTH + 1)
            }
        })
        .collect();
    let line = format!("{} - {}", format_timestamp(at), cells.join("    "));
    line.trim_end().to_string()
}

/// Left-aligned table with ` | ` separators and a `-+-` rule, every column
/// as wide as its widest cell.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let pad = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}", w = *w))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut out = pad(headers.to_vec());
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&pad(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

fn ms(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2} ms"))
        .unwrap_or_else(|| "n/a".to_string())
}

pub fn stats_table(hosts: &[(Target, StatsSnapshot)]) -> String {
    let rows: Vec<Vec<String>> = hosts
        .iter()
        .map(|(t, s)| {
            vec![
                t.address.clone(),
                format!("{:.2}%", s.uptime_pct),
                ms(s.avg_latency_ms),
                ms(s.min_latency_ms),
                ms(s.max_latency_ms),
            ]
        })
        .collect();
    render_table(&["Host", "Uptime", "Average", "Low", "High"], &rows)
}

/// Newest first, capped at [`OUTAGE_HISTORY_LIMIT`].
pub fn outage_table(history: &[Outage]) -> String {
    let rows: Vec<Vec<String>> = history
        .iter()
        .rev()
        .take(OUTAGE_HISTORY_LIMIT)
        .map(|o| {
            vec![
                format_timestamp(o.start),
                o.end.map(format_timestamp).unwrap_or_default(),
                o.duration().map(format_elapsed).unwrap_or_default(),
            ]
        })
        .collect();
    render_table(&["Start", "End", "Duration"], &rows)
}

fn outage_section(snapshot: &SummarySnapshot, title: &str, total: usize) -> String {
    let mut out = String::new();
    if total > 0 {
        out.push_str(&format!("Total outages: {total}\n"));
    }
    if !snapshot.outages.is_empty() {
        out.push_str(title);
        out.push_str("\n\n");
        out.push_str(&outage_table(&snapshot.outages));
    }
    match snapshot.ongoing {
        Some(o) => out.push_str(&format!("\nOngoing outage since {}\n", format_timestamp(o.start))),
        None if snapshot.outages.is_empty() => out.push_str("No outages\n"),
        None => {}
    }
    out
}

fn host_rows(snapshot: &SummarySnapshot) -> Vec<(Target, StatsSnapshot)> {
    snapshot
        .hosts
        .iter()
        .map(|h| (h.target.clone(), h.stats))
        .collect()
}

/// Periodic summary file contents.
pub fn render_periodic(snapshot: &SummarySnapshot) -> String {
    let mut out = String::from("Current Uptime and Response Times\n\n");
    out.push_str(&stats_table(&host_rows(snapshot)));
    out.push('\n');
    out.push_str(&outage_section(
        snapshot,
        &format!("Outage History (last {OUTAGE_HISTORY_LIMIT} outages):"),
        snapshot.outages.len(),
    ));
    out.push_str(&format!(
        "\nProgram running for: {}\n",
        format_elapsed(snapshot.elapsed())
    ));
    out.push_str(&format!("Last updated: {}\n", format_timestamp(snapshot.generated_at)));
    out
}

/// Summary written once on shutdown. The outage count includes an outage
/// that is still open.
pub fn render_final(snapshot: &SummarySnapshot) -> String {
    let mut out = String::from("Final Uptime and Response Times\n\n");
    out.push_str(&stats_table(&host_rows(snapshot)));
    out.push('\n');
    out.push_str(&outage_section(snapshot, "Outage Log:", snapshot.total_outages()));
    out.push_str(&format!(
        "\nProgram ran for: {}\n",
        format_elapsed(snapshot.elapsed())
    ));
    out.push_str(&format!("Last updated: {}\n", format_timestamp(snapshot.generated_at)));
    out
}
