use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use uptime_watch::clock::LocalClock;
use uptime_watch::error::ConfigError;
use uptime_watch::hosts::HostRegistry;
use uptime_watch::monitor::{Monitor, MonitorConfig, ProbeMode};
use uptime_watch::persistence::LogStore;
use uptime_watch::prober::{PingProbe, Probe, TcpProbe};
use uptime_watch::types::Markers;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Method {
    /// Run the system `ping` utility once per host.
    Ping,
    /// Open a TCP connection to `--tcp-port`.
    Tcp,
}

/// uptime-watch: see how often the internet is actually up.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "uptime-watch",
    version,
    about = "Probe public DNS resolvers on a fixed interval and record internet outages.",
    long_about = None
)]
struct Cli {
    /// Extra hosts as address/name pairs, e.g. `-e 8.8.4.4 GoogleDNS 192.168.1.1 Router`.
    #[arg(short = 'e', long = "extra-hosts", num_args = 0.., value_name = "ADDRESS NAME")]
    extra_hosts: Vec<String>,

    /// Seconds to sleep between cycles.
    #[arg(long = "interval-secs", default_value_t = 3)]
    interval_secs: u64,

    /// Upper bound on a single probe, in seconds.
    #[arg(long = "timeout-secs", default_value_t = 7)]
    timeout_secs: u64,

    /// Rewrite the summary file every N cycles.
    #[arg(long = "summary-every", default_value_t = 40)]
    summary_every: u64,

    /// Directory for daily logs and the summary file.
    #[arg(long = "log-dir", default_value = "log")]
    log_dir: PathBuf,

    /// Delete daily logs older than this many days (checked when the date rolls over).
    #[arg(long = "retention-days", default_value_t = 14)]
    retention_days: u64,

    /// Probe mechanism.
    #[arg(long, value_enum, default_value_t = Method::Ping)]
    method: Method,

    /// Port used by `--method tcp`.
    #[arg(long = "tcp-port", default_value_t = 53)]
    tcp_port: u16,

    /// Probe all hosts concurrently instead of one after another.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Use bracketed text markers instead of emoji.
    #[arg(long = "plain-markers", default_value_t = false)]
    plain_markers: bool,

    /// Also write `uptime_master_summary.json` next to the text summary.
    #[arg(long = "json-summary", default_value_t = false)]
    json_summary: bool,
}

impl Cli {
    fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        for (name, value) in [
            ("--interval-secs", self.interval_secs),
            ("--timeout-secs", self.timeout_secs),
            ("--summary-every", self.summary_every),
            ("--retention-days", self.retention_days),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { name });
            }
        }
        Ok(MonitorConfig {
            interval: Duration::from_secs(self.interval_secs),
            probe_timeout: Duration::from_secs(self.timeout_secs),
            summary_every: self.summary_every,
            mode: if self.parallel {
                ProbeMode::Parallel
            } else {
                ProbeMode::Sequential
            },
            markers: if self.plain_markers {
                Markers::PLAIN
            } else {
                Markers::EMOJI
            },
            json_summary: self.json_summary,
        })
    }

    fn probe(&self) -> Arc<dyn Probe> {
        match self.method {
            Method::Ping => Arc::new(PingProbe),
            Method::Tcp => Arc::new(TcpProbe::new(self.tcp_port)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Must happen while the process is still single-threaded.
    let clock = LocalClock::detect();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let registry = HostRegistry::with_extras(&cli.extra_hosts)?;
    let config = cli.monitor_config()?;
    let retention = Duration::from_secs(cli.retention_days * 24 * 60 * 60);
    let store = LogStore::open(&cli.log_dir, clock.now().date(), retention)
        .with_context(|| format!("failed to create log directory {}", cli.log_dir.display()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let cancel = CancellationToken::new();
        spawn_shutdown_listener(cancel.clone());

        let monitor = Monitor::new(config, &registry, store, cli.probe(), clock);
        let snapshot = monitor.run(cancel).await;
        info!(cycles = snapshot.cycles, "exiting");
    });
    Ok(())
}

/// Cancel on Ctrl-C, or SIGTERM on Unix.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut term) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = term.recv() => {}
                    }
                }
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                }
            }
        }
        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
        }
        info!("shutdown requested");
        cancel.cancel();
    });
}
