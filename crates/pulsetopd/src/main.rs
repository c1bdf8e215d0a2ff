//! pulsetopd - System metrics sampling daemon.
//!
//! Takes one snapshot of CPU, memory, network, disk and battery metrics every
//! second and logs a one-line summary together with the busiest process.

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::DateTime;
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

#[cfg(target_os = "linux")]
use pulsetop_core::collector::RealFs;
use pulsetop_core::collector::StatsCollector;
#[cfg(not(target_os = "linux"))]
use pulsetop_core::collector::mock::MockFs;
use pulsetop_core::fmt::{format_bytes, format_bytes_rate};
use pulsetop_core::models::{ProcessList, SortBy, SystemSnapshot};

const TICK: Duration = Duration::from_secs(1);

/// System metrics sampling daemon.
#[derive(Parser)]
#[command(name = "pulsetopd", about = "System metrics sampling daemon", version)]
struct Args {}

fn init_logging() {
    let mut filter = EnvFilter::from_default_env();
    for directive in ["pulsetopd=info", "pulsetop_core=info"] {
        match directive.parse::<Directive>() {
            Ok(d) => filter = filter.add_directive(d),
            Err(e) => eprintln!("invalid log directive {}: {}", directive, e),
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Describes a snapshot in one line for logging.
fn describe_snapshot(snapshot: &SystemSnapshot) -> String {
    let mut parts: Vec<String> = Vec::new();

    let cpu = &snapshot.cpu;
    let mut cpu_part = format!("cpu={:.1}% ({} cores", cpu.usage, cpu.cores.len());
    if let Some(t) = cpu.temperature {
        cpu_part.push_str(&format!(", {:.1}°C", t));
    }
    cpu_part.push(')');
    parts.push(cpu_part);

    let mem = &snapshot.memory;
    parts.push(format!(
        "mem={:.1}% of {}",
        mem.usage_percent,
        format_bytes(mem.total)
    ));

    let net = &snapshot.network;
    parts.push(format!(
        "net=rx {} tx {}",
        format_bytes_rate(net.rx_rate),
        format_bytes_rate(net.tx_rate)
    ));

    if !snapshot.disks.is_empty() {
        let disks: Vec<String> = snapshot
            .disks
            .iter()
            .map(|d| format!("{} {:.0}%", d.mountpoint, d.usage_percent))
            .collect();
        parts.push(format!("disks=[{}]", disks.join(", ")));
    }

    let battery = &snapshot.battery;
    if battery.is_present() {
        parts.push(format!(
            "battery={}% {} ({})",
            battery.level, battery.status, battery.time_left
        ));
    }

    parts.join(" ")
}

fn describe_top_process(list: &ProcessList) -> String {
    match list.processes.first() {
        Some(p) => format!(
            "{} processes ({} running, {} zombie), top: {} [{}] {:.1}% cpu, {} rss",
            list.total,
            list.running,
            list.zombie,
            p.name,
            p.pid,
            p.cpu_percent,
            format_bytes(p.rss)
        ),
        None => "process table unavailable".to_string(),
    }
}

fn main() {
    let _args = Args::parse();
    init_logging();

    info!("pulsetopd {} starting", env!("CARGO_PKG_VERSION"));

    #[cfg(target_os = "linux")]
    let collector = StatsCollector::new(RealFs::new(), "/proc", "/sys");

    #[cfg(not(target_os = "linux"))]
    let collector = {
        warn!("not running on Linux, sampling the built-in mock system");
        StatsCollector::new(MockFs::typical_system(), "/proc", "/sys")
    };

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting sampling loop");
    let mut snapshot_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let started = Instant::now();

        let snapshot = collector.snapshot();
        let processes = collector.processes(SortBy::Cpu, true);
        snapshot_count += 1;

        let at = DateTime::from_timestamp(snapshot.timestamp, 0)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_default();
        info!(
            "#{} {} up {}s {}",
            snapshot_count,
            at,
            snapshot.uptime_secs,
            describe_snapshot(&snapshot)
        );
        info!("{}", describe_top_process(&processes));

        if let Some(timing) = collector.last_timing() {
            debug!(
                "snapshot took {:?} (cpu {:?}, memory {:?}, network {:?}, disk {:?}, battery {:?})",
                timing.total, timing.cpu, timing.memory, timing.network, timing.disk, timing.battery
            );
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = TICK.saturating_sub(started.elapsed());
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutting down after {} snapshots", snapshot_count);
}
