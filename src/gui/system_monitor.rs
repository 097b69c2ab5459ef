use crate::models::StorageUsage;
use std::path::Path;
use std::time::{Duration, Instant};
use sysinfo::Disks;

const PROC_STAT: &str = "/proc/stat";
const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Turns successive `/proc/stat` readings into a CPU usage percentage.
#[derive(Default, Debug)]
pub struct CpuSampler {
    last_total: u64,
    last_idle: u64,
}

impl CpuSampler {
    /// Feeds the aggregate `cpu` line. Only user, nice, system and idle are counted.
    /// Returns a percentage once a previous sample exists and time has passed.
    pub fn sample(&mut self, stat: &str) -> Option<u8> {
        let (total, idle) = parse_cpu_line(stat.lines().next()?)?;

        let usage = if self.last_total > 0 && total > self.last_total {
            let delta_total = total - self.last_total;
            let delta_idle = idle.saturating_sub(self.last_idle).min(delta_total);
            Some((100 * (delta_total - delta_idle) / delta_total) as u8)
        } else {
            None
        };

        self.last_total = total;
        self.last_idle = idle;
        usage
    }
}

fn parse_cpu_line(line: &str) -> Option<(u64, u64)> {
    let values: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .take(4)
        .map(|v| v.parse().ok())
        .collect::<Option<Vec<u64>>>()?;
    if values.len() < 4 {
        return None;
    }
    let (user, nice, system, idle) = (values[0], values[1], values[2], values[3]);
    Some((user + nice + system + idle, idle))
}

/// Usage of the filesystem mounted at `/`.
pub fn root_storage() -> Option<StorageUsage> {
    let disks = Disks::new_with_refreshed_list();
    let root = disks.iter().find(|d| d.mount_point() == Path::new("/"))?;
    storage_usage(root.total_space(), root.available_space())
}

fn storage_usage(total_bytes: u64, free_bytes: u64) -> Option<StorageUsage> {
    if total_bytes == 0 {
        return None;
    }
    let total_gb = total_bytes as f64 / GIB;
    let used_gb = total_bytes.saturating_sub(free_bytes) as f64 / GIB;
    Some(StorageUsage {
        total_gb,
        used_gb,
        used_percent: used_gb / total_gb * 100.0,
    })
}

/// Periodically refreshed readings shown in the status bar.
pub struct SystemMonitor {
    cpu: CpuSampler,
    cpu_percent: Option<u8>,
    storage: Option<StorageUsage>,
    last_poll: Option<Instant>,
    interval: Duration,
}

impl SystemMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            cpu: CpuSampler::default(),
            cpu_percent: None,
            storage: None,
            last_poll: None,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes a new sample when the interval has elapsed.
    pub fn poll_if_due(&mut self, now: Instant) {
        if self.last_poll.is_some_and(|t| now.duration_since(t) < self.interval) {
            return;
        }
        self.last_poll = Some(now);

        match std::fs::read_to_string(PROC_STAT) {
            Ok(stat) => {
                if let Some(p) = self.cpu.sample(&stat) {
                    self.cpu_percent = Some(p);
                }
            }
            Err(e) => tracing::trace!("cannot read {}: {}", PROC_STAT, e),
        }

        self.storage = root_storage();
    }

    pub fn cpu_label(&self) -> String {
        match self.cpu_percent {
            Some(p) => format!("CPU: {}%", p),
            None => "CPU: --%".to_string(),
        }
    }

    pub fn disk_label(&self) -> String {
        disk_label(self.storage.as_ref())
    }
}

fn disk_label(storage: Option<&StorageUsage>) -> String {
    match storage {
        Some(s) => format!(
            "Disk: {}% ({:.1}G/{:.1}G)",
            s.used_percent as u32, s.used_gb, s.total_gb
        ),
        None => "Disk: --%".to_string(),
    }
}
