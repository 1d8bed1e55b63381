//! Host metrics for `system_info.get_info`.
//!
//! Everything is best effort: whatever the platform cannot report is `null`.

use std::time::Instant;

use log::{debug, warn};
use serde::Serialize;
use serde_json::{Value, json};
use tokio::fs;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub version: &'static str,
    pub host_platform: &'static str,
    pub host_arch: &'static str,
    #[serde(rename = "hostOS")]
    pub host_os: Option<String>,
    pub hostname: Option<String>,
    pub cpu_cores: Option<usize>,
    /// Gigabytes.
    pub memory_total: Option<u64>,
    pub memory_used: Option<u64>,
    /// Percent, one decimal.
    pub memory_usage: Option<f64>,
    pub process_count: Option<usize>,
    pub current_user: Option<String>,
    /// Seconds since the server started.
    pub server_uptime: f64,
}

/// Collects a fresh snapshot.
pub async fn collect(started: Instant) -> HostInfo {
    let memory = memory_kb().await;
    let (memory_total, memory_used, memory_usage) = match memory {
        Some((total, available)) if total > 0 => {
            let used = total.saturating_sub(available);
            let usage = (used as f64 / total as f64 * 1000.0).round() / 10.0;
            (Some(kb_to_gb(total)), Some(kb_to_gb(used)), Some(usage))
        }
        _ => (None, None, None),
    };

    HostInfo {
        version: env!("CARGO_PKG_VERSION"),
        host_platform: std::env::consts::OS,
        host_arch: std::env::consts::ARCH,
        host_os: os_pretty_name().await,
        hostname: hostname().await,
        cpu_cores: std::thread::available_parallelism().ok().map(|n| n.get()),
        memory_total,
        memory_used,
        memory_usage,
        process_count: process_count().await,
        current_user: std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .ok(),
        server_uptime: started.elapsed().as_secs_f64(),
    }
}

/// The `data` payload of an `info` reply.
pub async fn info_payload(started: Instant) -> Value {
    match serde_json::to_value(collect(started).await) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to encode system information: {}", e);
            json!({ "error": "Failed to collect system information" })
        }
    }
}

fn kb_to_gb(kb: u64) -> u64 {
    (kb + 512 * 1024) / (1024 * 1024)
}

async fn read_trimmed(path: &str) -> Option<String> {
    match fs::read_to_string(path).await {
        Ok(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Err(e) => {
            debug!("{} unavailable: {}", path, e);
            None
        }
    }
}

async fn hostname() -> Option<String> {
    match read_trimmed("/proc/sys/kernel/hostname").await {
        Some(name) => Some(name),
        None => std::env::var("HOSTNAME")
            .or_else(|_| std::env::var("COMPUTERNAME"))
            .ok(),
    }
}

async fn os_pretty_name() -> Option<String> {
    let release = read_trimmed("/etc/os-release").await?;
    parse_os_release(&release)
}

fn parse_os_release(release: &str) -> Option<String> {
    release
        .lines()
        .find_map(|line| line.strip_prefix("PRETTY_NAME="))
        .map(|v| v.trim_matches('"').to_string())
}

/// `(MemTotal, MemAvailable)` in kB.
async fn memory_kb() -> Option<(u64, u64)> {
    let meminfo = read_trimmed("/proc/meminfo").await?;
    parse_meminfo(&meminfo)
}

fn parse_meminfo(meminfo: &str) -> Option<(u64, u64)> {
    let field = |name: &str| {
        meminfo
            .lines()
            .find_map(|line| line.strip_prefix(name))
            .and_then(|rest| rest.trim().split_whitespace().next())
            .and_then(|n| n.parse::<u64>().ok())
    };
    Some((field("MemTotal:")?, field("MemAvailable:")?))
}

async fn process_count() -> Option<usize> {
    let mut entries = fs::read_dir("/proc").await.ok()?;
    let mut count = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        if entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.bytes().all(|b| b.is_ascii_digit()))
        {
            count += 1;
        }
    }
    Some(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_meminfo() {
        let sample =
            "MemTotal:       16303428 kB\nMemFree:  1000 kB\nMemAvailable:    8151714 kB\n";
        assert_eq!(parse_meminfo(sample), Some((16303428, 8151714)));
        assert_eq!(parse_meminfo("MemTotal: 5 kB"), None);
    }

    #[test]
    fn parses_os_release() {
        let sample = "NAME=\"Debian\"\nPRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\n";
        assert_eq!(
            parse_os_release(sample).as_deref(),
            Some("Debian GNU/Linux 12 (bookworm)")
        );
    }

    #[tokio::test]
    async fn payload_is_a_flat_record() {
        let payload = info_payload(Instant::now()).await;
        let object = payload.as_object().unwrap();
        assert_eq!(object["hostPlatform"], std::env::consts::OS);
        assert!(object.contains_key("serverUptime"));
        assert!(object.values().all(|v| !v.is_object() && !v.is_array()));
    }
}
