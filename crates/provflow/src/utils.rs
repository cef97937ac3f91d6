use colored::{ColoredString, Colorize};
use provflow_cloud::Phase;
use std::time::Duration;

/// 期限を人が読める形式に ("30m", "1m30s", "250ms")。`None` は無期限
pub fn format_timeout(timeout: Option<Duration>) -> String {
    match timeout {
        Some(d) => format_duration(d),
        None => "none".to_string(),
    }
}

pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs == 0 {
        return format!("{}ms", d.as_millis());
    }

    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    let mut out = String::new();
    if h > 0 {
        out.push_str(&format!("{}h", h));
    }
    if m > 0 {
        out.push_str(&format!("{}m", m));
    }
    if s > 0 || out.is_empty() {
        out.push_str(&format!("{}s", s));
    }
    out
}

/// フェーズ名を `width` で揃えて結果ごとに色付け
pub fn phase_colored(phase: Phase, width: usize) -> ColoredString {
    // エスケープコードで桁がずれないよう色付け前に揃える
    let name = format!("{:<width$}", phase.to_string());
    match phase {
        Phase::Ready => name.green(),
        Phase::Failed => name.red(),
        Phase::Absent => name.dimmed(),
        Phase::InProgress => name.yellow(),
    }
}
