pub mod check;
pub mod check_locks;
pub mod completions;
pub mod create;
pub mod freeze;

use envlock_resolve::{CondaCli, Platform};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_verdict(verdict: &str) -> String {
    use console::Style;
    match verdict {
        "fresh" => Style::new().green().apply_to(verdict).to_string(),
        "stale" => Style::new().red().bold().apply_to(verdict).to_string(),
        "unsigned" => Style::new().yellow().apply_to(verdict).to_string(),
        other => other.to_owned(),
    }
}

pub fn host_platform() -> Result<Platform, String> {
    Platform::host()
        .ok_or_else(|| "unsupported host platform; envlock runs on Linux and macOS".to_owned())
}

pub fn conda_from_env() -> Result<CondaCli, String> {
    CondaCli::from_env().map_err(|e| e.to_string())
}
