use console::{Emoji, style};

use super::records::{Avatar, Job, JobStatus, Voice};
use super::session::{SessionStats, SyncReport};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");
pub static CLOCK_ICON: Emoji<'_, '_> = Emoji("⏱️  ", "");
pub static GLOBE: Emoji<'_, '_> = Emoji("🌐 ", "");
pub static GEAR: Emoji<'_, '_> = Emoji("⚙️  ", "");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "");
pub static CLAPPER: Emoji<'_, '_> = Emoji("🎬 ", "");

pub const SNIPPET_CHARS: usize = 200;

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

/// Timeouts get their own line so they read differently from refused connections.
pub fn print_call_error(err: &crate::core::bridge::BridgeError) {
    if err.is_timeout() {
        eprintln!(
            "{} {} {}",
            CLOCK_ICON,
            style(err.to_string()).yellow().bold(),
            style("(the service may still be working; try again shortly)").dim()
        );
    } else {
        print_error(&err.to_string());
    }
}

pub fn print_status(label: &str, msg: &str) {
    println!("  {} {}: {}", GEAR, style(label).bold().cyan(), msg);
}

pub fn print_step(step: &str) {
    println!("{} {}", SPARKLE, style(step).bold());
}

pub fn print_link(label: &str, url: &str) {
    println!(
        "  {} {}: {}",
        GLOBE,
        style(label).bold(),
        style(url).underlined().cyan()
    );
}

pub fn print_banner() {
    println!();
    println!(
        "{} {}",
        CLAPPER,
        style("Pipio AI Studio Pro").bold().magenta()
    );
    println!(
        "{}\n",
        style("Create, dub and sync AI avatar videos from your terminal.").dim()
    );
}

pub fn print_goodbye() {
    println!(
        "\n{} {}",
        SPARKLE,
        style("Session closed. Your keys were not saved.").bold().cyan()
    );
}

/// A titled block of aligned `name  description` rows.
pub struct GuideSection {
    title: String,
    rows: Vec<GuideRow>,
}

enum GuideRow {
    Command(String, String),
    Status(String, String),
    Blank,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.rows
            .push(GuideRow::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.rows
            .push(GuideRow::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.rows.push(GuideRow::Blank);
        self
    }

    pub fn print(&self) {
        println!("\n {}", style(&self.title).bold().underlined());
        let width = self
            .rows
            .iter()
            .filter_map(|r| match r {
                GuideRow::Command(name, _) => Some(name.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        for row in &self.rows {
            match row {
                GuideRow::Command(name, desc) => {
                    println!(
                        "   {}  {}",
                        style(format!("{:<width$}", name, width = width)).green(),
                        desc
                    );
                }
                GuideRow::Status(label, value) => print_status(label, value),
                GuideRow::Blank => println!(),
            }
        }
    }
}

pub fn status_badge(status: &JobStatus) -> String {
    let label = format!("[{}]", status.as_str().to_uppercase());
    let styled = match status {
        JobStatus::Completed => style(label).green().bold(),
        JobStatus::Failed => style(label).red().bold(),
        JobStatus::Pending | JobStatus::Processing => style(label).yellow().bold(),
        JobStatus::Unknown(_) => style(label).dim().bold(),
    };
    styled.to_string()
}

pub fn print_avatar(avatar: &Avatar) {
    println!(
        "  {}  {}  {}",
        style(&avatar.id).dim(),
        style(&avatar.name).bold(),
        style(avatar.ethnicity.as_deref().unwrap_or("N/A")).cyan()
    );
}

pub fn print_voice(voice: &Voice) {
    println!(
        "  {}  {}  {}",
        style(&voice.id).dim(),
        style(voice.label()).bold(),
        style(voice.voice_type.as_deref().unwrap_or("N/A")).cyan()
    );
}

pub fn print_job(job: &Job) {
    println!(
        "\n {} {}  {}",
        style("Project:").bold(),
        job.id,
        status_badge(&job.status)
    );
    print_status("Created", job.created_date.as_deref().unwrap_or("N/A"));
    match job.playable_url() {
        Some(url) => {
            print_link("Video", url);
            print_status("Save as", &job.download_name());
        }
        None => print_status("Script", &job.script_snippet(SNIPPET_CHARS)),
    }
}

pub fn print_stats(stats: &SessionStats) {
    GuideSection::new("Statistics")
        .status("Avatars", &stats.avatars.to_string())
        .status("Voices", &stats.voices.to_string())
        .status("Jobs", &stats.history.to_string())
        .print();
}

pub fn print_sync_report(report: &SyncReport, stats: &SessionStats) {
    for (what, err) in &report.failures {
        print_warn(&format!("Could not load {}:", what));
        print_call_error(err);
    }
    print_success(&format!(
        "Synced at {}",
        report.synced_at.format("%H:%M:%S")
    ));
    print_stats(stats);
}

pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{}", value),
    }
}
