mod commands;
mod credentials;
mod studio;

use std::path::PathBuf;

use anyhow::{Result, bail};
use console::style;
use tracing::info;

use pipio_studio::core::bridge::BridgeError;
use pipio_studio::core::config::StudioConfig;
use pipio_studio::core::session::SessionError;
use pipio_studio::core::terminal::{self, GuideSection, print_error};
use pipio_studio::logging;

fn print_help() {
    terminal::print_banner();

    GuideSection::new("Studio")
        .command("studio", "Interactive studio (default)")
        .command("draft", "Draft a script with the text model (--brief)")
        .print();

    GuideSection::new("Assets")
        .command("avatars", "List avatars (--ethnicity)")
        .command("voices", "List voices (--language)")
        .print();

    GuideSection::new("Jobs")
        .command("generate", "Queue an avatar video (--avatar, --voice, --script)")
        .command("dub", "Start dubbing (--source, --target, --source-lang)")
        .command("lipsync", "Start lip sync (--video, --audio)")
        .command("clips", "List recent jobs (--page-size)")
        .command("status", "Check one job: status <id>")
        .command("template", "Show a project template: template <project-id>")
        .print();

    GuideSection::new("Options")
        .command("--config <path>", "Config file (or PIPIO_STUDIO_CONFIG)")
        .command("--verbose", "Mirror debug logs to stderr")
        .blank()
        .status("Keys", "PIPIO_API_KEY / OPENAI_API_KEY, or prompted")
        .print();

    println!(
        "\n {} {} <command> [options]\n",
        style("Usage:").bold(),
        style("pipio-studio").green()
    );
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct GlobalFlags {
    pub config: Option<PathBuf>,
    pub verbose: bool,
    /// Remaining arguments, program name excluded.
    pub rest: Vec<String>,
}

pub(crate) fn parse_global_flags(args: &[String]) -> GlobalFlags {
    let mut flags = GlobalFlags::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => match takes_value(args.get(i + 1)) {
                Some(path) => {
                    flags.config = Some(PathBuf::from(path));
                    i += 2;
                }
                None => i += 1,
            },
            "--verbose" | "-v" => {
                flags.verbose = true;
                i += 1;
            }
            other => {
                flags.rest.push(other.to_string());
                i += 1;
                // A command flag keeps its value even when it looks like a global flag.
                if other.starts_with('-')
                    && let Some(value) = takes_value(args.get(i))
                {
                    flags.rest.push(value.clone());
                    i += 1;
                }
            }
        }
    }
    flags
}

/// Flag values never start with `--`; such a token is the next flag.
fn takes_value(token: Option<&String>) -> Option<&String> {
    token.filter(|v| !v.starts_with("--"))
}

/// Value following the first of `names`, if any.
pub(crate) fn flag_value(args: &[String], start: usize, names: &[&str]) -> Option<String> {
    let mut i = start;
    while i < args.len() {
        if names.contains(&args[i].as_str()) {
            return takes_value(args.get(i + 1)).cloned();
        }
        i += 1;
    }
    None
}

/// First argument at or after `start` that is neither a flag nor a flag's value.
pub(crate) fn positional(args: &[String], start: usize) -> Option<String> {
    let mut i = start;
    while i < args.len() {
        if args[i].starts_with('-') {
            i += if takes_value(args.get(i + 1)).is_some() { 2 } else { 1 };
        } else {
            return Some(args[i].clone());
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GenerateArgs {
    pub avatar: String,
    pub voice: String,
    pub script: String,
}

pub(crate) fn parse_generate_args(args: &[String], start: usize) -> GenerateArgs {
    GenerateArgs {
        avatar: flag_value(args, start, &["--avatar", "-a"]).unwrap_or_default(),
        voice: flag_value(args, start, &["--voice"]).unwrap_or_default(),
        script: flag_value(args, start, &["--script", "-s"]).unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DubArgs {
    pub source: String,
    pub target: String,
    pub source_lang: String,
}

pub(crate) fn parse_dub_args(args: &[String], start: usize) -> DubArgs {
    DubArgs {
        source: flag_value(args, start, &["--source"]).unwrap_or_default(),
        target: flag_value(args, start, &["--target", "-t"]).unwrap_or_default(),
        source_lang: flag_value(args, start, &["--source-lang"]).unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LipSyncArgs {
    pub video: String,
    pub audio: String,
}

pub(crate) fn parse_lipsync_args(args: &[String], start: usize) -> LipSyncArgs {
    LipSyncArgs {
        video: flag_value(args, start, &["--video"]).unwrap_or_default(),
        audio: flag_value(args, start, &["--audio"]).unwrap_or_default(),
    }
}

pub(crate) fn parse_page_size(args: &[String], start: usize, default: u32) -> u32 {
    flag_value(args, start, &["--page-size", "-n"])
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Ctrl+C / Esc inside a prompt ends the session quietly.
pub(crate) fn is_cancellation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<inquire::InquireError>(),
        Some(inquire::InquireError::OperationCanceled)
            | Some(inquire::InquireError::OperationInterrupted)
    )
}

/// Print a top-level failure, keeping the timeout rendering of bridge errors.
pub(crate) fn report_error(err: &anyhow::Error) {
    let bridge = err.downcast_ref::<BridgeError>().or_else(|| {
        match err.downcast_ref::<SessionError>() {
            Some(SessionError::Bridge(b)) => Some(b),
            _ => None,
        }
    });
    match bridge {
        Some(b) => terminal::print_call_error(b),
        None => print_error(&format!("{:#}", err)),
    }
}

fn reject_command(cmd: &str) -> Result<()> {
    print_help();
    bail!("Unknown command '{}'. Run 'pipio-studio help' for usage.", cmd)
}

pub async fn run_main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let flags = parse_global_flags(&args);

    let log_path = logging::init(&logging::default_log_path(), flags.verbose)?;
    let config_path = StudioConfig::resolve_path(flags.config.as_deref());
    let config = StudioConfig::load(&config_path)?;
    info!(
        "pipio-studio starting (config {}, log {})",
        config_path.display(),
        log_path.display()
    );

    let rest = &flags.rest;
    let cmd = rest.first().map(String::as_str).unwrap_or("studio");
    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "studio" => studio::run_studio(&config).await,
        "avatars" => {
            let ethnicity = flag_value(rest, 1, &["--ethnicity", "-e"]);
            commands::list_avatars(&config, ethnicity.as_deref()).await
        }
        "voices" => {
            let language = flag_value(rest, 1, &["--language", "-l"]);
            commands::list_voices(&config, language.as_deref()).await
        }
        "clips" => commands::list_clips(&config, parse_page_size(rest, 1, config.page_size)).await,
        "status" => match positional(rest, 1) {
            Some(id) => commands::check_status(&config, &id).await,
            None => bail!("Usage: pipio-studio status <id>"),
        },
        "template" => match positional(rest, 1) {
            Some(id) => commands::project_template(&config, &id).await,
            None => bail!("Usage: pipio-studio template <project-id>"),
        },
        "generate" => commands::generate(&config, parse_generate_args(rest, 1)).await,
        "dub" => commands::dub(&config, parse_dub_args(rest, 1)).await,
        "lipsync" => commands::lipsync(&config, parse_lipsync_args(rest, 1)).await,
        "draft" => {
            let brief = flag_value(rest, 1, &["--brief", "-b"]).unwrap_or_default();
            commands::draft(&config, &brief).await
        }
        other => reject_command(other),
    }
}
