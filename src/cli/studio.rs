use anyhow::Result;
use console::style;
use inquire::{Confirm, Select, Text};

use pipio_studio::core::config::StudioConfig;
use pipio_studio::core::records::{Avatar, MAX_SCRIPT_CHARS, Voice};
use pipio_studio::core::session::{ALL_FILTER, AUTO_LANGUAGE, Session};
use pipio_studio::core::terminal::{
    self, print_call_error, print_info, print_job, print_json, print_link,
    print_status, print_step, print_success, print_warn,
};

use super::commands::open_session;
use super::{is_cancellation, report_error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    Sync,
    Generate,
    Dubbing,
    LipSync,
    Library,
    CheckStatus,
    Draft,
    Stats,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 9] = [
        MenuAction::Sync,
        MenuAction::Generate,
        MenuAction::Dubbing,
        MenuAction::LipSync,
        MenuAction::Library,
        MenuAction::CheckStatus,
        MenuAction::Draft,
        MenuAction::Stats,
        MenuAction::Quit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MenuAction::Sync => "🔄 Sync global data",
            MenuAction::Generate => "🎭 Avatar video",
            MenuAction::Dubbing => "🌍 Dubbing",
            MenuAction::LipSync => "👄 Lip sync",
            MenuAction::Library => "📁 Library",
            MenuAction::CheckStatus => "🔍 Check job status",
            MenuAction::Draft => "📝 Draft a script",
            MenuAction::Stats => "📊 Statistics",
            MenuAction::Quit => "👋 Quit",
        }
    }
}

pub async fn run_studio(config: &StudioConfig) -> Result<()> {
    terminal::print_banner();
    let mut session = open_session(config, true)?;
    print_info("Tip: sync global data first to load avatars and voices.");

    loop {
        let labels: Vec<&str> = MenuAction::ALL.iter().map(MenuAction::label).collect();
        let choice = Select::new("What would you like to do?", labels)
            .with_page_size(MenuAction::ALL.len())
            .raw_prompt()?;
        let action = MenuAction::ALL[choice.index];
        if action == MenuAction::Quit {
            break;
        }

        // A failed action is shown and the menu comes back.
        if let Err(e) = run_action(&mut session, action).await {
            if is_cancellation(&e) {
                continue;
            }
            report_error(&e);
        }
    }

    drop(session);
    terminal::print_goodbye();
    Ok(())
}

async fn run_action(session: &mut Session, action: MenuAction) -> Result<()> {
    match action {
        MenuAction::Sync => sync(session).await,
        MenuAction::Generate => generate(session).await,
        MenuAction::Dubbing => dubbing(session).await,
        MenuAction::LipSync => lipsync(session).await,
        MenuAction::Library => library(session).await,
        MenuAction::CheckStatus => check_status(session).await,
        MenuAction::Draft => draft(session).await.map(|_| ()),
        MenuAction::Stats => {
            terminal::print_stats(&session.stats());
            if let Some(at) = session.synced_at() {
                print_status("Last sync", &at.format("%H:%M:%S").to_string());
            }
            Ok(())
        }
        MenuAction::Quit => Ok(()),
    }
}

async fn sync(session: &mut Session) -> Result<()> {
    print_step("Fetching assets...");
    let report = session.sync_global_data().await;
    terminal::print_sync_report(&report, &session.stats());
    Ok(())
}

fn pick_avatar(session: &Session) -> Result<Avatar> {
    let ethnicities = session.avatar_ethnicities();
    let ethnicity = Select::new("Filter ethnicity:", ethnicities).prompt()?;
    let avatars = session.avatars_by_ethnicity(&ethnicity);
    let labels: Vec<String> = avatars
        .iter()
        .map(|a| format!("{} ({})", a.name, a.ethnicity_or_other()))
        .collect();
    let picked = Select::new("Select avatar:", labels).raw_prompt()?;
    let avatar = avatars[picked.index].clone();
    if let Some(thumb) = &avatar.thumbnail_image_path {
        print_link("Preview", thumb);
    }
    Ok(avatar)
}

fn pick_voice(session: &Session) -> Result<Voice> {
    let mut languages = vec![ALL_FILTER.to_string()];
    languages.extend(session.voice_languages());
    let language = Select::new("Filter language:", languages).prompt()?;
    let voices = session.voices_by_language(&language);
    let labels: Vec<String> = voices.iter().map(|v| v.label()).collect();
    let picked = Select::new("Select voice:", labels).raw_prompt()?;
    let voice = voices[picked.index].clone();
    if let Some(sample) = &voice.preview_audio_path {
        print_link("Voice sample", sample);
    }
    print_status("Type", voice.voice_type.as_deref().unwrap_or("N/A"));
    Ok(voice)
}

async fn generate(session: &mut Session) -> Result<()> {
    if session.avatars().is_empty() || session.voices().is_empty() {
        print_info("Sync global data first to load available avatars and voices.");
        return Ok(());
    }

    print_step("1. Configure actor");
    let avatar = pick_avatar(session)?;
    print_step("2. Configure voice");
    let voice = pick_voice(session)?;

    print_step("3. Script");
    let mut initial = String::new();
    if session.has_chat()
        && Confirm::new("Draft the script with AI first?")
            .with_default(false)
            .prompt()?
    {
        initial = draft(session).await?;
    }
    let script = Text::new("What should the avatar say?")
        .with_initial_value(&initial)
        .with_help_message(&format!("Max {} characters", MAX_SCRIPT_CHARS))
        .prompt()?;
    println!(
        "  {}",
        style(format!(
            "Character count: {} / {}",
            script.chars().count(),
            MAX_SCRIPT_CHARS
        ))
        .dim()
    );

    let submission = session.generate_clip(&avatar.id, &voice.id, &script).await?;
    print_success(&format!("Video queued! ID: {}", submission.job.id));
    if let Some(err) = submission.refresh_error {
        print_warn("Could not refresh the library:");
        print_call_error(&err);
    }
    Ok(())
}

async fn dubbing(session: &mut Session) -> Result<()> {
    print_info("Translate and dub a video into another language.");
    let source_url = Text::new("Source video URL:")
        .with_placeholder("https://example.com/video.mp4")
        .prompt()?;
    let source_lang = Text::new("Source language code:")
        .with_default(AUTO_LANGUAGE)
        .with_help_message("Use 'auto' or e.g. 'en'")
        .prompt()?;
    let target_lang = Text::new("Target language code:")
        .with_placeholder("e.g. es, fr, de")
        .prompt()?;

    let ack = session
        .start_dubbing(&source_url, &target_lang, &source_lang)
        .await?;
    print_success("Dubbing process started!");
    print_json(&ack);
    Ok(())
}

async fn lipsync(session: &mut Session) -> Result<()> {
    print_info("Sync an audio file to a video with natural lip movement.");
    let video_url = Text::new("Source video URL:")
        .with_placeholder("https://example.com/video.mp4")
        .prompt()?;
    let audio_url = Text::new("Target audio URL:")
        .with_placeholder("https://example.com/audio.mp3")
        .prompt()?;

    let ack = session.start_lipsync(&video_url, &audio_url).await?;
    print_success("Lip sync process started!");
    print_json(&ack);
    Ok(())
}

async fn library(session: &mut Session) -> Result<()> {
    if let Err(e) = session.refresh_library().await {
        print_warn("Showing the last loaded library:");
        print_call_error(&e);
    }
    if session.history().is_empty() {
        print_info("No projects found yet. Start by generating a video!");
        return Ok(());
    }
    println!("\n {}", style("Project Library").bold().underlined());
    for job in session.history() {
        print_job(job);
    }
    Ok(())
}

const OTHER_ID: &str = "Enter a job id...";

async fn check_status(session: &mut Session) -> Result<()> {
    let mut options: Vec<String> = session
        .history()
        .iter()
        .filter(|j| !j.status.is_terminal())
        .map(|j| format!("{} [{}]", j.id, j.status))
        .collect();
    let ids: Vec<String> = session
        .history()
        .iter()
        .filter(|j| !j.status.is_terminal())
        .map(|j| j.id.clone())
        .collect();
    options.push(OTHER_ID.to_string());

    let picked = Select::new("Which job?", options).raw_prompt()?;
    let id = match ids.get(picked.index) {
        Some(id) => id.clone(),
        None => Text::new("Job id:").prompt()?,
    };

    let job = session.check_status(&id).await?;
    if job.status.is_completed() {
        print_success("Project is ready!");
    } else {
        print_info(&format!("Current Status: {}", job.status));
    }
    print_job(&job);
    Ok(())
}

async fn draft(session: &Session) -> Result<String> {
    if !session.has_chat() {
        print_info("Restart with OPENAI_API_KEY set (or enter a key at startup) to draft scripts.");
        return Ok(String::new());
    }
    let brief = Text::new("What is the video about?")
        .with_placeholder("e.g. 30-second welcome message for new customers")
        .prompt()?;
    print_step("Drafting...");
    let script = session.draft_script(&brief).await?;
    println!("\n{}\n", style(&script).italic());
    Ok(script)
}
