use anyhow::{Result, bail};
use console::style;

use pipio_studio::core::config::StudioConfig;
use pipio_studio::core::session::{ALL_FILTER, Session};
use pipio_studio::core::terminal::{
    self, print_info, print_job, print_json, print_success, print_warn,
};

use super::credentials;
use super::{DubArgs, GenerateArgs, LipSyncArgs};

pub(super) fn open_session(config: &StudioConfig, want_chat: bool) -> Result<Session> {
    let settings = config.session_settings()?;
    let pipio = credentials::pipio_credential()?;
    let chat = credentials::chat_credential(want_chat)?;
    Ok(Session::start(settings, pipio, chat)?)
}

pub async fn list_avatars(config: &StudioConfig, ethnicity: Option<&str>) -> Result<()> {
    let mut session = open_session(config, false)?;
    session.refresh_avatars().await?;
    let filter = ethnicity.unwrap_or(ALL_FILTER);
    let avatars = session.avatars_by_ethnicity(filter);
    if avatars.is_empty() {
        print_info("No avatars match.");
        return Ok(());
    }
    println!(
        "\n {} ({})",
        style("Avatars").bold().underlined(),
        avatars.len()
    );
    for avatar in avatars {
        terminal::print_avatar(avatar);
    }
    println!(
        "\n {} {}",
        style("Ethnicities:").dim(),
        session.avatar_ethnicities().join(", ")
    );
    Ok(())
}

pub async fn list_voices(config: &StudioConfig, language: Option<&str>) -> Result<()> {
    let mut session = open_session(config, false)?;
    session.refresh_voices().await?;
    let filter = language.unwrap_or(ALL_FILTER);
    let voices = session.voices_by_language(filter);
    if voices.is_empty() {
        print_info("No voices match.");
        return Ok(());
    }
    println!("\n {} ({})", style("Voices").bold().underlined(), voices.len());
    for voice in voices {
        terminal::print_voice(voice);
    }
    println!(
        "\n {} {}",
        style("Languages:").dim(),
        session.voice_languages().join(", ")
    );
    Ok(())
}

pub async fn list_clips(config: &StudioConfig, page_size: u32) -> Result<()> {
    let mut config = config.clone();
    config.page_size = page_size;
    let mut session = open_session(&config, false)?;
    session.refresh_library().await?;
    if session.history().is_empty() {
        print_info("No projects found yet. Start by generating a video!");
        return Ok(());
    }
    for job in session.history() {
        print_job(job);
    }
    Ok(())
}

pub async fn check_status(config: &StudioConfig, id: &str) -> Result<()> {
    let mut session = open_session(config, false)?;
    let job = session.check_status(id).await?;
    if job.status.is_completed() {
        print_success("Project is ready!");
    } else {
        print_info(&format!("Current Status: {}", job.status));
    }
    print_job(&job);
    Ok(())
}

pub async fn project_template(config: &StudioConfig, project_id: &str) -> Result<()> {
    let session = open_session(config, false)?;
    let template = session.project_template(project_id).await?;
    print_json(&template);
    Ok(())
}

pub async fn generate(config: &StudioConfig, args: GenerateArgs) -> Result<()> {
    let mut session = open_session(config, false)?;
    let submission = session
        .generate_clip(&args.avatar, &args.voice, &args.script)
        .await?;
    print_success(&format!("Video queued! ID: {}", submission.job.id));
    if let Some(err) = submission.refresh_error {
        print_warn(&format!("Could not refresh the library: {}", err));
    }
    Ok(())
}

pub async fn dub(config: &StudioConfig, args: DubArgs) -> Result<()> {
    let session = open_session(config, false)?;
    let ack = session
        .start_dubbing(&args.source, &args.target, &args.source_lang)
        .await?;
    print_success("Dubbing process started!");
    print_json(&ack);
    Ok(())
}

pub async fn lipsync(config: &StudioConfig, args: LipSyncArgs) -> Result<()> {
    let session = open_session(config, false)?;
    let ack = session.start_lipsync(&args.video, &args.audio).await?;
    print_success("Lip sync process started!");
    print_json(&ack);
    Ok(())
}

pub async fn draft(config: &StudioConfig, brief: &str) -> Result<()> {
    let session = open_session(config, true)?;
    if !session.has_chat() {
        bail!("Script drafting needs a text-generation key ({})", credentials::CHAT_KEY_ENV);
    }
    let script = session.draft_script(brief).await?;
    println!("\n{}\n", script);
    print_info(&format!("{} characters", script.chars().count()));
    Ok(())
}
