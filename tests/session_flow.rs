
use std::time::Duration;

use mock_harness::{CannedResponse, MockPipioServer, TestResult};
use pipio_studio::core::records::JobStatus;
use pipio_studio::core::session::{ALL_FILTER, AUTO_LANGUAGE};
use pipio_studio::{BridgeError, Credential, Session, SessionError};
use serde_json::json;

fn stock_assets(server: &MockPipioServer) {
    server.respond(
        "GET",
        "/actor",
        CannedResponse::json(
            200,
            json!({"items": [
                {"id": "a1", "name": "Maya", "ethnicity": "South Asian", "thumbnailImagePath": "https://cdn/a1.png"},
                {"id": "a2", "name": "Leo", "ethnicity": "European"},
                {"id": 3, "name": "Kim"}
            ]}),
        ),
    );
    server.respond(
        "GET",
        "/voice",
        CannedResponse::json(
            200,
            json!({"items": [
                {"id": "v1", "name": "Ava", "languages": ["en", "es"], "voiceType": "Neural"},
                {"id": "v2", "name": "Hugo", "languages": ["fr"]}
            ]}),
        ),
    );
    server.respond(
        "GET",
        "/single-clip",
        CannedResponse::json(
            200,
            json!({"items": [
                {"id": "j1", "status": "Pending", "script": "Welcome aboard"},
                {"id": "j0", "status": "Completed", "videoUrl": "https://cdn/j0.mp4"}
            ]}),
        ),
    );
}

fn start(server: &MockPipioServer) -> Session {
    Session::start(
        server.settings(Duration::from_secs(5)),
        Credential::key("test-key"),
        Some(Credential::bearer("sk-test")),
    )
    .expect("session starts with a key")
}

#[tokio::test]
async fn sync_loads_every_list_and_filters_them() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    stock_assets(&server);
    let mut session = start(&server);

    let report = session.sync_global_data().await;
    assert!(report.is_complete(), "{:?}", report.failures);
    assert_eq!(session.synced_at(), Some(report.synced_at));

    let stats = session.stats();
    assert_eq!((stats.avatars, stats.voices, stats.history), (3, 2, 2));

    assert_eq!(
        session.avatar_ethnicities(),
        vec![ALL_FILTER, "European", "Other", "South Asian"]
    );
    assert_eq!(session.avatars_by_ethnicity(ALL_FILTER).len(), 3);
    let others = session.avatars_by_ethnicity("Other");
    assert_eq!(others.len(), 1);
    assert_eq!(others[0].id, "3");

    assert_eq!(session.voice_languages(), vec!["en", "es", "fr"]);
    let spanish: Vec<&str> = session
        .voices_by_language("es")
        .iter()
        .map(|v| v.id.as_str())
        .collect();
    assert_eq!(spanish, vec!["v1"]);
    assert_eq!(session.find_voice("v2").map(|v| v.label()), Some("Hugo (fr)".to_string()));
    assert!(session.find_avatar("missing").is_none());

    let listing = server.requests_to("/single-clip");
    assert_eq!(listing[0].query.as_deref(), Some("pageSize=20"));
    assert!(
        server
            .requests()
            .iter()
            .all(|r| r.authorization.as_deref() == Some("Key test-key"))
    );
    Ok(())
}

#[tokio::test]
async fn failed_sync_part_keeps_the_previous_list() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    stock_assets(&server);
    let mut session = start(&server);
    assert!(session.sync_global_data().await.is_complete());

    server.respond("GET", "/actor", CannedResponse::raw(503, "upstream unavailable"));
    server.respond(
        "GET",
        "/voice",
        CannedResponse::json(200, json!({"items": [{"id": "v9", "name": "Nia", "languages": ["sw"]}]})),
    );

    let report = session.sync_global_data().await;
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    let (what, err) = &report.failures[0];
    assert_eq!(*what, "avatars");
    assert_eq!(err.status_code(), Some(503));

    assert_eq!(session.avatars().len(), 3);
    assert_eq!(session.voices().len(), 1);
    assert_eq!(session.voices()[0].id, "v9");
    Ok(())
}

#[tokio::test]
async fn generate_clip_posts_the_script_and_refreshes_history() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    stock_assets(&server);
    server.respond(
        "POST",
        "/single-clip",
        CannedResponse::json(201, json!({"id": "j2", "status": "Pending"})),
    );
    let mut session = start(&server);

    let submission = session.generate_clip("a1", "v1", "Hello there").await?;
    assert_eq!(submission.job.id, "j2");
    assert_eq!(submission.job.status, JobStatus::Pending);
    assert!(submission.refresh_error.is_none());
    assert_eq!(session.history().len(), 2);

    let posted: Vec<_> = server
        .requests_to("/single-clip")
        .into_iter()
        .filter(|r| r.method == "POST")
        .collect();
    assert_eq!(posted.len(), 1);
    assert_eq!(
        posted[0].body,
        Some(json!({"actorId": "a1", "voiceId": "v1", "script": "Hello there"}))
    );
    Ok(())
}

#[tokio::test]
async fn queued_clip_survives_a_failed_history_refresh() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/single-clip",
        CannedResponse::json(200, json!({"id": "j5"})),
    );
    server.respond("GET", "/single-clip", CannedResponse::raw(500, "internal error"));
    let mut session = start(&server);

    let submission = session.generate_clip("a1", "v1", "Hi").await?;
    assert_eq!(submission.job.id, "j5");
    assert_eq!(
        submission.refresh_error.and_then(|e| e.status_code()),
        Some(500)
    );
    Ok(())
}

#[tokio::test]
async fn status_check_replaces_the_cached_job() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    stock_assets(&server);
    server.respond(
        "GET",
        "/single-clip/j1",
        CannedResponse::json(
            200,
            json!({"id": "j1", "status": "completed", "videoUrl": "https://cdn/j1.mp4"}),
        ),
    );
    server.respond(
        "GET",
        "/single-clip/j7",
        CannedResponse::json(200, json!({"id": "j7", "status": "Queued"})),
    );
    let mut session = start(&server);
    session.sync_global_data().await;

    let job = session.check_status("j1").await?;
    assert!(job.status.is_completed());
    assert_eq!(job.playable_url(), Some("https://cdn/j1.mp4"));
    assert_eq!(session.history().len(), 2);
    let cached = session.history().iter().find(|j| j.id == "j1").unwrap();
    assert_eq!(cached.status, JobStatus::Completed);

    let unknown = session.check_status("j7").await?;
    assert_eq!(unknown.status, JobStatus::Unknown("Queued".to_string()));
    assert!(unknown.playable_url().is_none());
    assert_eq!(session.history().len(), 3);
    Ok(())
}

#[tokio::test]
async fn missing_job_surfaces_the_http_error() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    let mut session = start(&server);

    let err = session.check_status("nope").await.unwrap_err();
    match err {
        SessionError::Bridge(BridgeError::HttpStatus { code, body }) => {
            assert_eq!(code, 404);
            assert_eq!(body, "no such route");
        }
        other => panic!("expected an HTTP error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn dubbing_defaults_the_source_language() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/project/generate/dubbingV2",
        CannedResponse::json(200, json!({"projectId": "p1", "status": "started"})),
    );
    let session = start(&server);

    let ack = session
        .start_dubbing(" https://cdn/in.mp4 ", "es", "  ")
        .await?;
    assert_eq!(ack["projectId"], "p1");

    let seen = server.requests_to("/project/generate/dubbingV2");
    assert_eq!(
        seen[0].body,
        Some(json!({
            "sourceUrl": "https://cdn/in.mp4",
            "targetLanguage": "es",
            "sourceLanguage": AUTO_LANGUAGE
        }))
    );
    Ok(())
}

#[tokio::test]
async fn null_dubbing_acknowledgement_is_not_a_start() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/project/generate/dubbingV2",
        CannedResponse::raw(200, "null"),
    );
    let session = start(&server);

    let err = session
        .start_dubbing("https://x/v.mp4", "es", "")
        .await
        .unwrap_err();
    assert!(
        matches!(err, SessionError::Bridge(BridgeError::MalformedResponse { .. })),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn lipsync_and_template_pass_payloads_through() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/project/generate/lipsync",
        CannedResponse::json(201, json!({"projectId": "p2"})),
    );
    server.respond(
        "GET",
        "/project/p2/template",
        CannedResponse::json(200, json!({"scenes": [{"index": 0}]})),
    );
    let session = start(&server);

    let ack = session
        .start_lipsync("https://cdn/v.mp4", "https://cdn/a.mp3")
        .await?;
    assert_eq!(ack, json!({"projectId": "p2"}));
    let seen = server.requests_to("/project/generate/lipsync");
    assert_eq!(
        seen[0].body,
        Some(json!({"sourceUrl": "https://cdn/v.mp4", "targetAudioUrl": "https://cdn/a.mp3"}))
    );

    let template = session.project_template("p2").await?;
    assert_eq!(template["scenes"][0]["index"], 0);
    Ok(())
}

#[tokio::test]
async fn draft_script_calls_chat_with_bearer_and_model() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/v1/chat/completions",
        CannedResponse::json(
            200,
            json!({"choices": [{"message": {"role": "assistant", "content": "  Welcome to Pipio!  "}}]}),
        ),
    );
    let session = start(&server);
    assert!(session.has_chat());

    let script = session.draft_script("product launch").await?;
    assert_eq!(script, "Welcome to Pipio!");

    let seen = server.requests_to("/v1/chat/completions");
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].authorization.as_deref(), Some("Bearer sk-test"));
    let body = seen[0].body.as_ref().expect("chat request has a body");
    assert_eq!(body["model"], "test-model");
    let messages = body["messages"].as_array().expect("messages array");
    assert_eq!(messages.last().map(|m| m["role"].clone()), Some(json!("user")));
    assert!(
        messages
            .last()
            .and_then(|m| m["content"].as_str())
            .is_some_and(|c| c.contains("product launch"))
    );
    Ok(())
}

#[tokio::test]
async fn chat_reply_without_choices_is_malformed() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "POST",
        "/v1/chat/completions",
        CannedResponse::json(200, json!({"choices": []})),
    );
    let session = start(&server);

    let err = session.draft_script("anything").await.unwrap_err();
    assert!(
        matches!(err, SessionError::Bridge(BridgeError::MalformedResponse { .. })),
        "{err:?}"
    );
    Ok(())
}

#[tokio::test]
async fn listing_with_wrong_shape_is_malformed() -> TestResult<()> {
    let Some(server) = MockPipioServer::start_or_skip().await? else {
        return Ok(());
    };
    server.respond(
        "GET",
        "/actor",
        CannedResponse::json(200, json!({"items": [{"id": "a1"}]})),
    );
    let mut session = start(&server);

    let err = session.refresh_avatars().await.unwrap_err();
    assert!(matches!(err, BridgeError::MalformedResponse { .. }), "{err:?}");
    assert!(session.avatars().is_empty());
    Ok(())
}
