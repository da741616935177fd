use std::time::{Duration, Instant};

use grab_engine::{
    BackendSettings, EngineConfig, EngineEvent, EngineHandle, Quality, RequestOutcome,
};
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn engine_for(server: &MockServer, output_dir: &TempDir) -> EngineHandle {
    let config = EngineConfig {
        settings: BackendSettings {
            base_url: server.uri(),
            ..BackendSettings::default()
        },
        output_dir: output_dir.path().to_path_buf(),
    };
    EngineHandle::new(config).expect("engine handle")
}

fn wait_for_completions(engine: &EngineHandle, count: usize) -> Vec<EngineEvent> {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut completed = Vec::new();
    while completed.len() < count {
        assert!(Instant::now() < deadline, "timed out waiting for events");
        match engine.try_recv() {
            Some(event @ EngineEvent::RequestCompleted { .. }) => completed.push(event),
            Some(EngineEvent::Progress(_)) => {}
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    }
    completed
}

#[tokio::test(flavor = "multi_thread")]
async fn commands_complete_in_issue_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/profile/chunk"))
        .and(body_json(json!({
            "profile_url": "https://site.example/@creator",
            "offset": 0,
            "limit": 2,
        })))
        .respond_with(
            ResponseTemplate::new(200)
                // The first call is the slow one; serialized execution must
                // still deliver it first.
                .set_delay(Duration::from_millis(150))
                .set_body_json(json!({
                    "videos": ["https://videos.example/v0", "https://videos.example/v1"],
                    "offset": 0,
                    "count": 2,
                })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/profile/chunk"))
        .and(body_json(json!({
            "profile_url": "https://site.example/@creator",
            "offset": 2,
            "limit": 2,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "videos": [],
            "offset": 2,
            "count": 0,
        })))
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);
    engine.fetch_chunk(1, "https://site.example/@creator", 0, 2);
    engine.fetch_chunk(2, "https://site.example/@creator", 2, 2);

    let events = wait_for_completions(&engine, 2);
    let ids: Vec<_> = events
        .iter()
        .map(|event| match event {
            EngineEvent::RequestCompleted { request_id, .. } => *request_id,
            EngineEvent::Progress(_) => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test(flavor = "multi_thread")]
async fn downloaded_video_lands_in_the_output_dir() {
    let server = MockServer::start().await;
    let body = b"fake mp4 payload".to_vec();
    Mock::given(method("POST"))
        .and(path("/video"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Content-Type", "video/mp4")
                .set_body_bytes(body.clone()),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);
    engine.download_video(9, 0, "https://videos.example/v0", Quality::Best);

    let events = wait_for_completions(&engine, 1);
    let saved = match &events[0] {
        EngineEvent::RequestCompleted {
            request_id: 9,
            result: Ok(RequestOutcome::Video(saved)),
        } => saved.clone(),
        other => panic!("unexpected event: {other:?}"),
    };

    assert_eq!(saved.index, Some(0));
    assert_eq!(saved.byte_len, body.len() as u64);
    assert!(saved.path.starts_with(output.path()));
    assert_eq!(std::fs::read(&saved.path).unwrap(), body);
    let name = saved.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("video_0000--"));
    assert!(name.ends_with(".mp4"));
}
