//! Integration tests for the chat screen against a real in-process HTTP server.

use std::sync::Arc;
use std::time::Duration;

use backchannel_client::{
    ChatOutcome, ChatScreen, ChatTurn, ClientSettings, QueryClient, TranscriptEntry,
    CHAT_FAILURE_MESSAGE,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn screen(server: &MockServer) -> ChatScreen {
    let settings = ClientSettings::new(
        format!("{}/api/query", server.uri()),
        format!("{}/api/chat", server.uri()),
    )
    .with_chat_context("test preamble");
    ChatScreen::new(QueryClient::new(settings).expect("client should build"))
}

async fn chat_bodies(server: &MockServer) -> Vec<serde_json::Value> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .iter()
        .map(|r| r.body_json::<serde_json::Value>().unwrap())
        .collect()
}

#[tokio::test]
async fn reply_is_appended_after_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hello" })))
        .expect(1)
        .mount(&server)
        .await;

    let screen = screen(&server);
    assert_eq!(screen.send("hi").await, ChatOutcome::Replied("hello".into()));

    assert_eq!(
        screen.conversation().to_request_turns(),
        vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")]
    );
    assert_eq!(
        screen.transcript(),
        vec![
            TranscriptEntry::User("hi".into()),
            TranscriptEntry::Assistant("hello".into())
        ]
    );
    assert!(!screen.is_loading());
}

#[tokio::test]
async fn each_request_replays_the_whole_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "hello" })))
        .mount(&server)
        .await;

    let screen = screen(&server);
    screen.set_deep_analysis(true);
    screen.set_use_search(true);
    screen.send("hi").await;
    screen.send("how are you").await;

    let bodies = chat_bodies(&server).await;
    assert_eq!(bodies.len(), 2);
    assert_eq!(
        bodies[1],
        json!({
            "messages": [
                { "role": "user", "content": "hi" },
                { "role": "assistant", "content": "hello" },
                { "role": "user", "content": "how are you" }
            ],
            "context": "test preamble",
            "deep_analysis": true,
            "use_search": true
        })
    );
}

#[tokio::test]
async fn failure_shows_error_entry_without_touching_conversation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let screen = screen(&server);
    let outcome = screen.send("anyone there?").await;

    assert_eq!(
        outcome,
        ChatOutcome::Failed {
            message: CHAT_FAILURE_MESSAGE.to_string()
        }
    );
    assert!(screen.conversation().is_empty());
    assert_eq!(
        screen.transcript(),
        vec![
            TranscriptEntry::User("anyone there?".into()),
            TranscriptEntry::Error(CHAT_FAILURE_MESSAGE.into())
        ]
    );
}

#[tokio::test]
async fn resend_after_failure_does_not_duplicate_user_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "here" })))
        .mount(&server)
        .await;

    let screen = screen(&server);
    assert!(matches!(screen.send("ping").await, ChatOutcome::Failed { .. }));
    assert_eq!(screen.send("ping").await, ChatOutcome::Replied("here".into()));

    let bodies = chat_bodies(&server).await;
    assert_eq!(
        bodies[1]["messages"],
        json!([{ "role": "user", "content": "ping" }])
    );
    assert_eq!(screen.conversation().len(), 2);
}

#[tokio::test]
async fn blank_message_is_dropped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "x" })))
        .expect(0)
        .mount(&server)
        .await;

    let screen = screen(&server);
    assert_eq!(screen.send("  ").await, ChatOutcome::Ignored);
    assert!(screen.transcript().is_empty());
}

#[tokio::test]
async fn newer_message_supersedes_slow_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({ "messages": [{ "role": "user", "content": "slow" }] }),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "response": "stale" }))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_partial_json(
            json!({ "messages": [{ "role": "user", "content": "fast" }] }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "response": "fresh" })))
        .mount(&server)
        .await;

    let screen = Arc::new(screen(&server));
    let slow = {
        let screen = Arc::clone(&screen);
        tokio::spawn(async move { screen.send("slow").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(screen.pending().as_deref(), Some("slow"));

    assert_eq!(screen.send("fast").await, ChatOutcome::Replied("fresh".into()));
    assert_eq!(slow.await.unwrap(), ChatOutcome::Superseded);

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(
        screen.conversation().to_request_turns(),
        vec![ChatTurn::user("fast"), ChatTurn::assistant("fresh")]
    );
    assert!(screen.pending().is_none());
}
