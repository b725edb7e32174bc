/*
[INPUT]:  Mock console server responses
[OUTPUT]: End-to-end results for polling chains, login redirect and app wiring
[POS]:    Integration tests - poller against real HTTP
[UPDATE]: When polling, redirect or startup flow changes
*/

mod common;

use std::sync::Arc;
use std::time::Duration;

use chaperone_adapter::{Category, ClientConfig, RunAction, RunCommandRequest, TailSource};
use chaperone_tail::{AppContext, ChainExit, PollState, RenderPolicy, TailConfig};
use common::{Harness, TEST_INTERVAL, request_count, wait_for_request_count};
use tokio::time::timeout;
use tokio_test::assert_ok;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_concurrent_unauthorized_redirects_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, ClientConfig::default(), RenderPolicy::Append);
    let nsx = TailSource::command(Category::Configure, "nsx");
    let sddc = TailSource::command(Category::Deploy, "sddc");
    harness.mount(&nsx);
    harness.mount(&sddc);

    let first = harness.poller.start(nsx);
    let second = harness.poller.start(sddc);
    timeout(WAIT, harness.poller.wait_idle())
        .await
        .expect("chains should stop");

    assert_eq!(harness.navigator.redirect_count(), 1);
    assert_eq!(harness.navigator.location().as_deref(), Some("/login"));
    assert!(harness.document.container_ids().is_empty());
    assert_eq!(first.state(), PollState::Idle);
    assert_eq!(second.state(), PollState::Idle);

    // Nothing polls once the page is gone.
    let seen = request_count(&server).await;
    tokio::time::sleep(TEST_INTERVAL * 4).await;
    assert_eq!(request_count(&server).await, seen);
}

#[tokio::test]
async fn test_removed_container_stops_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploy/tail/sddc"))
        .and(header("cookie", "sessionid=test-session"))
        .respond_with(ResponseTemplate::new(200).set_body_string("step 1\n"))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, ClientConfig::default(), RenderPolicy::ReplaceIfChanged);
    let source = TailSource::command(Category::Deploy, "sddc");
    harness.mount(&source);

    let handle = harness.poller.start(source.clone());
    wait_for_request_count(&server, 3, WAIT).await;

    assert!(harness.document.remove_container(&source.container_region_id()));
    let exit = timeout(WAIT, handle.join()).await.expect("chain should stop");
    assert_eq!(exit, Some(ChainExit::RegionRemoved));

    let seen = request_count(&server).await;
    tokio::time::sleep(TEST_INTERVAL * 4).await;
    assert_eq!(request_count(&server).await, seen);

    // Unchanged body renders only once under replace.
    let region = harness
        .document
        .output(&source.output_region_id())
        .expect("output region");
    assert_eq!(region.text(), "step 1\n");
    assert_eq!(region.render_count(), 1);
}

#[tokio::test]
async fn test_timeout_shows_message_and_halts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/execute/tail"))
        .and(query_param("mname", "Infrastructure"))
        .and(query_param("gname", "NSX"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client_config = ClientConfig {
        timeout: Duration::from_millis(100),
        ..ClientConfig::default()
    };
    let harness = Harness::new(&server, client_config, RenderPolicy::Append);
    let source = TailSource::execute("2", "Infrastructure", "NSX");
    harness.mount(&source);

    let handle = harness.poller.start(source.clone());
    let exit = timeout(WAIT, handle.join()).await.expect("chain should stop");

    assert_eq!(
        exit,
        Some(ChainExit::Failed {
            message: "Request timed out.".to_string()
        })
    );
    assert_eq!(
        harness.messages.current_text().as_deref(),
        Some("Request timed out.")
    );
    assert_eq!(harness.navigator.redirect_count(), 0);
    assert!(harness.document.has_container(&source.container_region_id()));
    assert_eq!(handle.polls_completed(), 1);
}

#[tokio::test]
async fn test_server_error_message_uses_status_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let harness = Harness::new(&server, ClientConfig::default(), RenderPolicy::Append);
    let source = TailSource::command(Category::Configure, "vcenter");
    harness.mount(&source);

    let exit = timeout(WAIT, harness.poller.start(source).join())
        .await
        .expect("chain should stop");

    assert_eq!(
        exit,
        Some(ChainExit::Failed {
            message: "502 Bad Gateway.".to_string()
        })
    );
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_app_context_run_then_tail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/deploy/run/sddc"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deploy/tail/sddc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deploying\n"))
        .mount(&server)
        .await;

    let mut config = TailConfig::default();
    config.server.base_url = server.uri();
    config.server.session_id = Some("test-session".to_string());
    config.poll.interval_ms = 50;
    config.poll.initial_delay_ms = 20;
    config.poll.policy = RenderPolicy::Append;

    let ctx = Arc::new(assert_ok!(AppContext::from_config(config)));
    assert_ok!(ctx.init());

    let request = RunCommandRequest::new(Category::Deploy, "sddc", RunAction::Run);
    let handle = assert_ok!(ctx.runner().start_command(&request).await);
    wait_for_request_count(&server, 3, WAIT).await;

    let source = request.source();
    ctx.document().remove_container(&source.container_region_id());
    let exit = timeout(WAIT, handle.join()).await.expect("chain should stop");
    assert_eq!(exit, Some(ChainExit::RegionRemoved));

    let text = ctx
        .document()
        .output(&source.output_region_id())
        .expect("output region")
        .text();
    assert!(text.starts_with("Starting to run sddc deployment...\n"));
    assert!(text.contains("deploying\n"));
    assert!(ctx.messages().current_text().is_none());
}

#[tokio::test]
async fn test_app_context_run_failure_does_not_poll() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/configure/run/nsx"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let mut config = TailConfig::default();
    config.server.base_url = server.uri();

    let ctx = assert_ok!(AppContext::from_config(config));
    let request = RunCommandRequest::new(Category::Configure, "nsx", RunAction::Validate);
    let err = ctx.runner().start_command(&request).await.unwrap_err();

    assert_eq!(err.user_message(), "401 Unauthorized.");
    assert!(ctx.navigator().is_redirected());
    assert!(ctx.poller().active_chains().is_empty());
    tokio::time::sleep(TEST_INTERVAL * 2).await;
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_default_config_shows_unchanged_log_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/deploy/tail/sddc"))
        .respond_with(ResponseTemplate::new(200).set_body_string("step 1\n"))
        .mount(&server)
        .await;

    let mut config = TailConfig::default();
    config.server.base_url = server.uri();
    config.poll.interval_ms = 50;

    let ctx = assert_ok!(AppContext::from_config(config));
    let source = TailSource::command(Category::Deploy, "sddc");
    let handle = ctx.runner().watch(source.clone());
    wait_for_request_count(&server, 4, WAIT).await;

    ctx.document().remove_container(&source.container_region_id());
    let exit = timeout(WAIT, handle.join()).await.expect("chain should stop");
    assert_eq!(exit, Some(ChainExit::RegionRemoved));

    let region = ctx
        .document()
        .output(&source.output_region_id())
        .expect("output region");
    assert_eq!(region.text(), "step 1\n");
    assert_eq!(region.render_count(), 1);
}
