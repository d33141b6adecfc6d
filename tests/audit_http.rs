mod common;

use common::{closed_port_url, StubServer};
use playlist_cloud::audit::{EndpointStatus, HealthAuditor};
use playlist_cloud::console::Console;

#[test]
fn test_healthy_endpoint_reports_ok() {
    let server = StubServer::start(vec![(200, "[]")]);
    let auditor = HealthAuditor::new(&server.config());
    let mut console = Console::buffered();

    let report = auditor.run(&mut console);

    assert!(report.all_healthy());
    assert!(console.out_text().contains("[AUDIT] [OK]"));
    assert!(console.out_text().contains("responded with 200"));
    assert!(console.err_text().is_empty());

    let request = server.next_request();
    assert_eq!(request.target, "/rest/v1/user_playlists?select=id&limit=1");
    assert_eq!(request.header("apikey"), Some("test-key"));
}

#[test]
fn test_server_error_is_reported_as_unhealthy() {
    let server = StubServer::start(vec![(500, r#"{"message":"boom"}"#)]);
    let auditor = HealthAuditor::new(&server.config());
    let mut console = Console::buffered();

    let report = auditor.run(&mut console);

    assert_eq!(report.results[0].1, EndpointStatus::Unhealthy(500));
    let err = console.err_text();
    assert!(err.contains("[AUDIT] [FAIL]"));
    assert!(err.contains("500"));
    assert!(console.out_text().contains("[AUDIT] Backend audit complete."));
}

#[test]
fn test_unreachable_endpoint_does_not_abort_the_audit() {
    let server = StubServer::start(vec![(200, "[]")]);
    let dead = format!("{}/rest/v1/user_playlists", closed_port_url());
    let live = format!("{}/rest/v1/user_playlists", server.base_url);
    let auditor = HealthAuditor::new(&server.config()).with_endpoints(vec![dead, live]);
    let mut console = Console::buffered();

    let report = auditor.run(&mut console);

    assert!(matches!(report.results[0].1, EndpointStatus::Unreachable(_)));
    assert_eq!(report.results[1].1, EndpointStatus::Healthy(200));
    assert!(console.err_text().contains("[AUDIT] [ERROR]"));
    assert!(console.err_text().contains("is unreachable"));
    assert!(!report.all_healthy());
}
