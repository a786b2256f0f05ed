use clashcli_cli::{Answer, Interactive};
use clashcli_core::{ClientOptions, ControlClient, Error, TableRenderer};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::collections::VecDeque;

const PROXIES: &str = r#"{"proxies": {
    "Proxy": {"type": "Selector", "now": "A", "all": ["A", "B"]},
    "A": {"type": "Shadowsocks", "history": [{"time": "2024-05-01T10:00:00.000Z", "delay": 120}]},
    "B": {"type": "Vmess", "history": [{"time": "2024-05-01T10:00:00.000Z", "delay": 0}]},
    "GLOBAL": {"type": "Fallback", "now": "Proxy", "all": ["Proxy"]}
}}"#;

async fn controller() -> (ServerGuard, Mock, ControlClient) {
    let mut server = Server::new_async().await;
    let proxies = server
        .mock("GET", "/proxies")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(PROXIES)
        .expect_at_least(1)
        .create_async()
        .await;

    let address = server.socket_address();
    let client = ControlClient::new(ClientOptions {
        host: address.ip().to_string(),
        port: address.port(),
        ..ClientOptions::default()
    })
    .unwrap();
    (server, proxies, client)
}

fn script(lines: &[&str]) -> VecDeque<String> {
    lines.iter().map(|s| s.to_string()).collect()
}

#[test_log::test(tokio::test)]
async fn switching_selector_to_second_member() {
    let (mut server, proxies, client) = controller().await;
    let switch = server
        .mock("PUT", "/proxies/Proxy")
        .match_body(Matcher::Json(serde_json::json!({"name": "B"})))
        .with_status(204)
        .create_async()
        .await;

    let mut flow = Interactive::new(&client, TableRenderer::new(30), script(&["1", "2"]), Vec::new());
    assert_eq!(flow.switch_proxy().await.unwrap(), Answer::Value(()));

    switch.assert_async().await;
    proxies.assert_async().await;

    let out = String::from_utf8(flow.into_output()).unwrap();
    let rows: Vec<Vec<&str>> = out.lines().map(|l| l.split_whitespace().collect()).collect();
    // 只列出 Selector 组
    assert!(rows.contains(&vec!["1", "Proxy", "A", "1"]));
    assert!(!out.contains("GLOBAL"));

    assert!(rows.contains(&vec!["1", "A", "120", "1"]));
    assert!(rows.contains(&vec!["2", "B", "timeout", "2"]));
    assert!(out.contains("Selector update succeed!"));
}

#[tokio::test]
async fn empty_input_cancels_without_switching() {
    for input in [vec![""], vec!["1", ""], vec![]] {
        let (mut server, _proxies, client) = controller().await;
        let switch = server.mock("PUT", Matcher::Any).expect(0).create_async().await;

        let mut flow = Interactive::new(&client, TableRenderer::default(), script(&input), Vec::new());
        assert_eq!(flow.switch_proxy().await.unwrap(), Answer::Cancelled);
        switch.assert_async().await;
    }
}

#[tokio::test]
async fn out_of_range_index_aborts_without_switching() {
    for input in [vec!["0"], vec!["-2"], vec!["1", "3"]] {
        let (mut server, _proxies, client) = controller().await;
        let switch = server.mock("PUT", Matcher::Any).expect(0).create_async().await;

        let mut flow = Interactive::new(&client, TableRenderer::default(), script(&input), Vec::new());
        let err = flow.switch_proxy().await.unwrap_err();
        assert!(matches!(err, Error::SelectionOutOfRange(_)), "{input:?}: {err:?}");
        switch.assert_async().await;
    }
}

#[tokio::test]
async fn missing_member_is_reported() {
    let (mut server, _proxies, client) = controller().await;
    let _switch = server
        .mock("PUT", "/proxies/Proxy")
        .with_status(400)
        .create_async()
        .await;

    let mut flow = Interactive::new(&client, TableRenderer::default(), script(&["1", "1"]), Vec::new());
    let err = flow.switch_proxy().await.unwrap_err();
    assert!(matches!(err, Error::InvalidValue(_)));
}

#[tokio::test]
async fn unknown_status_keeps_code() {
    let (mut server, _proxies, client) = controller().await;
    let _switch = server
        .mock("PUT", "/proxies/Proxy")
        .with_status(502)
        .create_async()
        .await;

    let mut flow = Interactive::new(&client, TableRenderer::default(), script(&["1", "2"]), Vec::new());
    let err = flow.switch_proxy().await.unwrap_err();
    assert!(matches!(err, Error::UnknownDaemon(502)));
    assert_eq!(err.to_string(), "Unknown error code[502]");
}
