//! Exercises the HTTP client against a throwaway single-connection server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use repomirror_client::HttpInstanceClient;
use repomirror_core::{
    ClientError, CreateRemoteRepository, Credentials, PackageType, RepoInstanceClient,
    RepositoryId, WorkspaceId,
};
use serde_json::Value;

/// What the fake server saw.
#[derive(Debug)]
struct Captured {
    method: String,
    path: String,
    authorization: Option<String>,
    body: String,
}

/// Serve exactly one request with the given status and JSON body.
fn serve_once(status: u16, response_body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or_default().to_string();
        let path = parts.next().unwrap_or_default().to_string();

        let mut content_length = 0usize;
        let mut authorization = None;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header line");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                let value = value.trim().to_string();
                match name.to_ascii_lowercase().as_str() {
                    "content-length" => content_length = value.parse().expect("content length"),
                    "authorization" => authorization = Some(value),
                    _ => {}
                }
            }
        }

        let mut body = vec![0u8; content_length];
        reader.read_exact(&mut body).expect("body");

        let reason = if status < 300 { "OK" } else { "Error" };
        let response = format!(
            "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
            response_body.len()
        );
        let mut stream = stream;
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush");

        Captured {
            method,
            path,
            authorization,
            body: String::from_utf8(body).expect("utf8 body"),
        }
    });

    (format!("http://{addr}"), handle)
}

fn client(base_url: &str, credentials: Credentials) -> HttpInstanceClient {
    HttpInstanceClient::new("eu", base_url, &credentials, Duration::from_secs(5)).expect("client")
}

#[test]
fn list_workspaces_sends_basic_auth() {
    let (url, server) = serve_once(200, r#"[{"id":"w1","name":"A"}]"#);
    let workspaces = client(&url, Credentials::new("admin", "secret"))
        .list_workspaces()
        .expect("list");
    let seen = server.join().expect("server");

    assert_eq!(seen.method, "GET");
    assert_eq!(seen.path, "/workspace");
    assert_eq!(seen.authorization.as_deref(), Some("Basic YWRtaW46c2VjcmV0"));
    assert_eq!(workspaces.len(), 1);
    assert_eq!(workspaces[0].name, "A");
}

#[test]
fn create_workspace_returns_assigned_id() {
    let (url, server) = serve_once(200, r#"{"workspaceId":"w-new"}"#);
    let id = client(&url, Credentials::default())
        .create_workspace("A")
        .expect("create");
    let seen = server.join().expect("server");

    assert_eq!(id, WorkspaceId::from("w-new"));
    assert_eq!(seen.method, "POST");
    let body: Value = serde_json::from_str(&seen.body).expect("json body");
    assert_eq!(body, serde_json::json!({"name": "A"}));
    assert_eq!(seen.authorization, None);
}

#[test]
fn delete_workspace_sends_name_in_body() {
    let (url, server) = serve_once(200, "{}");
    client(&url, Credentials::default())
        .delete_workspace("C")
        .expect("delete");
    let seen = server.join().expect("server");

    assert_eq!(seen.method, "DELETE");
    assert_eq!(seen.path, "/workspace");
    let body: Value = serde_json::from_str(&seen.body).expect("json body");
    assert_eq!(body, serde_json::json!({"workspaceName": "C"}));
}

#[test]
fn create_remote_repository_omits_incomplete_credentials() {
    let (url, server) = serve_once(200, "{}");
    let request = CreateRemoteRepository::new(
        "remote-pkg1",
        PackageType::from("GENERIC"),
        "https://src/GENERIC/A/pkg1",
        &Credentials::new("", "orphan-password"),
    );
    client(&url, Credentials::default())
        .create_remote_repository(&WorkspaceId::from("w1"), &request)
        .expect("create");
    let seen = server.join().expect("server");

    assert_eq!(seen.path, "/w1/repositories/remote");
    let body: Value = serde_json::from_str(&seen.body).expect("json body");
    assert_eq!(body["packageType"], "GENERIC");
    assert_eq!(body["remoteRepositoryUrl"], "https://src/GENERIC/A/pkg1");
    assert_eq!(body["isRemoteCacheEnabled"], Value::Bool(true));
    assert!(body.get("remoteRepositoryUsername").is_none());
    assert!(body.get("remoteRepositoryPassword").is_none());
}

#[test]
fn delete_repository_starts_manual_task() {
    let (url, server) = serve_once(200, "{}");
    client(&url, Credentials::default())
        .delete_repository(&RepositoryId::from("r7"))
        .expect("delete");
    let seen = server.join().expect("server");

    assert_eq!(seen.path, "/manualTask/start");
    let body: Value = serde_json::from_str(&seen.body).expect("json body");
    assert_eq!(body["type"], "deleteRepository");
    assert_eq!(body["additionalData"]["repositoryId"], "r7");
}

#[test]
fn conflict_status_maps_to_conflict_error() {
    let (url, server) = serve_once(409, r#"{"message":"workspace exists"}"#);
    let err = client(&url, Credentials::default())
        .create_workspace("A")
        .unwrap_err();
    server.join().expect("server");

    match err {
        ClientError::Conflict { instance, body } => {
            assert_eq!(instance, "eu");
            assert!(body.contains("workspace exists"));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn server_error_keeps_response_body() {
    let (url, server) = serve_once(500, r#"{"message":"boom"}"#);
    let err = client(&url, Credentials::default())
        .list_repositories(&WorkspaceId::from("w1"))
        .unwrap_err();
    server.join().expect("server");

    assert!(matches!(err, ClientError::Status { status: 500, .. }), "got: {err:?}");
    assert!(err.to_string().contains("boom"));
}

#[test]
fn malformed_listing_is_a_decode_error() {
    let (url, server) = serve_once(200, r#"{"not":"a list"}"#);
    let err = client(&url, Credentials::default())
        .list_workspaces()
        .unwrap_err();
    server.join().expect("server");

    assert!(matches!(err, ClientError::Decode { .. }), "got: {err:?}");
}

#[test]
fn unreachable_instance_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client(&format!("http://{addr}"), Credentials::default())
        .list_workspaces()
        .unwrap_err();
    assert!(
        matches!(&err, ClientError::Transport { instance, .. } if instance == "eu"),
        "got: {err:?}"
    );
}
