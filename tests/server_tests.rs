mod common;

use accountd::jwt::TokenConfig;
use accountd::{ServerConfig, db::Database, start_server};
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

async fn test_config() -> ServerConfig {
    ServerConfig {
        db: Database::open(":memory:").await.unwrap(),
        tokens: TokenConfig::new(common::ACCESS_SECRET, common::REFRESH_SECRET),
        secure_cookies: false,
        content_security_policy: "default-src 'self'".to_string(),
    }
}

/// Send a raw HTTP/1.1 request and return the full response text.
async fn send(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_server_answers_over_tcp() {
    let (handle, addr) = start_server(test_config().await, 0).await.unwrap();
    assert_ne!(addr.port(), 0);

    let response = send(
        addr,
        "GET /api/health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.contains(r#"{"status":"ok"}"#));
    assert!(
        response
            .to_lowercase()
            .contains("x-content-type-options: nosniff")
    );

    handle.abort();
}

#[tokio::test]
async fn test_server_sets_login_cookies_over_tcp() {
    let (handle, addr) = start_server(test_config().await, 0).await.unwrap();

    let register = r#"{"username":"alice","email":"a@x.com","password":"secret1"}"#;
    let response = send(
        addr,
        &format!(
            "POST /api/register HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            register.len(),
            register
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 201"), "{}", response);

    let login = r#"{"email":"a@x.com","password":"secret1"}"#;
    let response = send(
        addr,
        &format!(
            "POST /api/login HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            login.len(),
            login
        ),
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    let lower = response.to_lowercase();
    assert!(lower.contains("set-cookie: access_token="));
    assert!(lower.contains("set-cookie: refresh_token="));

    handle.abort();
}

#[tokio::test]
async fn test_start_server_rejects_invalid_config() {
    let mut config = test_config().await;
    config.tokens = TokenConfig::new(common::ACCESS_SECRET, common::ACCESS_SECRET);

    assert!(start_server(config, 0).await.is_err());
}
