use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use crossbeam_channel::Sender;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::protocol::{parse_host_message, HostMessage};

pub fn is_valid_bind(value: &str) -> bool {
    value.parse::<SocketAddr>().is_ok()
}

pub fn router(tx: Sender<HostMessage>) -> Router {
    let tx_socket = tx.clone();
    let tx_ingest = tx;
    Router::new()
        .route(
            "/events",
            get(move |ws: WebSocketUpgrade| {
                let tx = tx_socket.clone();
                async move { ws.on_upgrade(move |socket| handle_socket(socket, tx)) }
            }),
        )
        .route(
            "/message",
            post(move |body: String| {
                let tx = tx_ingest.clone();
                async move { ingest_message(&body, &tx) }
            }),
        )
        .route("/health", get(|| async { "ok" }))
}

pub async fn run_host_server(bind: &str, tx: Sender<HostMessage>) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .with_context(|| format!("invalid host bind address: {bind}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed binding host listener on {addr}"))?;

    info!("host socket listening on ws://{addr}/events");
    info!("host messages accepted at http://{addr}/message");
    axum::serve(listener, router(tx))
        .await
        .context("axum serve failed")?;
    Ok(())
}

async fn handle_socket(mut socket: WebSocket, tx: Sender<HostMessage>) {
    while let Some(message_result) = socket.recv().await {
        match message_result {
            Ok(Message::Text(text)) => match parse_host_message(&text) {
                Ok(message) => {
                    if tx.send(message).is_err() {
                        error!("hud receiver dropped; closing host socket");
                        break;
                    }
                }
                Err(err) => {
                    warn!(?err, payload = %text, "ignored malformed host message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(err) => {
                error!(?err, "host socket receive error");
                break;
            }
        }
    }
}

fn ingest_message(body: &str, tx: &Sender<HostMessage>) -> (StatusCode, &'static str) {
    match parse_host_message(body) {
        Ok(message) => {
            if tx.send(message).is_ok() {
                (StatusCode::OK, "ok")
            } else {
                (StatusCode::SERVICE_UNAVAILABLE, "hud unavailable")
            }
        }
        Err(err) => {
            warn!(?err, payload = %body, "ignored malformed host message");
            (StatusCode::BAD_REQUEST, "bad message")
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use crossbeam_channel::unbounded;

    use super::{ingest_message, is_valid_bind};
    use crate::protocol::HostMessage;

    #[test]
    fn validates_bind_addresses() {
        assert!(is_valid_bind("127.0.0.1:38472"));
        assert!(is_valid_bind("0.0.0.0:9000"));
        assert!(!is_valid_bind("127.0.0.1"));
        assert!(!is_valid_bind("localhost:38472"));
        assert!(!is_valid_bind(""));
    }

    #[test]
    fn ingest_forwards_parsed_messages() {
        let (tx, rx) = unbounded();
        let reply = ingest_message(r#"{"_type":"hud:resetPosition"}"#, &tx);
        assert_eq!(reply, (StatusCode::OK, "ok"));
        assert_eq!(
            rx.try_recv().expect("message should be forwarded"),
            HostMessage::ResetPosition
        );
    }

    #[test]
    fn ingest_accepts_unknown_kinds() {
        let (tx, rx) = unbounded();
        let reply = ingest_message(r#"{"_type":"hud:flash"}"#, &tx);
        assert_eq!(reply.0, StatusCode::OK);
        assert_eq!(rx.try_recv().ok(), Some(HostMessage::Unknown));
    }

    #[test]
    fn ingest_rejects_malformed_payloads() {
        let (tx, rx) = unbounded();
        let reply = ingest_message(r#"{"_type":"audio","volume":0.5}"#, &tx);
        assert_eq!(reply.0, StatusCode::BAD_REQUEST);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn ingest_reports_missing_receiver() {
        let (tx, rx) = unbounded();
        drop(rx);
        let reply = ingest_message(r#"{"_type":"hud:getHudScale"}"#, &tx);
        assert_eq!(reply.0, StatusCode::SERVICE_UNAVAILABLE);
    }
}
