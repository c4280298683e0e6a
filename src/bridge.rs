use std::{thread, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::protocol::HostNotification;

#[derive(Debug, Clone, PartialEq)]
struct OutboundPost {
    event: &'static str,
    url: String,
    body: Value,
}

/// Fire-and-forget channel back to the host script. Posts are delivered on a
/// worker thread; failures are logged and never retried.
#[derive(Clone)]
pub struct HostBridge {
    tx: Sender<OutboundPost>,
    outbound_base: Option<String>,
}

impl HostBridge {
    pub fn spawn(outbound_base: Option<String>, timeout: Duration) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded::<OutboundPost>();
        thread::spawn(move || run_delivery_loop(rx, timeout));
        Self { tx, outbound_base }
    }

    pub fn send(&self, resource_name: &str, notification: &HostNotification) {
        let resource_name = resource_name.trim();
        let event = notification.event_name();
        if resource_name.is_empty() {
            warn!(event, "host resource name unknown; dropping notification");
            return;
        }
        let post = OutboundPost {
            event,
            url: endpoint_url(self.outbound_base.as_deref(), resource_name, event),
            body: notification.body(),
        };
        if self.tx.send(post).is_err() {
            warn!(event, "host bridge worker stopped; dropping notification");
        }
    }
}

pub fn endpoint_url(outbound_base: Option<&str>, resource_name: &str, event: &str) -> String {
    match outbound_base
        .map(|base| base.trim().trim_end_matches('/'))
        .filter(|base| !base.is_empty())
    {
        Some(base) => format!("{base}/{resource_name}/{event}"),
        None => format!("http://{resource_name}/{event}"),
    }
}

fn is_ok_ack(body: &str) -> bool {
    body.trim() == "ok"
}

fn run_delivery_loop(rx: Receiver<OutboundPost>, timeout: Duration) {
    let client = match Client::builder().timeout(timeout).build() {
        Ok(client) => client,
        Err(err) => {
            warn!(?err, "host http client init failed; notifications disabled");
            return;
        }
    };
    while let Ok(post) = rx.recv() {
        deliver(&client, &post);
    }
}

fn deliver(client: &Client, post: &OutboundPost) {
    let response = match client.post(&post.url).json(&post.body).send() {
        Ok(response) => response,
        Err(err) => {
            warn!(?err, url = %post.url, "host notification failed");
            return;
        }
    };
    match response.text() {
        Ok(body) if is_ok_ack(&body) => debug!(event = post.event, "host acknowledged"),
        Ok(body) => warn!(event = post.event, body = %body, "host did not acknowledge"),
        Err(err) => warn!(?err, event = post.event, "failed reading host response"),
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::unbounded;
    use serde_json::json;

    use super::{endpoint_url, is_ok_ack, HostBridge, OutboundPost};
    use crate::{protocol::HostNotification, state::CssPosition};

    fn bridge_with_queue(
        outbound_base: Option<&str>,
    ) -> (HostBridge, crossbeam_channel::Receiver<OutboundPost>) {
        let (tx, rx) = unbounded();
        (
            HostBridge {
                tx,
                outbound_base: outbound_base.map(str::to_owned),
            },
            rx,
        )
    }

    #[test]
    fn builds_resource_urls() {
        assert_eq!(
            endpoint_url(None, "lvc", "hud:setMoveState"),
            "http://lvc/hud:setMoveState"
        );
        assert_eq!(
            endpoint_url(Some("http://127.0.0.1:30120/"), "lvc", "hud:sendHudScale"),
            "http://127.0.0.1:30120/lvc/hud:sendHudScale"
        );
        assert_eq!(
            endpoint_url(Some("  "), "lvc", "hud:setMoveState"),
            "http://lvc/hud:setMoveState"
        );
    }

    #[test]
    fn only_literal_ok_counts_as_ack() {
        assert!(is_ok_ack("ok"));
        assert!(is_ok_ack("ok\n"));
        assert!(!is_ok_ack("OK"));
        assert!(!is_ok_ack("{\"ok\":true}"));
        assert!(!is_ok_ack(""));
    }

    #[test]
    fn queues_post_with_json_body() {
        let (bridge, rx) = bridge_with_queue(None);
        bridge.send(
            "lvc",
            &HostNotification::HudPosition(CssPosition::from_px(10.0, 20.0)),
        );
        let post = rx.try_recv().expect("post should be queued");
        assert_eq!(post.url, "http://lvc/hud:setHudPositon");
        assert_eq!(post.body, json!({"left": "10px", "top": "20px"}));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn drops_notifications_without_resource_name() {
        let (bridge, rx) = bridge_with_queue(None);
        bridge.send("", &HostNotification::MoveState(false));
        assert!(rx.try_recv().is_err());
    }
}
