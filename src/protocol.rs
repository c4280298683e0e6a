use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::CssPosition;

/// Messages pushed by the host script, discriminated by `_type`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "_type")]
pub enum HostMessage {
    #[serde(rename = "audio")]
    PlayAudio {
        file: String,
        #[serde(default = "full_volume")]
        volume: f32,
    },
    #[serde(rename = "setResourceName")]
    SetResourceName { name: String },
    #[serde(rename = "hud:setItemState")]
    SetItemState { item: String, state: bool },
    #[serde(rename = "hud:setHudScale")]
    SetHudScale { scale: f32 },
    #[serde(rename = "hud:getHudScale")]
    GetHudScale,
    #[serde(rename = "hud:setHudPosition")]
    SetHudPosition { pos: CssPosition },
    #[serde(rename = "hud:resetPosition")]
    ResetPosition,
    #[serde(rename = "hud:setMoveMode")]
    SetMoveMode { state: bool },
    #[serde(other)]
    Unknown,
}

fn full_volume() -> f32 {
    1.0
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::PlayAudio { .. } => "audio",
            HostMessage::SetResourceName { .. } => "setResourceName",
            HostMessage::SetItemState { .. } => "hud:setItemState",
            HostMessage::SetHudScale { .. } => "hud:setHudScale",
            HostMessage::GetHudScale => "hud:getHudScale",
            HostMessage::SetHudPosition { .. } => "hud:setHudPosition",
            HostMessage::ResetPosition => "hud:resetPosition",
            HostMessage::SetMoveMode { .. } => "hud:setMoveMode",
            HostMessage::Unknown => "unknown",
        }
    }
}

pub fn parse_host_message(text: &str) -> Result<HostMessage> {
    serde_json::from_str::<HostMessage>(text).context("payload is not a recognizable host message")
}

/// Callbacks posted back to the host script.
#[derive(Debug, Clone, PartialEq)]
pub enum HostNotification {
    HudPosition(CssPosition),
    MoveState(bool),
    HudScale(f32),
}

impl HostNotification {
    /// Callback name registered on the host side. The position callback keeps
    /// the host script's spelling.
    pub fn event_name(&self) -> &'static str {
        match self {
            HostNotification::HudPosition(_) => "hud:setHudPositon",
            HostNotification::MoveState(_) => "hud:setMoveState",
            HostNotification::HudScale(_) => "hud:sendHudScale",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            HostNotification::HudPosition(pos) => json!({ "left": pos.left, "top": pos.top }),
            HostNotification::MoveState(state) => json!({ "state": state }),
            HostNotification::HudScale(scale) => json!(scale),
        }
    }
}
