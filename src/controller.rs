use tracing::{debug, info, trace};

use crate::{
    protocol::{HostMessage, HostNotification},
    state::{CssPosition, HudState, IconKey, IconState},
};

const DEFAULT_VIEWPORT: [f32; 2] = [1920.0, 1080.0];

/// Side effects requested by the controller; the shell executes them.
#[derive(Debug, Clone, PartialEq)]
pub enum HudEffect {
    PlaySound { file: String, volume: f32 },
    Notify(HostNotification),
}

/// Gestures that leave move mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitGesture {
    Escape,
    Tab,
    Space,
    ContextMenu,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    last_x: f32,
    last_y: f32,
}

pub struct HudController {
    state: HudState,
    backup: CssPosition,
    drag: Option<DragSession>,
    move_mode: bool,
    viewport: [f32; 2],
}

impl HudController {
    pub fn new(state: HudState) -> Self {
        let backup = state.position.clone();
        Self {
            state,
            backup,
            drag: None,
            move_mode: false,
            viewport: DEFAULT_VIEWPORT,
        }
    }

    pub fn state(&self) -> &HudState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// While false the overlay window lets pointer input through to the game.
    pub fn move_mode(&self) -> bool {
        self.move_mode
    }

    pub fn set_viewport(&mut self, size: [f32; 2]) {
        if size[0] > 0.0 && size[1] > 0.0 {
            self.viewport = size;
        }
    }

    pub fn handle_message(&mut self, message: HostMessage) -> Vec<HudEffect> {
        trace!(kind = message.kind(), "host message");
        match message {
            HostMessage::PlayAudio { file, volume } => self.play_audio(file, volume),
            HostMessage::SetResourceName { name } => self.set_resource_name(name),
            HostMessage::SetItemState { item, state } => self.set_item_state(&item, state),
            HostMessage::SetHudScale { scale } => self.set_hud_scale(scale),
            HostMessage::GetHudScale => self.get_hud_scale(),
            HostMessage::SetHudPosition { pos } => self.set_hud_position(pos),
            HostMessage::ResetPosition => self.reset_position(),
            HostMessage::SetMoveMode { state } => self.set_move_mode(state),
            HostMessage::Unknown => Vec::new(),
        }
    }

    fn play_audio(&mut self, file: String, volume: f32) -> Vec<HudEffect> {
        let volume = if volume.is_finite() {
            volume.clamp(0.0, 1.0)
        } else {
            0.0
        };
        vec![HudEffect::PlaySound { file, volume }]
    }

    fn set_resource_name(&mut self, name: String) -> Vec<HudEffect> {
        info!(resource = %name, "host resource name set");
        self.state.resource_name = name;
        Vec::new()
    }

    fn set_item_state(&mut self, item: &str, on: bool) -> Vec<HudEffect> {
        if item == "hud" {
            self.state.visible = on;
        } else if let Some(key) = IconKey::from_item(item) {
            self.state.set_icon(key, IconState::from_flag(on));
        } else {
            trace!(item, "ignoring unknown hud item");
        }
        Vec::new()
    }

    fn set_hud_scale(&mut self, scale: f32) -> Vec<HudEffect> {
        if scale.is_finite() && scale > 0.0 {
            self.state.scale = scale;
        } else {
            debug!(scale, "ignoring non-positive hud scale");
        }
        Vec::new()
    }

    fn get_hud_scale(&mut self) -> Vec<HudEffect> {
        vec![HudEffect::Notify(HostNotification::HudScale(
            self.state.scale,
        ))]
    }

    fn set_hud_position(&mut self, pos: CssPosition) -> Vec<HudEffect> {
        self.state.position = pos;
        Vec::new()
    }

    fn reset_position(&mut self) -> Vec<HudEffect> {
        self.state.position = self.backup.clone();
        Vec::new()
    }

    fn set_move_mode(&mut self, enabled: bool) -> Vec<HudEffect> {
        debug!(enabled, "hud move mode set by host");
        self.move_mode = enabled;
        if !enabled {
            self.drag = None;
        }
        Vec::new()
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) {
        if !self.move_mode {
            return;
        }
        self.drag = Some(DragSession {
            last_x: x,
            last_y: y,
        });
    }

    /// Moves the overlay by the cursor delta since the last event. Returns
    /// whether a drag was in progress.
    pub fn pointer_move(&mut self, x: f32, y: f32) -> bool {
        let Some(session) = self.drag.as_mut() else {
            return false;
        };
        let dx = session.last_x - x;
        let dy = session.last_y - y;
        session.last_x = x;
        session.last_y = y;

        let [left, top] = self.state.position.resolve(self.viewport);
        self.state.position = CssPosition::from_px(left - dx, top - dy);
        true
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Leaves move mode and reports the final position. Gestures arriving
    /// outside move mode produce nothing.
    pub fn exit_move_mode(&mut self, gesture: ExitGesture) -> Vec<HudEffect> {
        self.drag = None;
        if !self.move_mode {
            trace!(?gesture, "exit gesture outside move mode");
            return Vec::new();
        }
        debug!(?gesture, "leaving hud move mode");
        self.move_mode = false;
        vec![
            HudEffect::Notify(HostNotification::HudPosition(self.state.position.clone())),
            HudEffect::Notify(HostNotification::MoveState(false)),
        ]
    }
}
