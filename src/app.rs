use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    time::Duration,
};

use crossbeam_channel::Receiver;
use eframe::egui::{
    self, Color32, Event, Key, PointerButton, Pos2, Rect, Stroke, TextureHandle,
    TextureOptions, Vec2,
};
use tracing::debug;

use crate::{
    audio::{sound_path, AudioPlayer, AudioRequest},
    bridge::HostBridge,
    config::HudConfig,
    controller::{ExitGesture, HudController, HudEffect},
    protocol::HostMessage,
    state::IconKey,
};

const ICON_SIZE: f32 = 128.0;
const ICON_SPACING: f32 = 6.0;

/// Local input distilled from one frame of egui events.
#[derive(Debug, Clone, Copy, PartialEq)]
enum HudInput {
    PointerDown(Pos2),
    PointerMove(Pos2),
    PointerUp,
    Exit(ExitGesture),
}

pub struct HudApp {
    controller: HudController,
    messages: Receiver<HostMessage>,
    audio: AudioPlayer,
    bridge: HostBridge,
    sounds_dir: PathBuf,
    textures_dir: PathBuf,
    texture_cache: HashMap<String, Option<TextureHandle>>,
    hud_rect: Option<Rect>,
    applied_passthrough: Option<bool>,
}

impl HudApp {
    pub fn new(config: &HudConfig, messages: Receiver<HostMessage>) -> Self {
        Self {
            controller: HudController::new(config.initial_state()),
            messages,
            audio: AudioPlayer::new(),
            bridge: HostBridge::spawn(config.outbound_base.clone(), config.post_timeout()),
            sounds_dir: config.sounds_dir.clone(),
            textures_dir: config.textures_dir.clone(),
            texture_cache: HashMap::new(),
            hud_rect: None,
            applied_passthrough: None,
        }
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.messages.try_recv() {
            let effects = self.controller.handle_message(message);
            self.apply_effects(effects);
        }
    }

    fn apply_effects(&mut self, effects: Vec<HudEffect>) {
        for effect in effects {
            match effect {
                HudEffect::PlaySound { file, volume } => self.audio.play(AudioRequest {
                    path: sound_path(&self.sounds_dir, &file),
                    volume,
                }),
                HudEffect::Notify(notification) => self
                    .bridge
                    .send(&self.controller.state().resource_name, &notification),
            }
        }
    }

    fn handle_input(&mut self, ctx: &egui::Context) {
        let events = ctx.input(|input| input.events.clone());
        for input in collect_inputs(&events) {
            match input {
                HudInput::PointerDown(pos) => {
                    if !self.controller.is_dragging()
                        && self.hud_rect.is_some_and(|rect| rect.contains(pos))
                    {
                        self.controller.pointer_down(pos.x, pos.y);
                    }
                }
                HudInput::PointerMove(pos) => {
                    self.controller.pointer_move(pos.x, pos.y);
                }
                HudInput::PointerUp => self.controller.pointer_up(),
                HudInput::Exit(gesture) => {
                    let effects = self.controller.exit_move_mode(gesture);
                    self.apply_effects(effects);
                }
            }
        }
    }

    fn draw_hud(&mut self, ctx: &egui::Context) {
        if !self.controller.state().visible {
            self.hud_rect = None;
            return;
        }

        let state = self.controller.state();
        let [left, top] = state.position.resolve(self.controller_viewport(ctx));
        let size = ICON_SIZE * state.scale;
        let assets: Vec<(IconKey, String)> = IconKey::ALL
            .into_iter()
            .map(|key| (key, state.icon_asset(key)))
            .collect();
        let icons: Vec<(IconKey, Option<TextureHandle>)> = assets
            .into_iter()
            .map(|(key, asset)| (key, self.load_texture(ctx, &asset)))
            .collect();

        let response = egui::Area::new(egui::Id::new("lvc_hud"))
            .order(egui::Order::Foreground)
            .fixed_pos(Pos2::new(left, top))
            .movable(false)
            .show(ctx, |ui| {
                ui.spacing_mut().item_spacing = Vec2::splat(ICON_SPACING * size / ICON_SIZE);
                ui.horizontal(|ui| {
                    for (key, texture) in &icons {
                        match texture {
                            Some(texture) => {
                                ui.image((texture.id(), Vec2::splat(size)));
                            }
                            None => draw_placeholder(ui, key.name(), size),
                        }
                    }
                });
            });
        self.hud_rect = Some(response.response.rect);
    }

    /// Overlay is click-through except while the host has it in move mode.
    fn sync_mouse_passthrough(&mut self, ctx: &egui::Context) {
        let passthrough = !self.controller.move_mode();
        if self.applied_passthrough == Some(passthrough) {
            return;
        }
        debug!(passthrough, "updating overlay mouse passthrough");
        ctx.send_viewport_cmd(egui::ViewportCommand::MousePassthrough(passthrough));
        if !passthrough {
            ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        }
        self.applied_passthrough = Some(passthrough);
    }

    fn controller_viewport(&self, ctx: &egui::Context) -> [f32; 2] {
        let screen = ctx.screen_rect();
        [screen.width(), screen.height()]
    }

    fn load_texture(&mut self, ctx: &egui::Context, asset: &str) -> Option<TextureHandle> {
        if let Some(existing) = self.texture_cache.get(asset) {
            return existing.clone();
        }
        let path = self.textures_dir.join(asset);
        let texture = load_color_image(&path)
            .map(|image| ctx.load_texture(format!("hud://{asset}"), image, TextureOptions::LINEAR));
        if texture.is_none() {
            debug!(path = %path.display(), "hud texture unavailable; drawing placeholder");
        }
        self.texture_cache.insert(asset.to_owned(), texture.clone());
        texture
    }
}

impl eframe::App for HudApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();
        let viewport = self.controller_viewport(ctx);
        self.controller.set_viewport(viewport);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::TRANSPARENT))
            .show(ctx, |_ui| {});

        self.draw_hud(ctx);
        self.handle_input(ctx);
        self.sync_mouse_passthrough(ctx);
        ctx.request_repaint_after(Duration::from_millis(33));
    }
}

fn collect_inputs(events: &[Event]) -> Vec<HudInput> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::PointerButton {
                pos,
                button: PointerButton::Primary,
                pressed: true,
                ..
            } => Some(HudInput::PointerDown(*pos)),
            Event::PointerButton {
                button: PointerButton::Primary,
                pressed: false,
                ..
            } => Some(HudInput::PointerUp),
            Event::PointerButton {
                button: PointerButton::Secondary,
                pressed: true,
                ..
            } => Some(HudInput::Exit(ExitGesture::ContextMenu)),
            Event::PointerMoved(pos) => Some(HudInput::PointerMove(*pos)),
            Event::Key {
                key,
                pressed: false,
                ..
            } => exit_gesture_for_key(*key).map(HudInput::Exit),
            _ => None,
        })
        .collect()
}

fn exit_gesture_for_key(key: Key) -> Option<ExitGesture> {
    match key {
        Key::Escape => Some(ExitGesture::Escape),
        Key::Tab => Some(ExitGesture::Tab),
        Key::Space => Some(ExitGesture::Space),
        _ => None,
    }
}

fn draw_placeholder(ui: &mut egui::Ui, label: &str, size: f32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(size), egui::Sense::hover());
    let painter = ui.painter();
    painter.rect(
        rect,
        4.0,
        Color32::from_rgba_premultiplied(12, 12, 12, 160),
        Stroke::new(1.0, Color32::from_gray(140)),
    );
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        label,
        egui::FontId::proportional((size / 5.0).max(8.0)),
        Color32::from_gray(200),
    );
}

fn load_color_image(path: &Path) -> Option<egui::ColorImage> {
    let img = image::open(path).ok()?.to_rgba8();
    let size = [
        usize::try_from(img.width()).ok()?,
        usize::try_from(img.height()).ok()?,
    ];
    let pixels = img.into_raw();
    Some(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}
