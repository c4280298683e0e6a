mod app;
mod audio;
mod bridge;
mod config;
mod controller;
mod protocol;
mod server;
mod state;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::{
    app::HudApp,
    config::HudConfig,
    protocol::HostMessage,
    server::{is_valid_bind, run_host_server},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let (config, config_path) = HudConfig::load_or_create()?;
    info!(path = %config_path.display(), "loaded hud config");
    let (tx, rx) = crossbeam_channel::unbounded::<HostMessage>();

    let bind = config.bind.trim().to_owned();
    if is_valid_bind(&bind) {
        tokio::spawn(async move {
            if let Err(err) = run_host_server(&bind, tx).await {
                error!(?err, bind = %bind, "host server crashed");
            }
        });
    } else {
        warn!(bind = %bind, "bind address is invalid; host messages disabled");
    }

    let viewport = eframe::egui::ViewportBuilder::default()
        .with_title("LVC HUD")
        .with_transparent(true)
        .with_decorations(false)
        .with_maximized(true)
        .with_always_on_top()
        .with_mouse_passthrough(true)
        .with_taskbar(false);

    let native_options = eframe::NativeOptions {
        viewport,
        renderer: eframe::Renderer::Glow,
        ..Default::default()
    };

    eframe::run_native(
        "LVC HUD",
        native_options,
        Box::new(move |_cc| Ok(Box::new(HudApp::new(&config, rx)))),
    )
    .map_err(|err| anyhow::anyhow!("failed starting hud window: {err}"))?;

    Ok(())
}
