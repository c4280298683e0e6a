use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::state::{CssPosition, HudState, DEFAULT_HUD_SCALE};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HudConfig {
    /// Address of the inbound message endpoint.
    pub bind: String,
    /// Prefix for outbound callbacks. `None` posts to `http://<resource>/<event>`.
    pub outbound_base: Option<String>,
    pub post_timeout_ms: u64,
    pub textures_dir: PathBuf,
    pub sounds_dir: PathBuf,
    /// Starting offset; `hud:resetPosition` always returns here.
    pub initial_position: CssPosition,
    pub default_scale: f32,
    pub start_visible: bool,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:38472".to_owned(),
            outbound_base: None,
            post_timeout_ms: 2_000,
            textures_dir: PathBuf::from("../textures/"),
            sounds_dir: PathBuf::from("../sounds/"),
            initial_position: CssPosition::default(),
            default_scale: DEFAULT_HUD_SCALE,
            start_visible: false,
        }
    }
}

impl HudConfig {
    pub fn load_or_create() -> Result<(Self, PathBuf)> {
        let config_dir = dirs::config_dir()
            .context("unable to locate OS config directory")?
            .join("lvc-hud");
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("failed creating config dir at {}", config_dir.display()))?;

        let config_path = config_dir.join("config.json");
        if !config_path.exists() {
            let default = Self::default();
            default.save(&config_path)?;
            return Ok((default, config_path));
        }

        let text = fs::read_to_string(&config_path)
            .with_context(|| format!("failed reading {}", config_path.display()))?;
        let config = serde_json::from_str::<Self>(&text)
            .with_context(|| format!("invalid json in {}", config_path.display()))?;
        Ok((config, config_path))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let payload = serde_json::to_string_pretty(self).context("failed serializing config")?;
        fs::write(path, payload).with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }

    pub fn post_timeout(&self) -> Duration {
        Duration::from_millis(self.post_timeout_ms.clamp(100, 30_000))
    }

    pub fn initial_state(&self) -> HudState {
        let scale = if self.default_scale.is_finite() && self.default_scale > 0.0 {
            self.default_scale
        } else {
            DEFAULT_HUD_SCALE
        };
        HudState::new(self.initial_position.clone(), scale, self.start_visible)
    }
}
