use serde::{Deserialize, Serialize};

pub const DEFAULT_HUD_SCALE: f32 = 0.55;

/// One of the five host-controlled indicators in the siren box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKey {
    Switch,
    Siren,
    Horn,
    Tkd,
    Lock,
}

impl IconKey {
    pub const ALL: [IconKey; 5] = [
        IconKey::Switch,
        IconKey::Siren,
        IconKey::Horn,
        IconKey::Tkd,
        IconKey::Lock,
    ];

    pub fn name(self) -> &'static str {
        match self {
            IconKey::Switch => "switch",
            IconKey::Siren => "siren",
            IconKey::Horn => "horn",
            IconKey::Tkd => "tkd",
            IconKey::Lock => "lock",
        }
    }

    pub fn from_item(item: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == item)
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IconState {
    On,
    #[default]
    Off,
}

impl IconState {
    pub fn from_flag(on: bool) -> Self {
        if on {
            IconState::On
        } else {
            IconState::Off
        }
    }
}

/// Texture file name for an icon, e.g. `lux_siren_on_hud.png`.
///
/// The switch artwork is numbered instead: position 3 when on, 1 when off.
pub fn icon_asset_name(key: IconKey, state: IconState) -> String {
    let variant = match (key, state) {
        (IconKey::Switch, IconState::On) => "3",
        (IconKey::Switch, IconState::Off) => "1",
        (_, IconState::On) => "on",
        (_, IconState::Off) => "off",
    };
    format!("lux_{}_{variant}_hud.png", key.name())
}

/// Overlay offset as CSS-style length strings (`"120px"`, `"40%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CssPosition {
    pub left: String,
    pub top: String,
}

impl Default for CssPosition {
    fn default() -> Self {
        Self {
            left: "0px".to_owned(),
            top: "0px".to_owned(),
        }
    }
}

impl CssPosition {
    pub fn from_px(left: f32, top: f32) -> Self {
        Self {
            left: format!("{left}px"),
            top: format!("{top}px"),
        }
    }

    /// Absolute pixel offset inside a viewport of `[width, height]`.
    pub fn resolve(&self, viewport: [f32; 2]) -> [f32; 2] {
        [
            resolve_css_length(&self.left, viewport[0]),
            resolve_css_length(&self.top, viewport[1]),
        ]
    }
}

fn resolve_css_length(value: &str, extent: f32) -> f32 {
    let value = value.trim();
    let parsed = if let Some(percent) = value.strip_suffix('%') {
        percent.trim().parse::<f32>().ok().map(|p| p * extent / 100.0)
    } else {
        value
            .strip_suffix("px")
            .unwrap_or(value)
            .trim()
            .parse::<f32>()
            .ok()
    };
    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Mutable view state owned by the HUD controller.
#[derive(Debug, Clone)]
pub struct HudState {
    pub visible: bool,
    pub scale: f32,
    pub position: CssPosition,
    pub resource_name: String,
    icons: [IconState; 5],
}

impl HudState {
    pub fn new(position: CssPosition, scale: f32, visible: bool) -> Self {
        Self {
            visible,
            scale,
            position,
            resource_name: String::new(),
            icons: [IconState::Off; 5],
        }
    }

    pub fn icon(&self, key: IconKey) -> IconState {
        self.icons[key.index()]
    }

    pub fn set_icon(&mut self, key: IconKey, state: IconState) {
        self.icons[key.index()] = state;
    }

    pub fn icon_asset(&self, key: IconKey) -> String {
        icon_asset_name(key, self.icon(key))
    }
}

impl Default for HudState {
    fn default() -> Self {
        Self::new(CssPosition::default(), DEFAULT_HUD_SCALE, false)
    }
}

#[cfg(test)]
mod tests {
    use super::{icon_asset_name, CssPosition, HudState, IconKey, IconState};

    #[test]
    fn asset_names_follow_lux_convention() {
        assert_eq!(
            icon_asset_name(IconKey::Siren, IconState::On),
            "lux_siren_on_hud.png"
        );
        assert_eq!(
            icon_asset_name(IconKey::Lock, IconState::Off),
            "lux_lock_off_hud.png"
        );
        assert_eq!(
            icon_asset_name(IconKey::Switch, IconState::On),
            "lux_switch_3_hud.png"
        );
        assert_eq!(
            icon_asset_name(IconKey::Switch, IconState::Off),
            "lux_switch_1_hud.png"
        );
    }

    #[test]
    fn item_names_map_to_icon_keys() {
        assert_eq!(IconKey::from_item("tkd"), Some(IconKey::Tkd));
        assert_eq!(IconKey::from_item("horn"), Some(IconKey::Horn));
        assert_eq!(IconKey::from_item("hud"), None);
        assert_eq!(IconKey::from_item("Siren"), None);
    }

    #[test]
    fn resolves_px_percent_and_bare_lengths() {
        let pos = CssPosition {
            left: "25%".to_owned(),
            top: " 120px ".to_owned(),
        };
        assert_eq!(pos.resolve([1920.0, 1080.0]), [480.0, 120.0]);

        let bare = CssPosition {
            left: "42".to_owned(),
            top: "auto".to_owned(),
        };
        assert_eq!(bare.resolve([800.0, 600.0]), [42.0, 0.0]);
    }

    #[test]
    fn from_px_writes_whole_numbers_without_fraction() {
        let pos = CssPosition::from_px(-5.0, 12.5);
        assert_eq!(pos.left, "-5px");
        assert_eq!(pos.top, "12.5px");
    }

    #[test]
    fn default_state_is_hidden_with_icons_off() {
        let state = HudState::default();
        assert!(!state.visible);
        assert_eq!(state.scale, 0.55);
        assert!(state.resource_name.is_empty());
        for key in IconKey::ALL {
            assert_eq!(state.icon(key), IconState::Off);
        }
    }
}
