//! Runtime knobs read from the page's query string, e.g.
//! `index.html?popup=light&placement=beside&mute=1`.

use log::Level;

pub const DEFAULT_RESIZE_SETTLE_MS: u32 = 140;
/// Longer settle times are clamped; browser timers overflow past `i32::MAX`.
pub const MAX_RESIZE_SETTLE_MS: u32 = 10_000;
pub const DEFAULT_ASSET_BASE: &str = "assets";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopupStyle {
    #[default]
    Dark,
    Light,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopupPlacement {
    #[default]
    Center,
    /// Centered, but moved beside the button column on very wide viewports.
    BesideButtons,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MenuConfig {
    pub popup_style: PopupStyle,
    pub popup_placement: PopupPlacement,
    pub muted: bool,
    pub resize_settle_ms: u32,
    pub asset_base: String,
    pub log_level: Level,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            popup_style: PopupStyle::default(),
            popup_placement: PopupPlacement::default(),
            muted: false,
            resize_settle_ms: DEFAULT_RESIZE_SETTLE_MS,
            asset_base: DEFAULT_ASSET_BASE.to_string(),
            log_level: Level::Info,
        }
    }
}

impl MenuConfig {
    /// Parses `location.search`. Unknown keys and malformed values keep the default.
    pub fn from_query(search: &str) -> Self {
        let mut config = Self::default();
        let query = search.strip_prefix('?').unwrap_or(search);

        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "popup" => match value {
                    "dark" => config.popup_style = PopupStyle::Dark,
                    "light" => config.popup_style = PopupStyle::Light,
                    _ => {}
                },
                "placement" => match value {
                    "center" => config.popup_placement = PopupPlacement::Center,
                    "beside" => config.popup_placement = PopupPlacement::BesideButtons,
                    _ => {}
                },
                "mute" => config.muted = value == "1",
                "resize_settle" => {
                    if let Ok(ms) = value.parse::<u64>() {
                        config.resize_settle_ms =
                            ms.min(u64::from(MAX_RESIZE_SETTLE_MS)) as u32;
                    }
                }
                "assets" => {
                    let base = value.trim_end_matches('/');
                    if !base.is_empty() {
                        config.asset_base = base.to_string();
                    }
                }
                "log" => {
                    if let Ok(level) = value.parse::<Level>() {
                        config.log_level = level;
                    }
                }
                _ => {}
            }
        }

        config
    }

    pub fn asset_url(&self, relative: &str) -> String {
        format!("{}/{}", self.asset_base, relative)
    }
}
