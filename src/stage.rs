//! The host scene graph a menu scene draws into. `CanvasStage` is the browser
//! implementation; tests use an in-memory recorder.

use crate::audio::AmbientSound;
use crate::error::Result;
use crate::layout::{LINE_HEIGHT, Rect, Viewport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub(crate) u32);

/// 24-bit `0xRRGGBB`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    pub const BLACK: Color = Color(0x000000);

    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xff) as u8,
            ((self.0 >> 8) & 0xff) as u8,
            (self.0 & 0xff) as u8,
        )
    }

    pub fn css(self, alpha: f64) -> String {
        let (r, g, b) = self.rgb();
        format!("rgba({}, {}, {}, {})", r, g, b, alpha.clamp(0.0, 1.0))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fill {
    pub color: Color,
    pub alpha: f64,
}

impl Fill {
    pub fn solid(color: Color) -> Self {
        Self { color, alpha: 1.0 }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
    pub color: Color,
    pub width: f64,
}

/// A filled box painted behind a text block, `pad_x`/`pad_y` beyond its bounds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextBacking {
    pub fill: Fill,
    pub pad_x: f64,
    pub pad_y: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font_px: f64,
    pub color: Color,
    pub line_height: f64,
    pub bold: bool,
    pub backing: Option<TextBacking>,
}

impl TextStyle {
    pub fn new(font_px: f64, color: Color) -> Self {
        Self {
            font_px,
            color,
            line_height: font_px * LINE_HEIGHT,
            bold: false,
            backing: None,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn with_backing(mut self, backing: TextBacking) -> Self {
        self.backing = Some(backing);
        self
    }

    pub fn block_height(&self, lines: usize) -> f64 {
        self.line_height * lines as f64
    }

    pub fn css_font(&self) -> String {
        let weight = if self.bold { "bold " } else { "" };
        format!("{}{}px sans-serif", weight, self.font_px.round().max(1.0))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    /// A preloaded image, stretched over `rect`.
    Image { key: String, rect: Rect },
    RoundedRect {
        rect: Rect,
        radius: f64,
        fill: Fill,
        stroke: Option<Stroke>,
    },
    /// Centered lines; `(x, y)` is the middle of the block.
    Text {
        lines: Vec<String>,
        x: f64,
        y: f64,
        style: TextStyle,
    },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundConfig {
    pub volume: f64,
    pub looped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneKey {
    Level1,
    HintsPage,
}

impl SceneKey {
    pub fn as_str(self) -> &'static str {
        match self {
            SceneKey::Level1 => "lvl1",
            SceneKey::HintsPage => "HintsPage",
        }
    }
}

pub trait Stage {
    type Sound: AmbientSound;
    /// Keeps the resize notification alive; dropping it detaches the listener.
    type ResizeSubscription;

    fn viewport(&self) -> Viewport;

    fn add(&mut self, element: Element) -> ElementId;
    /// Redraws an existing element in place, keeping its id and z-order.
    fn replace(&mut self, id: ElementId, element: Element) -> Result<()>;
    fn destroy(&mut self, id: ElementId);
    fn clear(&mut self);
    fn element_count(&self) -> usize;

    /// Attaches a named post-processing pipeline to an element.
    fn apply_pipeline(&mut self, id: ElementId, name: &str) -> Result<()>;

    fn measure_text(&self, text: &str, font_px: f64) -> f64;
    fn set_pointer_cursor(&mut self, hovering: bool);

    /// `None` when the sound was never loaded.
    fn add_sound(&mut self, key: &str, config: SoundConfig) -> Option<Self::Sound>;
    fn subscribe_resize(&mut self) -> Self::ResizeSubscription;

    fn start_scene(&mut self, key: SceneKey);
}
