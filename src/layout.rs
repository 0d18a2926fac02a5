use crate::config::{PopupPlacement, PopupStyle};

pub const BUTTON_MAX_WIDTH: f64 = 200.0;
pub const BUTTON_MAX_HEIGHT: f64 = 50.0;
pub const BUTTON_WIDTH_FRACTION: f64 = 0.25;
pub const BUTTON_HEIGHT_FRACTION: f64 = 0.08;
pub const BUTTON_RADIUS: f64 = 20.0;
pub const BUTTON_SPACING: f64 = 100.0;
pub const BUTTON_BORDER_WIDTH: f64 = 4.0;

/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.3;

pub const POPUP_RADIUS: f64 = 15.0;
pub const POPUP_FONT_PX: f64 = 18.0;
pub const POPUP_MIN_FONT_PX: f64 = 8.0;
// Horizontal room left around the wrapped text, both sides together.
const POPUP_TEXT_MARGIN_X: f64 = 50.0;
const POPUP_TEXT_MARGIN_Y: f64 = 10.0;
const POPUP_BESIDE_MIN_WIDTH: f64 = 1280.0;
const POPUP_BESIDE_GAP: f64 = 32.0;

pub const POPUP_CLOSE_FONT_PX: f64 = 18.0;
pub const POPUP_CLOSE_PAD_X: f64 = 5.0;
pub const POPUP_CLOSE_PAD_Y: f64 = 2.0;
const POPUP_CLOSE_FROM_RIGHT: f64 = 30.0;
const POPUP_CLOSE_FROM_TOP: f64 = 10.0;
const POPUP_CLOSE_WIDTH: f64 = 22.0;
const POPUP_CLOSE_HEIGHT: f64 = 26.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width * 0.5, self.height * 0.5)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn from_center(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            x: cx - width * 0.5,
            y: cy - height * 0.5,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    #[inline]
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }
}

/// Size of every menu button for the given viewport. Scales with the viewport
/// and never exceeds `BUTTON_MAX_WIDTH` x `BUTTON_MAX_HEIGHT`.
pub fn button_size(viewport: Viewport) -> (f64, f64) {
    (
        (viewport.width * BUTTON_WIDTH_FRACTION).min(BUTTON_MAX_WIDTH),
        (viewport.height * BUTTON_HEIGHT_FRACTION).min(BUTTON_MAX_HEIGHT),
    )
}

/// Centers of the Play, Instruction and Hints buttons, top to bottom.
pub fn button_centers(viewport: Viewport) -> [(f64, f64); 3] {
    let (cx, cy) = viewport.center();
    [
        (cx, cy - BUTTON_SPACING),
        (cx, cy),
        (cx, cy + BUTTON_SPACING),
    ]
}

/// Labels are half the button height, so they shrink and grow with it.
pub fn button_label_px(button_height: f64) -> f64 {
    (button_height * 0.5).max(1.0)
}

pub fn popup_rect(viewport: Viewport, style: PopupStyle, placement: PopupPlacement) -> Rect {
    let (width_fraction, max_width, height_fraction, max_height) = match style {
        PopupStyle::Dark => (0.5, 400.0, 0.3, 200.0),
        PopupStyle::Light => (0.4, 380.0, 0.25, 200.0),
    };
    let width = (viewport.width * width_fraction).min(max_width);
    let height = (viewport.height * height_fraction).min(max_height);
    let (cx, cy) = viewport.center();

    match placement {
        PopupPlacement::BesideButtons if viewport.width >= POPUP_BESIDE_MIN_WIDTH => Rect {
            x: cx + BUTTON_MAX_WIDTH * 0.5 + POPUP_BESIDE_GAP,
            y: cy - height * 0.5,
            width,
            height,
        },
        PopupPlacement::Center | PopupPlacement::BesideButtons => {
            Rect::from_center(cx, cy, width, height)
        }
    }
}

/// Hit area of the close control, hung from the popup's top-right corner.
pub fn popup_close_rect(popup: Rect) -> Rect {
    Rect {
        x: popup.x + popup.width - POPUP_CLOSE_FROM_RIGHT,
        y: popup.y + POPUP_CLOSE_FROM_TOP,
        width: POPUP_CLOSE_WIDTH,
        height: POPUP_CLOSE_HEIGHT,
    }
}

/// Area the instruction text may occupy, centered in the popup.
pub fn popup_text_bounds(popup: Rect) -> (f64, f64) {
    (
        (popup.width - POPUP_TEXT_MARGIN_X).max(1.0),
        (popup.height - POPUP_TEXT_MARGIN_Y * 2.0).max(1.0),
    )
}

/// Greedy word wrap. A single word wider than `max_width` gets a line of its own.
pub fn wrap_words(text: &str, max_width: f64, measure: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            if line.is_empty() {
                line.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", line, word);
            if measure(&candidate) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line.push_str(word);
            }
        }
        lines.push(line);
    }

    lines
}

/// Wraps `text` to `max_width`, stepping the font down a pixel at a time until
/// the block also fits `max_height`. Gives up at `min_px` and returns that wrap.
pub fn fit_text(
    text: &str,
    max_width: f64,
    max_height: f64,
    start_px: f64,
    min_px: f64,
    measure: impl Fn(&str, f64) -> f64,
) -> (Vec<String>, f64) {
    let mut px = start_px.max(min_px);
    loop {
        let lines = wrap_words(text, max_width, |s| measure(s, px));
        let fits = lines.len() as f64 * px * LINE_HEIGHT <= max_height
            && lines.iter().all(|line| measure(line, px) <= max_width);
        if fits || px - 1.0 < min_px {
            return (lines, px);
        }
        px -= 1.0;
    }
}
