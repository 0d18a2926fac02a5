use log::{debug, info, warn};

use crate::audio::{AMBIENT_KEY, AMBIENT_VOLUME, AudioController};
use crate::config::{MenuConfig, PopupStyle};
use crate::layout::{
    BUTTON_BORDER_WIDTH, BUTTON_RADIUS, POPUP_CLOSE_FONT_PX, POPUP_CLOSE_PAD_X, POPUP_CLOSE_PAD_Y,
    POPUP_FONT_PX, POPUP_MIN_FONT_PX, POPUP_RADIUS, Rect, button_centers, button_label_px,
    button_size, fit_text, popup_close_rect, popup_rect, popup_text_bounds,
};
use crate::stage::{
    Color, Element, ElementId, Fill, SceneKey, SoundConfig, Stage, Stroke, TextBacking, TextStyle,
};

pub const BACKGROUND_KEY: &str = "background1";
pub const BACKGROUND_PATH: &str = "bg2.jpg";
pub const AMBIENT_PATH: &str = "bird.mp3";
pub const BLUR_PIPELINE: &str = "blur";

const BUTTON_FILL: Color = Color(0x008080);
const BUTTON_HOVER_FILL: Color = Color(0x00cccc);
const BUTTON_BORDER: Color = Color::BLACK;
const CLOSE_LABEL: &str = "X";
const CLOSE_COLOR: Color = Color(0xff0000);

pub const INSTRUCTIONS: &str = "Instructions: Match the cards based on their type.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneState {
    Created,
    Active,
    ShuttingDown,
    Destroyed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    Play,
    ShowInstructions,
    ShowHints,
    ClosePopup,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    Image,
    Audio,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetRequest {
    pub key: &'static str,
    pub url: String,
    pub kind: AssetKind,
}

const BUTTONS: [(&str, MenuAction); 3] = [
    ("Play Game", MenuAction::Play),
    ("Instruction", MenuAction::ShowInstructions),
    ("Hints", MenuAction::ShowHints),
];

struct Button {
    action: MenuAction,
    rect: Rect,
    body: ElementId,
}

struct Popup {
    rect: Rect,
    close_rect: Rect,
    backdrop: ElementId,
    text: ElementId,
    close: ElementId,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum HoverTarget {
    Button(usize),
    Close,
}

fn button_body(rect: Rect, fill: Color) -> Element {
    Element::RoundedRect {
        rect,
        radius: BUTTON_RADIUS,
        fill: Fill::solid(fill),
        stroke: Some(Stroke {
            color: BUTTON_BORDER,
            width: BUTTON_BORDER_WIDTH,
        }),
    }
}

fn popup_colors(style: PopupStyle) -> (Fill, Color) {
    match style {
        PopupStyle::Dark => (
            Fill {
                color: Color::BLACK,
                alpha: 0.7,
            },
            Color::WHITE,
        ),
        PopupStyle::Light => (
            Fill {
                color: Color::WHITE,
                alpha: 0.92,
            },
            Color(0x1a1a1a),
        ),
    }
}

/// The menu/start screen: blurred background, three buttons, an instructions
/// popup and looping ambient audio.
pub struct StartScene<S: Stage> {
    stage: S,
    config: MenuConfig,
    state: SceneState,
    background: Option<ElementId>,
    buttons: Vec<Button>,
    popup: Option<Popup>,
    hover: Option<HoverTarget>,
    audio: AudioController<S::Sound>,
    resize: Option<S::ResizeSubscription>,
}

impl<S: Stage> StartScene<S> {
    pub fn new(stage: S, config: MenuConfig) -> Self {
        Self {
            stage,
            config,
            state: SceneState::Created,
            background: None,
            buttons: Vec::new(),
            popup: None,
            hover: None,
            audio: AudioController::default(),
            resize: None,
        }
    }

    pub fn state(&self) -> SceneState {
        self.state
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn background(&self) -> Option<ElementId> {
        self.background
    }

    pub fn is_popup_open(&self) -> bool {
        self.popup.is_some()
    }

    pub fn button_rects(&self) -> Vec<Rect> {
        self.buttons.iter().map(|b| b.rect).collect()
    }

    pub fn popup_close_rect(&self) -> Option<Rect> {
        self.popup.as_ref().map(|p| p.close_rect)
    }

    /// Assets the host must load before `create`.
    pub fn preload(&self) -> Vec<AssetRequest> {
        vec![
            AssetRequest {
                key: BACKGROUND_KEY,
                url: self.config.asset_url(BACKGROUND_PATH),
                kind: AssetKind::Image,
            },
            AssetRequest {
                key: AMBIENT_KEY,
                url: self.config.asset_url(AMBIENT_PATH),
                kind: AssetKind::Audio,
            },
        ]
    }

    pub fn create(&mut self) {
        if self.state != SceneState::Created {
            warn!("create ignored in state {:?}", self.state);
            return;
        }

        self.layout();

        if self.config.muted {
            info!("audio muted by config");
        } else {
            let sound = self.stage.add_sound(
                AMBIENT_KEY,
                SoundConfig {
                    volume: AMBIENT_VOLUME,
                    looped: true,
                },
            );
            self.audio.start(sound);
        }

        self.resize = Some(self.stage.subscribe_resize());
        self.state = SceneState::Active;
        info!("start scene active");
    }

    /// Rebuilds every element for the current viewport.
    pub fn layout(&mut self) {
        let viewport = self.stage.viewport();
        let reopen_popup = self.popup.take().is_some();

        self.stage.clear();
        self.buttons.clear();
        self.background = None;
        if self.hover.take().is_some() {
            self.stage.set_pointer_cursor(false);
        }

        let background = self.stage.add(Element::Image {
            key: BACKGROUND_KEY.to_string(),
            rect: Rect {
                x: 0.0,
                y: 0.0,
                width: viewport.width,
                height: viewport.height,
            },
        });
        if let Err(err) = self.stage.apply_pipeline(background, BLUR_PIPELINE) {
            warn!("background drawn without blur: {}", err);
        }
        self.background = Some(background);

        for ((label, action), (x, y)) in BUTTONS.into_iter().zip(button_centers(viewport)) {
            self.add_button(x, y, label, action);
        }

        if reopen_popup {
            self.open_popup();
        }

        debug!(
            "layout {}x{} ({} elements)",
            viewport.width,
            viewport.height,
            self.stage.element_count()
        );
    }

    fn add_button(&mut self, x: f64, y: f64, label: &str, action: MenuAction) {
        let (width, height) = button_size(self.stage.viewport());
        let rect = Rect::from_center(x, y, width, height);
        let body = self.stage.add(button_body(rect, BUTTON_FILL));
        self.stage.add(Element::Text {
            lines: vec![label.to_string()],
            x,
            y,
            style: TextStyle::new(button_label_px(height), Color::WHITE),
        });
        self.buttons.push(Button { action, rect, body });
    }

    pub fn handle_resize(&mut self) {
        if self.state != SceneState::Active {
            return;
        }
        self.layout();
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        if self.state != SceneState::Active {
            return;
        }

        let target = match &self.popup {
            Some(popup) if popup.close_rect.contains(x, y) => Some(HoverTarget::Close),
            Some(popup) if popup.rect.contains(x, y) => None,
            _ => self
                .buttons
                .iter()
                .position(|b| b.rect.contains(x, y))
                .map(HoverTarget::Button),
        };
        if target == self.hover {
            return;
        }

        if let Some(HoverTarget::Button(idx)) = self.hover {
            self.repaint_button(idx, BUTTON_FILL);
        }
        if let Some(HoverTarget::Button(idx)) = target {
            self.repaint_button(idx, BUTTON_HOVER_FILL);
        }
        self.stage.set_pointer_cursor(target.is_some());
        self.hover = target;
    }

    pub fn pointer_leave(&mut self) {
        if self.state != SceneState::Active || self.hover.is_none() {
            return;
        }
        if let Some(HoverTarget::Button(idx)) = self.hover.take() {
            self.repaint_button(idx, BUTTON_FILL);
        }
        self.stage.set_pointer_cursor(false);
    }

    fn repaint_button(&mut self, idx: usize, fill: Color) {
        let Some(button) = self.buttons.get(idx) else {
            return;
        };
        if let Err(err) = self.stage.replace(button.body, button_body(button.rect, fill)) {
            warn!("button repaint failed: {}", err);
        }
    }

    /// Returns the scene the menu handed over to, if the press caused a transition.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<SceneKey> {
        if self.state != SceneState::Active {
            return None;
        }
        self.audio.on_user_gesture();

        let popup_hit = self
            .popup
            .as_ref()
            .map(|p| (p.close_rect.contains(x, y), p.rect.contains(x, y)));
        match popup_hit {
            Some((true, _)) => return self.dispatch(MenuAction::ClosePopup),
            // Presses on the backdrop never reach the buttons beneath it.
            Some((false, true)) => return None,
            _ => {}
        }

        let action = self.buttons.iter().find(|b| b.rect.contains(x, y))?.action;
        self.dispatch(action)
    }

    pub fn dispatch(&mut self, action: MenuAction) -> Option<SceneKey> {
        if self.state != SceneState::Active {
            return None;
        }
        debug!("menu action {:?}", action);

        match action {
            MenuAction::Play => Some(self.transition(SceneKey::Level1)),
            MenuAction::ShowHints => Some(self.transition(SceneKey::HintsPage)),
            MenuAction::ShowInstructions => {
                self.open_popup();
                None
            }
            MenuAction::ClosePopup => {
                self.close_popup();
                None
            }
        }
    }

    fn transition(&mut self, key: SceneKey) -> SceneKey {
        info!("leaving start scene for {}", key.as_str());
        self.shutdown();
        self.stage.start_scene(key);
        key
    }

    pub fn open_popup(&mut self) {
        self.close_popup();

        let viewport = self.stage.viewport();
        let rect = popup_rect(viewport, self.config.popup_style, self.config.popup_placement);
        let close_rect = popup_close_rect(rect);
        let (fill, text_color) = popup_colors(self.config.popup_style);

        let backdrop = self.stage.add(Element::RoundedRect {
            rect,
            radius: POPUP_RADIUS,
            fill,
            stroke: None,
        });

        let (max_width, max_height) = popup_text_bounds(rect);
        let (lines, font_px) = fit_text(
            INSTRUCTIONS,
            max_width,
            max_height,
            POPUP_FONT_PX,
            POPUP_MIN_FONT_PX,
            |s, px| self.stage.measure_text(s, px),
        );
        let (cx, cy) = rect.center();
        let text = self.stage.add(Element::Text {
            lines,
            x: cx,
            y: cy,
            style: TextStyle::new(font_px, text_color),
        });

        let (cx, cy) = close_rect.center();
        let close = self.stage.add(Element::Text {
            lines: vec![CLOSE_LABEL.to_string()],
            x: cx,
            y: cy,
            style: TextStyle::new(POPUP_CLOSE_FONT_PX, CLOSE_COLOR)
                .bold()
                .with_backing(TextBacking {
                    fill: Fill::solid(Color::WHITE),
                    pad_x: POPUP_CLOSE_PAD_X,
                    pad_y: POPUP_CLOSE_PAD_Y,
                }),
        });

        self.popup = Some(Popup {
            rect,
            close_rect,
            backdrop,
            text,
            close,
        });
        debug!("popup opened");
    }

    pub fn close_popup(&mut self) {
        let Some(popup) = self.popup.take() else {
            return;
        };
        self.stage.destroy(popup.backdrop);
        self.stage.destroy(popup.text);
        self.stage.destroy(popup.close);

        if self.hover == Some(HoverTarget::Close) {
            self.hover = None;
            self.stage.set_pointer_cursor(false);
        }
        debug!("popup closed");
    }

    /// Stops audio, detaches the resize subscription and removes every element.
    pub fn shutdown(&mut self) {
        match self.state {
            SceneState::Created | SceneState::Active => {}
            SceneState::ShuttingDown | SceneState::Destroyed => return,
        }
        self.state = SceneState::ShuttingDown;

        self.audio.stop();
        self.resize = None;
        self.popup = None;
        self.buttons.clear();
        self.background = None;
        self.stage.clear();
        if self.hover.take().is_some() {
            self.stage.set_pointer_cursor(false);
        }
        info!("start scene shut down");
    }

    pub fn destroy(&mut self) {
        if self.state == SceneState::Destroyed {
            return;
        }
        self.shutdown();
        self.state = SceneState::Destroyed;
        info!("start scene destroyed");
    }
}

impl<S: Stage> Drop for StartScene<S> {
    fn drop(&mut self) {
        self.destroy();
    }
}
