//! Start screen for the card-matching game: a blurred background, Play /
//! Instruction / Hints buttons, an instructions popup and looping ambient audio,
//! drawn into a full-window canvas.

use log::{error, info};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlCanvasElement, Window};

pub mod assets;
pub mod audio;
pub mod canvas_stage;
pub mod config;
pub mod director;
pub mod error;
pub mod layout;
pub mod scene;
pub mod stage;
#[cfg(test)]
mod testing;

pub use config::{MenuConfig, PopupPlacement, PopupStyle};
pub use director::Director;
pub use error::{MenuError, Result};
pub use scene::{MenuAction, SceneState, StartScene};
pub use stage::{SceneKey, Stage};

const CANVAS_ID: &str = "menu-canvas";
const FALLBACK_ID: &str = "fallback";

fn window() -> Window {
    web_sys::window().expect("missing window")
}

pub(crate) fn set_status(document: &Document, status: &str) {
    if let Some(el) = document.document_element() {
        let _ = el.set_attribute("data-render-status", status);
    }
}

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    if let Err(err) = start_impl() {
        let message = format!("fatal: {}", err);

        if let Some(win) = web_sys::window() {
            if let Some(doc) = win.document() {
                set_status(&doc, "error");
                if let Some(fallback) = doc.get_element_by_id(FALLBACK_ID) {
                    fallback.set_text_content(Some(&message));
                    let _ = fallback.remove_attribute("hidden");
                }
            }
        }

        error!("{}", message);
    }
}

fn start_impl() -> Result<()> {
    let win = window();
    let search = win.location().search().unwrap_or_default();
    let config = MenuConfig::from_query(&search);
    // A second init (e.g. hot reload) keeps the first logger.
    let _ = console_log::init_with_level(config.log_level);
    info!("menu starting ({:?} popup, {:?})", config.popup_style, config.popup_placement);

    let document = win
        .document()
        .ok_or(MenuError::MissingElement("document"))?;
    let canvas = document
        .get_element_by_id(CANVAS_ID)
        .ok_or(MenuError::MissingElement(CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| MenuError::MissingElement(CANVAS_ID))?;

    let hash = win.location().hash().unwrap_or_default();
    let director = Director::new(config, document, canvas)?;
    Director::install_listeners(&director);

    // Opening on a game hash reports `left_menu` and waits for navigation back.
    Director::hash_changed(&director, &hash);

    Ok(())
}
