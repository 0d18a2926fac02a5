#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;

use card_match_menu::canvas_stage::viewport_from_window;
use card_match_menu::layout::button_centers;
use card_match_menu::{Director, MenuConfig, SceneState};
use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .expect("no window")
        .document()
        .expect("no document")
}

fn director() -> Rc<RefCell<Director>> {
    let document = document();
    let canvas = document
        .create_element("canvas")
        .expect("create canvas")
        .dyn_into::<HtmlCanvasElement>()
        .expect("canvas element");
    let config = MenuConfig {
        muted: true,
        ..MenuConfig::default()
    };
    Director::new(config, document, canvas).expect("director")
}

fn root_attribute(name: &str) -> Option<String> {
    document().document_element()?.get_attribute(name)
}

async fn sleep(ms: i32) {
    let promise = Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .expect("no window")
            .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms)
            .expect("set timeout");
    });
    JsFuture::from(promise).await.expect("sleep");
}

// Preload gives up on audio after 2.5 s, so allow a little longer.
async fn wait_until_active(director: &Rc<RefCell<Director>>) -> bool {
    for _ in 0..200 {
        if director.borrow().scene_state() == Some(SceneState::Active) {
            return true;
        }
        sleep(20).await;
    }
    false
}

#[wasm_bindgen_test]
async fn hash_navigation_rebuilds_menu() {
    let director = director();
    // Opening straight onto a game scene.
    Director::hash_changed(&director, "#HintsPage");
    assert!(!director.borrow().has_scene());
    assert_eq!(root_attribute("data-render-status").as_deref(), Some("left_menu"));

    Director::hash_changed(&director, "");
    assert!(director.borrow().has_scene());
    assert!(wait_until_active(&director).await);
    assert_eq!(root_attribute("data-render-status").as_deref(), Some("ready"));

    Director::hash_changed(&director, "#lvl1");
    assert!(!director.borrow().has_scene());
    assert_eq!(root_attribute("data-render-status").as_deref(), Some("left_menu"));

    Director::hash_changed(&director, "#menu");
    assert_eq!(director.borrow().scene_state(), Some(SceneState::Created));
    assert!(wait_until_active(&director).await);
}

#[wasm_bindgen_test]
async fn restored_page_rebuilds_menu() {
    let director = director();
    Director::enter_menu(&director);
    assert!(wait_until_active(&director).await);

    // pagehide
    director.borrow_mut().leave_menu();
    assert!(!director.borrow().has_scene());

    Director::page_shown(&director, false, "");
    assert!(!director.borrow().has_scene());
    Director::page_shown(&director, true, "#HintsPage");
    assert!(!director.borrow().has_scene());

    Director::page_shown(&director, true, "");
    assert!(director.borrow().has_scene());
    assert!(wait_until_active(&director).await);
}

#[wasm_bindgen_test]
async fn stale_preload_leaves_newer_scene_alone() {
    let director = director();
    Director::enter_menu(&director);
    director.borrow_mut().leave_menu();
    Director::enter_menu(&director);
    // A second enter while a scene exists is a no-op.
    Director::enter_menu(&director);

    assert!(wait_until_active(&director).await);
    sleep(100).await;
    assert_eq!(director.borrow().scene_state(), Some(SceneState::Active));
    assert_eq!(root_attribute("data-render-status").as_deref(), Some("ready"));
}

#[wasm_bindgen_test]
async fn play_press_hands_over_and_drops_scene() {
    let director = director();
    Director::enter_menu(&director);
    assert!(wait_until_active(&director).await);

    let (x, y) = button_centers(viewport_from_window())[0];
    director.borrow_mut().pointer_down(x, y);

    assert!(!director.borrow().has_scene());
    assert_eq!(root_attribute("data-scene").as_deref(), Some("lvl1"));
    assert_eq!(root_attribute("data-render-status").as_deref(), Some("left_menu"));

    let _ = web_sys::window().expect("no window").location().set_hash("");
}
