#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use card_match_menu::assets::AssetCache;
use card_match_menu::canvas_stage::{CanvasStage, Surface};
use card_match_menu::layout::Rect;
use card_match_menu::scene::BACKGROUND_KEY;
use card_match_menu::stage::{Color, Element, Fill, Stage, TextBacking, TextStyle};
use card_match_menu::{MenuConfig, MenuError, SceneState, StartScene};
use js_sys::Promise;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Event, HtmlCanvasElement};

wasm_bindgen_test_configure!(run_in_browser);

fn canvas() -> HtmlCanvasElement {
    let window = web_sys::window().expect("no window");
    let document = window.document().expect("no document");
    document
        .create_element("canvas")
        .expect("create canvas")
        .dyn_into::<HtmlCanvasElement>()
        .expect("canvas element")
}

fn stage_with(on_resize: Rc<dyn Fn()>, settle_ms: u32) -> (Rc<RefCell<Surface>>, CanvasStage) {
    let assets = Rc::new(RefCell::new(AssetCache::default()));
    let surface = Rc::new(RefCell::new(
        Surface::new(canvas(), assets).expect("2d surface"),
    ));
    let stage = CanvasStage::new(Rc::clone(&surface), Rc::new(|| {}), on_resize, settle_ms);
    (surface, stage)
}

fn stage() -> (Rc<RefCell<Surface>>, CanvasStage) {
    stage_with(Rc::new(|| {}), 0)
}

fn counting_stage(settle_ms: u32) -> (Rc<Cell<u32>>, CanvasStage) {
    let hits = Rc::new(Cell::new(0));
    let hits_cb = Rc::clone(&hits);
    let (_surface, stage) = stage_with(Rc::new(move || hits_cb.set(hits_cb.get() + 1)), settle_ms);
    (hits, stage)
}

fn fire_resize() {
    let event = Event::new("resize").expect("event");
    web_sys::window()
        .expect("no window")
        .dispatch_event(&event)
        .expect("dispatch");
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

fn panel() -> Element {
    Element::RoundedRect {
        rect: Rect {
            x: 10.0,
            y: 10.0,
            width: 120.0,
            height: 40.0,
        },
        radius: 12.0,
        fill: Fill::solid(Color(0x008080)),
        stroke: None,
    }
}

#[wasm_bindgen_test]
fn blur_pipeline_registered_when_filters_exist() {
    let (surface, mut stage) = stage();
    let id = stage.add(Element::Image {
        key: BACKGROUND_KEY.to_string(),
        rect: Rect {
            x: 0.0,
            y: 0.0,
            width: 64.0,
            height: 64.0,
        },
    });

    assert!(surface.borrow().has_pipeline("blur"));
    assert!(stage.apply_pipeline(id, "blur").is_ok());
    assert!(matches!(
        stage.apply_pipeline(id, "sepia"),
        Err(MenuError::MissingPipeline(_))
    ));
}

#[wasm_bindgen_test]
fn elements_are_added_replaced_and_destroyed() {
    let (surface, mut stage) = stage();
    let a = stage.add(panel());
    let b = stage.add(panel());
    assert_eq!(stage.element_count(), 2);

    assert!(stage.replace(a, panel()).is_ok());
    stage.destroy(a);
    assert!(matches!(
        stage.replace(a, panel()),
        Err(MenuError::UnknownElement(_))
    ));
    assert_eq!(stage.element_count(), 1);

    stage.destroy(b);
    assert!(surface.borrow().is_empty());
}

#[wasm_bindgen_test]
fn paint_draws_placeholder_for_missing_image() {
    let (surface, mut stage) = stage();
    stage.add(Element::Image {
        key: "missing".to_string(),
        rect: Rect {
            x: 0.0,
            y: 0.0,
            width: 32.0,
            height: 32.0,
        },
    });
    stage.add(panel());

    assert!(surface.borrow_mut().paint().is_ok());
    assert!(surface.borrow().canvas().width() >= 1);
}

#[wasm_bindgen_test]
fn text_measurement_grows_with_length() {
    let (_surface, stage) = stage();
    let short = stage.measure_text("Hints", 16.0);
    let long = stage.measure_text("Hints and instructions", 16.0);
    assert!(short > 0.0);
    assert!(long > short);
}

#[wasm_bindgen_test]
fn paint_draws_backed_bold_text() {
    let (surface, mut stage) = stage();
    stage.add(Element::Text {
        lines: vec!["X".to_string()],
        x: 40.0,
        y: 40.0,
        style: TextStyle::new(18.0, Color(0xff0000))
            .bold()
            .with_backing(TextBacking {
                fill: Fill::solid(Color::WHITE),
                pad_x: 5.0,
                pad_y: 2.0,
            }),
    });
    assert!(surface.borrow_mut().paint().is_ok());
}

#[wasm_bindgen_test]
fn resize_subscription_detaches_on_drop() {
    let (hits, mut stage) = counting_stage(0);
    let subscription = stage.subscribe_resize();
    fire_resize();
    assert_eq!(hits.get(), 1);

    drop(subscription);
    fire_resize();
    assert_eq!(hits.get(), 1);
}

#[wasm_bindgen_test]
async fn resize_burst_settles_into_one_relayout() {
    let (hits, mut stage) = counting_stage(30);
    let _subscription = stage.subscribe_resize();
    fire_resize();
    fire_resize();
    fire_resize();
    assert_eq!(hits.get(), 0);

    sleep(150).await;
    assert_eq!(hits.get(), 1);
}

#[wasm_bindgen_test]
async fn dropping_subscription_cancels_pending_relayout() {
    let (hits, mut stage) = counting_stage(30);
    let subscription = stage.subscribe_resize();
    fire_resize();
    drop(subscription);

    sleep(150).await;
    assert_eq!(hits.get(), 0);
}

#[wasm_bindgen_test]
fn start_scene_runs_on_canvas_stage() {
    let (surface, stage) = stage();
    let mut scene = StartScene::new(stage, MenuConfig::default());
    scene.create();
    assert_eq!(scene.state(), SceneState::Active);
    assert_eq!(surface.borrow().len(), 7);

    let instruction = scene.button_rects()[1];
    let (x, y) = instruction.center();
    assert_eq!(scene.pointer_down(x, y), None);
    assert_eq!(surface.borrow().len(), 10);

    let close = scene.popup_close_rect().expect("popup open");
    scene.pointer_down(close.center().0, close.center().1);
    assert_eq!(surface.borrow().len(), 7);

    scene.destroy();
    assert!(surface.borrow().is_empty());
}
