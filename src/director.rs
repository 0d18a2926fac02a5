use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::EventListener;
use log::{debug, info};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Event, HtmlCanvasElement, PageTransitionEvent, PointerEvent};

use crate::assets::{self, AssetCache};
use crate::canvas_stage::{CanvasStage, Surface, redraw_scheduler};
use crate::config::MenuConfig;
use crate::error::Result;
use crate::scene::{SceneState, StartScene};
use crate::{set_status, window};

const MENU_HASH: &str = "#menu";

pub fn is_menu_hash(hash: &str) -> bool {
    hash.is_empty() || hash == "#" || hash == MENU_HASH
}

/// Owns the page-lifetime pieces (canvas surface, asset cache, input
/// listeners) and at most one live `StartScene`.
pub struct Director {
    config: MenuConfig,
    document: Document,
    surface: Rc<RefCell<Surface>>,
    assets: Rc<RefCell<AssetCache>>,
    schedule_redraw: Rc<dyn Fn()>,
    scene: Option<StartScene<CanvasStage>>,
    generation: u32,
}

impl Director {
    pub fn new(
        config: MenuConfig,
        document: Document,
        canvas: HtmlCanvasElement,
    ) -> Result<Rc<RefCell<Self>>> {
        let assets = Rc::new(RefCell::new(AssetCache::default()));
        let surface = Rc::new(RefCell::new(Surface::new(canvas, Rc::clone(&assets))?));
        let schedule_redraw = redraw_scheduler(Rc::clone(&surface));

        Ok(Rc::new(RefCell::new(Self {
            config,
            document,
            surface,
            assets,
            schedule_redraw,
            scene: None,
            generation: 0,
        })))
    }

    pub fn has_scene(&self) -> bool {
        self.scene.is_some()
    }

    pub fn scene_state(&self) -> Option<SceneState> {
        self.scene.as_ref().map(StartScene::state)
    }

    /// Builds a fresh scene, preloads its assets, then activates it.
    pub fn enter_menu(this: &Rc<RefCell<Self>>) {
        let (requests, assets, generation) = {
            let mut director = this.borrow_mut();
            if director.scene.is_some() {
                return;
            }
            director.generation = director.generation.wrapping_add(1);

            let weak: Weak<RefCell<Self>> = Rc::downgrade(this);
            let on_resize: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(director) = weak.upgrade() {
                    director.borrow_mut().relayout();
                }
            });
            let stage = CanvasStage::new(
                Rc::clone(&director.surface),
                Rc::clone(&director.schedule_redraw),
                on_resize,
                director.config.resize_settle_ms,
            );
            let scene = StartScene::new(stage, director.config.clone());
            let requests = scene.preload();
            director.scene = Some(scene);

            set_status(&director.document, "loading");
            if let Some(root) = director.document.document_element() {
                let _ = root.remove_attribute("data-scene");
            }
            (requests, Rc::clone(&director.assets), director.generation)
        };

        let this = Rc::clone(this);
        spawn_local(async move {
            assets::preload(&assets, &requests).await;

            let mut director = this.borrow_mut();
            if director.generation != generation {
                debug!("stale preload finished; ignoring");
                return;
            }
            let Some(scene) = director.scene.as_mut() else {
                return;
            };
            if scene.state() == SceneState::Created {
                scene.create();
                set_status(&director.document, "ready");
            }
        });
    }

    pub fn leave_menu(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.destroy();
            info!("menu scene released");
        }
    }

    /// Enters the menu for a menu hash and leaves it for anything else.
    pub fn hash_changed(this: &Rc<RefCell<Self>>, hash: &str) {
        debug!("hashchange to {:?}", hash);
        if is_menu_hash(hash) {
            Director::enter_menu(this);
        } else {
            let mut director = this.borrow_mut();
            director.leave_menu();
            set_status(&director.document, "left_menu");
        }
    }

    /// A page restored from the back/forward cache kept its listeners but lost
    /// the scene `pagehide` destroyed, so it is rebuilt here.
    pub fn page_shown(this: &Rc<RefCell<Self>>, persisted: bool, hash: &str) {
        if !persisted || !is_menu_hash(hash) {
            return;
        }
        info!("page restored from cache; rebuilding menu");
        Director::enter_menu(this);
    }

    fn relayout(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.handle_resize();
        }
    }

    fn pointer_move(&mut self, x: f64, y: f64) {
        if let Some(scene) = self.scene.as_mut() {
            scene.pointer_move(x, y);
        }
    }

    fn pointer_leave(&mut self) {
        if let Some(scene) = self.scene.as_mut() {
            scene.pointer_leave();
        }
    }

    /// Forwards a press in canvas coordinates. A press that starts another
    /// scene drops the menu scene.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let Some(scene) = self.scene.as_mut() else {
            return;
        };
        if scene.pointer_down(x, y).is_some() {
            // The scene shut itself down before handing over.
            self.scene = None;
        }
    }

    fn pointer_coords(&self, event: &Event) -> Option<(f64, f64)> {
        let pointer = event.dyn_ref::<PointerEvent>()?;
        let rect = self.surface.borrow().canvas().get_bounding_client_rect();
        Some((
            pointer.client_x() as f64 - rect.left(),
            pointer.client_y() as f64 - rect.top(),
        ))
    }

    /// Wires canvas pointer input, hash navigation and page teardown. These
    /// listeners live as long as the page.
    pub fn install_listeners(this: &Rc<RefCell<Self>>) {
        let canvas = this.borrow().surface.borrow().canvas().clone();
        let win = window();

        let director = Rc::clone(this);
        EventListener::new(canvas.as_ref(), "pointermove", move |event| {
            let mut director = director.borrow_mut();
            if let Some((x, y)) = director.pointer_coords(event) {
                director.pointer_move(x, y);
            }
        })
        .forget();

        let director = Rc::clone(this);
        EventListener::new(canvas.as_ref(), "pointerleave", move |_event| {
            director.borrow_mut().pointer_leave();
        })
        .forget();

        let director = Rc::clone(this);
        EventListener::new(canvas.as_ref(), "pointerdown", move |event| {
            event.prevent_default();
            let mut director = director.borrow_mut();
            if let Some((x, y)) = director.pointer_coords(event) {
                director.pointer_down(x, y);
            }
        })
        .forget();

        let director = Rc::clone(this);
        EventListener::new(win.as_ref(), "hashchange", move |_event| {
            let hash = window().location().hash().unwrap_or_default();
            Director::hash_changed(&director, &hash);
        })
        .forget();

        let director = Rc::clone(this);
        EventListener::new(win.as_ref(), "pagehide", move |_event| {
            director.borrow_mut().leave_menu();
        })
        .forget();

        let director = Rc::clone(this);
        EventListener::new(win.as_ref(), "pageshow", move |event| {
            let persisted = event
                .dyn_ref::<PageTransitionEvent>()
                .is_some_and(PageTransitionEvent::persisted);
            let hash = window().location().hash().unwrap_or_default();
            Director::page_shown(&director, persisted, &hash);
        })
        .forget();
    }
}
