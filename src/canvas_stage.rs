//! Browser `Stage`: a retained element list painted into a full-window 2D canvas
//! on the next animation frame.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use js_sys::Reflect;
use log::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{CanvasRenderingContext2d, HtmlAudioElement, HtmlCanvasElement};

use crate::assets::AssetCache;
use crate::audio::AmbientSound;
use crate::config::MAX_RESIZE_SETTLE_MS;
use crate::error::{MenuError, Result, js_value_to_string};
use crate::layout::{Rect, Viewport};
use crate::scene::BLUR_PIPELINE;
use crate::stage::{Color, Element, ElementId, SceneKey, SoundConfig, Stage, TextStyle};
use crate::{set_status, window};

const CLEAR_COLOR: &str = "#0b1418";
const PLACEHOLDER_COLOR: &str = "#17242b";
const BLUR_FILTER: &str = "blur(6px)";
const MAX_DPR: f64 = 2.5;
const MAX_BACKING_SIDE: f64 = 4096.0;

struct Node {
    id: ElementId,
    element: Element,
    pipeline: Option<String>,
}

/// Everything painted on the canvas. One per page; scenes reach it through a
/// `CanvasStage`.
pub struct Surface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    assets: Rc<RefCell<AssetCache>>,
    pipelines: HashMap<String, String>,
    nodes: Vec<Node>,
    next_id: u32,
    css_size: (f64, f64),
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| MenuError::Js("2D canvas unavailable".to_string()))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|_| MenuError::Js("2D context is not a CanvasRenderingContext2d".to_string()))
}

pub fn viewport_from_window() -> Viewport {
    let win = window();
    let width = win
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0);
    let height = win
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1.0);
    Viewport::new(width, height)
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, rect: Rect, radius: f64) -> Result<()> {
    let r = radius.min(rect.width * 0.5).min(rect.height * 0.5).max(0.0);
    let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);

    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.arc_to(x + w, y, x + w, y + h, r)?;
    ctx.arc_to(x + w, y + h, x, y + h, r)?;
    ctx.arc_to(x, y + h, x, y, r)?;
    ctx.arc_to(x, y, x + w, y, r)?;
    ctx.close_path();
    Ok(())
}

fn fill_text_block(
    ctx: &CanvasRenderingContext2d,
    lines: &[String],
    x: f64,
    y: f64,
    style: &TextStyle,
) -> Result<()> {
    ctx.set_font(&style.css_font());
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    let height = style.block_height(lines.len());
    if let Some(backing) = style.backing {
        let mut width: f64 = 0.0;
        for line in lines {
            width = width.max(ctx.measure_text(line)?.width());
        }
        ctx.set_fill_style_str(&backing.fill.color.css(backing.fill.alpha));
        ctx.fill_rect(
            x - width * 0.5 - backing.pad_x,
            y - height * 0.5 - backing.pad_y,
            width + backing.pad_x * 2.0,
            height + backing.pad_y * 2.0,
        );
    }

    ctx.set_fill_style_str(&style.color.css(1.0));
    let first_y = y - style.line_height * (lines.len().saturating_sub(1) as f64) * 0.5;
    for (i, line) in lines.iter().enumerate() {
        ctx.fill_text(line, x, first_y + style.line_height * i as f64)?;
    }
    Ok(())
}

impl Surface {
    pub fn new(canvas: HtmlCanvasElement, assets: Rc<RefCell<AssetCache>>) -> Result<Self> {
        let ctx = context_2d(&canvas)?;

        let mut pipelines = HashMap::new();
        // Safari only gained `ctx.filter` recently; without it the background stays sharp.
        if Reflect::has(ctx.as_ref(), &JsValue::from_str("filter")).unwrap_or(false) {
            pipelines.insert(BLUR_PIPELINE.to_string(), BLUR_FILTER.to_string());
        } else {
            warn!("canvas filters unsupported; `{}` pipeline disabled", BLUR_PIPELINE);
        }

        Ok(Self {
            canvas,
            ctx,
            assets,
            pipelines,
            nodes: Vec::new(),
            next_id: 0,
            css_size: (0.0, 0.0),
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.nodes.push(Node {
            id,
            element,
            pipeline: None,
        });
        id
    }

    fn node_mut(&mut self, id: ElementId) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(MenuError::UnknownElement(id))
    }

    fn remove(&mut self, id: ElementId) {
        self.nodes.retain(|n| n.id != id);
    }

    fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn measure_text(&self, text: &str, font_px: f64) -> f64 {
        let style = TextStyle::new(font_px, Color::WHITE);
        self.ctx.set_font(&style.css_font());
        self.ctx
            .measure_text(text)
            .map(|m| m.width())
            .unwrap_or_else(|_| text.chars().count() as f64 * font_px * 0.5)
    }

    /// Matches the backing store to the window at device resolution, capped so
    /// large high-DPI displays don't allocate huge canvases.
    fn sync_size(&mut self) -> Result<f64> {
        let win = window();
        let viewport = viewport_from_window();
        let dpr = win.device_pixel_ratio().clamp(1.0, MAX_DPR);

        let mut scale = dpr;
        let max_side = viewport.width.max(viewport.height) * dpr;
        if max_side > MAX_BACKING_SIDE {
            scale *= MAX_BACKING_SIDE / max_side;
        }

        let width = (viewport.width * scale).floor().max(1.0) as u32;
        let height = (viewport.height * scale).floor().max(1.0) as u32;
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
        if self.css_size != (viewport.width, viewport.height) {
            let style = self.canvas.style();
            style.set_property("width", &format!("{}px", viewport.width))?;
            style.set_property("height", &format!("{}px", viewport.height))?;
            self.css_size = (viewport.width, viewport.height);
        }

        self.ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0)?;
        Ok(scale)
    }

    pub fn paint(&mut self) -> Result<()> {
        self.sync_size()?;
        let (width, height) = self.css_size;
        let ctx = &self.ctx;
        let assets = self.assets.borrow();

        ctx.set_filter("none");
        ctx.set_fill_style_str(CLEAR_COLOR);
        ctx.fill_rect(0.0, 0.0, width, height);

        for node in &self.nodes {
            ctx.save();
            if let Some(filter) = node.pipeline.as_ref().and_then(|p| self.pipelines.get(p)) {
                ctx.set_filter(filter);
            }

            match &node.element {
                Element::Image { key, rect } => match assets.image(key) {
                    Some(image) => ctx.draw_image_with_html_image_element_and_dw_and_dh(
                        image,
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height,
                    )?,
                    None => {
                        ctx.set_fill_style_str(PLACEHOLDER_COLOR);
                        ctx.fill_rect(rect.x, rect.y, rect.width, rect.height);
                    }
                },
                Element::RoundedRect {
                    rect,
                    radius,
                    fill,
                    stroke,
                } => {
                    rounded_rect_path(ctx, *rect, *radius)?;
                    ctx.set_fill_style_str(&fill.color.css(fill.alpha));
                    ctx.fill();
                    if let Some(stroke) = stroke {
                        ctx.set_stroke_style_str(&stroke.color.css(1.0));
                        ctx.set_line_width(stroke.width);
                        ctx.stroke();
                    }
                }
                Element::Text { lines, x, y, style } => {
                    fill_text_block(ctx, lines, *x, *y, style)?;
                }
            }

            ctx.restore();
        }

        Ok(())
    }
}

/// Coalesces repaint requests into one `requestAnimationFrame` callback.
pub fn redraw_scheduler(surface: Rc<RefCell<Surface>>) -> Rc<dyn Fn()> {
    let raf_holder: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));

    Rc::new(move || {
        if raf_holder.borrow().is_some() {
            return;
        }

        let surface_cb = Rc::clone(&surface);
        let raf_holder_cb = Rc::clone(&raf_holder);
        let cb = Closure::wrap(Box::new(move |_ts: f64| {
            raf_holder_cb.borrow_mut().take();
            if let Err(err) = surface_cb.borrow_mut().paint() {
                warn!("paint failed: {}", err);
            }
        }) as Box<dyn FnMut(f64)>);

        if window()
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .is_ok()
        {
            *raf_holder.borrow_mut() = Some(cb);
        }
    })
}

/// Looping ambient track backed by its own `<audio>` element.
pub struct WebSound {
    element: HtmlAudioElement,
    blocked: Rc<Cell<bool>>,
}

impl AmbientSound for WebSound {
    fn play(&mut self) -> Result<()> {
        let promise = self
            .element
            .play()
            .map_err(|err| MenuError::Audio(js_value_to_string(&err)))?;

        // Autoplay rejection arrives asynchronously.
        let blocked = Rc::clone(&self.blocked);
        spawn_local(async move {
            match JsFuture::from(promise).await {
                Ok(_) => blocked.set(false),
                Err(err) => {
                    blocked.set(true);
                    warn!(
                        "ambient playback blocked until user gesture: {}",
                        js_value_to_string(&err)
                    );
                }
            }
        });
        Ok(())
    }

    fn stop(&mut self) {
        let _ = self.element.pause();
        self.element.set_current_time(0.0);
        let _ = self.element.remove_attribute("src");
        self.element.load();
    }

    fn is_blocked(&self) -> bool {
        self.blocked.get()
    }
}

/// Live window resize listener with a settle timer. Dropping it detaches the
/// listener and cancels a pending relayout.
pub struct ResizeSubscription {
    _listener: EventListener,
    pending: Rc<RefCell<Option<Timeout>>>,
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        // Dropping a gloo `Timeout` clears it.
        self.pending.borrow_mut().take();
        debug!("resize subscription released");
    }
}

/// A scene's handle onto the shared `Surface`.
pub struct CanvasStage {
    surface: Rc<RefCell<Surface>>,
    schedule_redraw: Rc<dyn Fn()>,
    on_resize: Rc<dyn Fn()>,
    resize_settle_ms: u32,
}

impl CanvasStage {
    pub fn new(
        surface: Rc<RefCell<Surface>>,
        schedule_redraw: Rc<dyn Fn()>,
        on_resize: Rc<dyn Fn()>,
        resize_settle_ms: u32,
    ) -> Self {
        Self {
            surface,
            schedule_redraw,
            on_resize,
            resize_settle_ms: resize_settle_ms.min(MAX_RESIZE_SETTLE_MS),
        }
    }

    fn mutate<T>(&mut self, f: impl FnOnce(&mut Surface) -> T) -> T {
        let out = f(&mut self.surface.borrow_mut());
        (self.schedule_redraw)();
        out
    }
}

impl Stage for CanvasStage {
    type Sound = WebSound;
    type ResizeSubscription = ResizeSubscription;

    fn viewport(&self) -> Viewport {
        viewport_from_window()
    }

    fn add(&mut self, element: Element) -> ElementId {
        self.mutate(|s| s.push(element))
    }

    fn replace(&mut self, id: ElementId, element: Element) -> Result<()> {
        self.mutate(|s| {
            s.node_mut(id)?.element = element;
            Ok(())
        })
    }

    fn destroy(&mut self, id: ElementId) {
        self.mutate(|s| s.remove(id));
    }

    fn clear(&mut self) {
        self.mutate(Surface::clear);
    }

    fn element_count(&self) -> usize {
        self.surface.borrow().len()
    }

    fn apply_pipeline(&mut self, id: ElementId, name: &str) -> Result<()> {
        self.mutate(|s| {
            if !s.has_pipeline(name) {
                return Err(MenuError::MissingPipeline(name.to_string()));
            }
            s.node_mut(id)?.pipeline = Some(name.to_string());
            Ok(())
        })
    }

    fn measure_text(&self, text: &str, font_px: f64) -> f64 {
        self.surface.borrow().measure_text(text, font_px)
    }

    fn set_pointer_cursor(&mut self, hovering: bool) {
        let surface = self.surface.borrow();
        let cursor = if hovering { "pointer" } else { "default" };
        let _ = surface.canvas().style().set_property("cursor", cursor);
    }

    fn add_sound(&mut self, key: &str, config: SoundConfig) -> Option<WebSound> {
        let src = {
            let surface = self.surface.borrow();
            let assets = surface.assets.borrow();
            assets.audio(key)?.current_src()
        };

        let element = match HtmlAudioElement::new_with_src(&src) {
            Ok(element) => element,
            Err(err) => {
                warn!("sound `{}` unavailable: {}", key, js_value_to_string(&err));
                return None;
            }
        };
        element.set_loop(config.looped);
        element.set_volume(config.volume);

        Some(WebSound {
            element,
            blocked: Rc::new(Cell::new(false)),
        })
    }

    fn subscribe_resize(&mut self) -> ResizeSubscription {
        let pending: Rc<RefCell<Option<Timeout>>> = Rc::new(RefCell::new(None));

        let settle_ms = self.resize_settle_ms;
        let on_resize = Rc::clone(&self.on_resize);
        let pending_ev = Rc::clone(&pending);
        let listener = EventListener::new(window().as_ref(), "resize", move |_event| {
            if settle_ms == 0 {
                on_resize();
                return;
            }

            let on_settle = Rc::clone(&on_resize);
            // Replacing the previous timeout cancels it.
            *pending_ev.borrow_mut() = Some(Timeout::new(settle_ms, move || {
                debug!("resize settled");
                on_settle();
            }));
        });

        ResizeSubscription {
            _listener: listener,
            pending,
        }
    }

    fn start_scene(&mut self, key: SceneKey) {
        info!("starting scene {}", key.as_str());
        if let Some(document) = window().document() {
            if let Some(root) = document.document_element() {
                let _ = root.set_attribute("data-scene", key.as_str());
            }
            set_status(&document, "left_menu");
        }
        if let Err(err) = window().location().set_hash(key.as_str()) {
            warn!("scene hash not updated: {}", js_value_to_string(&err));
        }
    }
}
