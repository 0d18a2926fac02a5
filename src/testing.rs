//! In-memory `Stage` used by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use crate::audio::AmbientSound;
use crate::error::{MenuError, Result};
use crate::layout::Viewport;
use crate::stage::{Element, ElementId, SceneKey, SoundConfig, Stage};

#[derive(Default)]
pub(crate) struct SoundLog {
    pub created: usize,
    pub plays: usize,
    pub stops: usize,
    pub block_playback: bool,
    pub last_config: Option<SoundConfig>,
}

pub(crate) struct FakeSound {
    log: Rc<RefCell<SoundLog>>,
    blocked: bool,
}

impl FakeSound {
    pub fn new(log: Rc<RefCell<SoundLog>>) -> Self {
        Self {
            log,
            blocked: false,
        }
    }
}

impl AmbientSound for FakeSound {
    fn play(&mut self) -> Result<()> {
        let mut log = self.log.borrow_mut();
        log.plays += 1;
        self.blocked = log.block_playback;
        Ok(())
    }

    fn stop(&mut self) {
        self.log.borrow_mut().stops += 1;
    }

    fn is_blocked(&self) -> bool {
        self.blocked
    }
}

pub(crate) struct FakeSubscription(Rc<Cell<usize>>);

impl Drop for FakeSubscription {
    fn drop(&mut self) {
        self.0.set(self.0.get() - 1);
    }
}

pub(crate) struct RecordingStage {
    pub viewport: Viewport,
    pub elements: BTreeMap<ElementId, Element>,
    pub pipelines: HashSet<String>,
    pub applied: Vec<(ElementId, String)>,
    pub replaced: Vec<(ElementId, Element)>,
    pub pointer_cursor: bool,
    pub transitions: Vec<SceneKey>,
    pub has_ambient: bool,
    pub sounds: Rc<RefCell<SoundLog>>,
    pub live_resize_subscriptions: Rc<Cell<usize>>,
    next_id: u32,
}

impl RecordingStage {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            elements: BTreeMap::new(),
            pipelines: HashSet::from(["blur".to_string()]),
            applied: Vec::new(),
            replaced: Vec::new(),
            pointer_cursor: false,
            transitions: Vec::new(),
            has_ambient: true,
            sounds: Rc::new(RefCell::new(SoundLog::default())),
            live_resize_subscriptions: Rc::new(Cell::new(0)),
            next_id: 0,
        }
    }

    pub fn count(&self, pred: impl Fn(&Element) -> bool) -> usize {
        self.elements.values().filter(|e| pred(e)).count()
    }

    pub fn images(&self) -> usize {
        self.count(|e| matches!(e, Element::Image { .. }))
    }

    pub fn rounded_rects(&self) -> usize {
        self.count(|e| matches!(e, Element::RoundedRect { .. }))
    }

    pub fn texts(&self) -> usize {
        self.count(|e| matches!(e, Element::Text { .. }))
    }
}

impl Stage for RecordingStage {
    type Sound = FakeSound;
    type ResizeSubscription = FakeSubscription;

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn add(&mut self, element: Element) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(id, element);
        id
    }

    fn replace(&mut self, id: ElementId, element: Element) -> Result<()> {
        let slot = self
            .elements
            .get_mut(&id)
            .ok_or(MenuError::UnknownElement(id))?;
        *slot = element.clone();
        self.replaced.push((id, element));
        Ok(())
    }

    fn destroy(&mut self, id: ElementId) {
        self.elements.remove(&id);
    }

    fn clear(&mut self) {
        self.elements.clear();
    }

    fn element_count(&self) -> usize {
        self.elements.len()
    }

    fn apply_pipeline(&mut self, id: ElementId, name: &str) -> Result<()> {
        if !self.pipelines.contains(name) {
            return Err(MenuError::MissingPipeline(name.to_string()));
        }
        self.applied.push((id, name.to_string()));
        Ok(())
    }

    fn measure_text(&self, text: &str, font_px: f64) -> f64 {
        text.chars().count() as f64 * font_px * 0.5
    }

    fn set_pointer_cursor(&mut self, hovering: bool) {
        self.pointer_cursor = hovering;
    }

    fn add_sound(&mut self, key: &str, config: SoundConfig) -> Option<FakeSound> {
        if key != crate::audio::AMBIENT_KEY || !self.has_ambient {
            return None;
        }
        let mut log = self.sounds.borrow_mut();
        log.created += 1;
        log.last_config = Some(config);
        Some(FakeSound::new(Rc::clone(&self.sounds)))
    }

    fn subscribe_resize(&mut self) -> FakeSubscription {
        let live = &self.live_resize_subscriptions;
        live.set(live.get() + 1);
        FakeSubscription(Rc::clone(live))
    }

    fn start_scene(&mut self, key: SceneKey) {
        self.transitions.push(key);
    }
}
