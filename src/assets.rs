use std::cell::RefCell;
use std::collections::HashMap;

use js_sys::{Array, Promise};
use log::{debug, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlAudioElement, HtmlImageElement};

use crate::error::{MenuError, Result};
use crate::scene::{AssetKind, AssetRequest};
use crate::window;

// Mobile browsers may hold media loading until a user gesture; don't block the menu on it.
const AUDIO_READY_TIMEOUT_MS: i32 = 2500;

/// Decoded images and primed audio elements, keyed like the scene asks for them.
/// Shared across scene visits so returning to the menu doesn't refetch.
#[derive(Default)]
pub struct AssetCache {
    images: HashMap<String, HtmlImageElement>,
    audio: HashMap<String, HtmlAudioElement>,
}

impl AssetCache {
    pub fn image(&self, key: &str) -> Option<&HtmlImageElement> {
        self.images.get(key)
    }

    pub fn audio(&self, key: &str) -> Option<&HtmlAudioElement> {
        self.audio.get(key)
    }

    pub fn contains(&self, request: &AssetRequest) -> bool {
        match request.kind {
            AssetKind::Image => self.images.contains_key(request.key),
            AssetKind::Audio => self.audio.contains_key(request.key),
        }
    }

    pub fn insert_image(&mut self, key: &str, image: HtmlImageElement) {
        self.images.insert(key.to_string(), image);
    }

    pub fn insert_audio(&mut self, key: &str, audio: HtmlAudioElement) {
        self.audio.insert(key.to_string(), audio);
    }
}

async fn load_image(url: &str) -> Result<HtmlImageElement> {
    let image = HtmlImageElement::new()?;
    image.set_src(url);
    JsFuture::from(image.decode()).await?;
    Ok(image)
}

fn timeout_promise(ms: i32) -> Promise {
    Promise::new(&mut |resolve, _reject| {
        let _ = window().set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
    })
}

async fn load_audio(url: &str) -> Result<HtmlAudioElement> {
    let audio = HtmlAudioElement::new_with_src(url)?;
    audio.set_preload("auto");

    let ready = Promise::new(&mut |resolve, reject| {
        audio.set_oncanplaythrough(Some(&resolve));
        audio.set_onerror(Some(&reject));
    });
    audio.load();

    let outcome = JsFuture::from(Promise::race(&Array::of2(
        &ready,
        &timeout_promise(AUDIO_READY_TIMEOUT_MS),
    )))
    .await;
    audio.set_oncanplaythrough(None);
    audio.set_onerror(None);
    outcome?;

    Ok(audio)
}

/// Loads every request that isn't cached yet. Failures are logged and leave the
/// key missing; the stage draws placeholders for missing assets.
pub async fn preload(cache: &RefCell<AssetCache>, requests: &[AssetRequest]) {
    for request in requests {
        if cache.borrow().contains(request) {
            debug!("asset `{}` already cached", request.key);
            continue;
        }

        let loaded = match request.kind {
            AssetKind::Image => load_image(&request.url)
                .await
                .map(|image| cache.borrow_mut().insert_image(request.key, image)),
            AssetKind::Audio => load_audio(&request.url)
                .await
                .map(|audio| cache.borrow_mut().insert_audio(request.key, audio)),
        };

        match loaded.map_err(|err| MenuError::AssetLoad {
            key: request.key.to_string(),
            reason: err.to_string(),
        }) {
            Ok(()) => debug!("asset `{}` loaded from {}", request.key, request.url),
            Err(err) => warn!("{}", err),
        }
    }
}
