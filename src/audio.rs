use log::{debug, info, warn};

use crate::error::Result;

pub const AMBIENT_KEY: &str = "birdSound";
pub const AMBIENT_VOLUME: f64 = 0.5;

pub trait AmbientSound {
    fn play(&mut self) -> Result<()>;
    fn stop(&mut self);

    /// True when the browser refused playback (autoplay policy) and a user
    /// gesture is needed to start it.
    fn is_blocked(&self) -> bool {
        false
    }
}

/// Owns the scene's single looping ambient sound.
pub struct AudioController<S: AmbientSound> {
    sound: Option<S>,
    retried: bool,
}

impl<S: AmbientSound> Default for AudioController<S> {
    fn default() -> Self {
        Self {
            sound: None,
            retried: false,
        }
    }
}

impl<S: AmbientSound> AudioController<S> {
    pub fn is_active(&self) -> bool {
        self.sound.is_some()
    }

    pub fn start(&mut self, sound: Option<S>) {
        if self.sound.is_some() {
            debug!("ambient sound already running");
            return;
        }
        let Some(mut sound) = sound else {
            warn!("ambient sound `{}` unavailable; continuing silent", AMBIENT_KEY);
            return;
        };

        if let Err(err) = sound.play() {
            warn!("ambient sound failed to start: {}", err);
        } else {
            info!("ambient sound started");
        }
        self.retried = false;
        self.sound = Some(sound);
    }

    /// Retries a blocked sound once, from inside a user gesture.
    pub fn on_user_gesture(&mut self) {
        if self.retried {
            return;
        }
        let Some(sound) = self.sound.as_mut() else {
            return;
        };
        if !sound.is_blocked() {
            return;
        }

        self.retried = true;
        match sound.play() {
            Ok(()) => info!("ambient sound resumed after user gesture"),
            Err(err) => warn!("ambient sound retry failed: {}", err),
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut sound) = self.sound.take() {
            sound.stop();
            info!("ambient sound stopped");
        }
    }
}
