//! Upload-analyze-visualize controller
//!
//! `Controller` owns the session and runs every user operation against it.
//! The session sits behind a shared lock that is only ever held between
//! awaits, never across one, so the analysis and AI flows can interleave.

mod animation;
mod state;
mod update;

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::api::AnalysisBackend;
use crate::features::Settings;

use animation::ScoreAnimation;
pub use state::{AnalysisResult, AudioPreview, Chart, ChartImage, DatasetFile, Session};
pub use update::{AskOutcome, SubmitOutcome};

/// Client-side controller for one analysis session
#[derive(Clone)]
pub struct Controller {
    backend: Arc<dyn AnalysisBackend>,
    session: Arc<Mutex<Session>>,
    animation: Arc<ScoreAnimation>,
    /// Sent with questions when the caller supplies no key
    default_api_key: Option<String>,
}

impl Controller {
    /// Create a controller with a fresh session
    pub fn new(backend: Arc<dyn AnalysisBackend>, settings: &Settings) -> Self {
        let mut controller = Self::with_tick(backend, settings.animation.tick());
        controller.default_api_key = settings.ai.api_key.clone().filter(|k| !k.is_empty());
        controller
    }

    pub fn with_tick(backend: Arc<dyn AnalysisBackend>, tick: Duration) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(Session::new())),
            animation: Arc::new(ScoreAnimation::new(tick)),
            default_api_key: None,
        }
    }

    /// Copy of the current session state
    pub fn snapshot(&self) -> Session {
        self.session.lock().clone()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_running()
    }

    pub fn animation_tick(&self) -> Duration {
        self.animation.tick()
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("backend", &"<AnalysisBackend>")
            .field("session", &*self.session.lock())
            .finish()
    }
}
