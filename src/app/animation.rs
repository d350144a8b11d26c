//! Score animation - counts the displayed score up to the real one
//!
//! A cancellable tokio task that bumps `Session::animated_score` by one
//! per tick. At most one runs at a time: starting a new animation aborts
//! the old task, and a generation stamp in the session keeps an aborted
//! task from landing one last increment after a restart.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::state::Session;

pub struct ScoreAnimation {
    tick: Duration,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ScoreAnimation {
    pub fn new(tick: Duration) -> Self {
        Self {
            tick,
            handle: Mutex::new(None),
        }
    }

    pub fn tick(&self) -> Duration {
        self.tick
    }

    /// Restart from 0 toward `target`
    ///
    /// `session` is the caller's locked view of `shared`; the new task only
    /// touches the session once the caller releases it.
    pub fn start(&self, session: &mut Session, shared: Arc<Mutex<Session>>, target: u32) {
        let generation = self.stop(session);
        if target == 0 {
            return;
        }

        let tick = self.tick;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let mut s = shared.lock();
                if s.animation_generation != generation {
                    break;
                }
                if s.animated_score < target {
                    s.animated_score += 1;
                }
                if s.animated_score >= target {
                    tracing::debug!("Score animation reached {}", target);
                    break;
                }
            }
        });
        *self.handle.lock() = Some(task);
    }

    /// Cancel any running animation and reset the score, returning the new generation
    pub fn stop(&self, session: &mut Session) -> u64 {
        session.animation_generation += 1;
        session.animated_score = 0;
        if let Some(task) = self.handle.lock().take() {
            task.abort();
        }
        session.animation_generation
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for ScoreAnimation {
    fn drop(&mut self) {
        if let Some(task) = self.handle.get_mut().take() {
            task.abort();
        }
    }
}
