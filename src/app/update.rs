//! Operation handlers - one submodule per user-facing flow

mod ask;
mod audio;
mod charts;
mod dataset;
mod health;
mod upload;

use std::sync::Arc;

use parking_lot::Mutex;

use super::state::Session;
use crate::error::ControllerError;

pub use ask::AskOutcome;
pub use upload::SubmitOutcome;

/// The two independent request flows, each with its own busy flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Upload,
    Ask,
}

impl Flow {
    fn name(self) -> &'static str {
        match self {
            Flow::Upload => "upload",
            Flow::Ask => "AI question",
        }
    }

    fn flag(self, session: &mut Session) -> &mut bool {
        match self {
            Flow::Upload => &mut session.is_busy,
            Flow::Ask => &mut session.is_asking,
        }
    }
}

/// Holds a flow's busy flag up for as long as it lives
///
/// Dropping it clears the flag, so every exit path, including the
/// request future itself being dropped, returns the flow to idle.
struct FlowGuard {
    session: Arc<Mutex<Session>>,
    flow: Flow,
}

impl FlowGuard {
    /// Raise the flag on the caller's locked session, or refuse if already raised
    fn engage(
        session: &mut Session,
        shared: &Arc<Mutex<Session>>,
        flow: Flow,
    ) -> Result<Self, ControllerError> {
        let flag = flow.flag(session);
        if *flag {
            tracing::warn!("Rejected {}: one is already in flight", flow.name());
            return Err(ControllerError::Busy(flow.name()));
        }
        *flag = true;
        Ok(Self {
            session: shared.clone(),
            flow,
        })
    }
}

impl Drop for FlowGuard {
    fn drop(&mut self) {
        *self.flow.flag(&mut self.session.lock()) = false;
    }
}
