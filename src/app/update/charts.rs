//! Chart selection

use tracing::debug;

use crate::app::{Chart, Controller};
use crate::error::ControllerError;

impl Controller {
    /// Show the chart at `index`; out-of-range input changes nothing
    pub fn select_chart(&self, index: usize) -> Result<(), ControllerError> {
        let mut s = self.session.lock();
        let len = s.charts().len();
        if index >= len {
            debug!("Ignoring chart index {} ({} charts)", index, len);
            return Err(ControllerError::Validation(format!(
                "chart index {} is out of range (0..{})",
                index, len
            )));
        }
        s.selected_chart_index = index;
        Ok(())
    }

    pub fn selected_chart(&self) -> Option<Chart> {
        self.session.lock().selected_chart().cloned()
    }

    /// Picker labels for the current result
    pub fn chart_options(&self) -> Vec<String> {
        self.session.lock().chart_options()
    }
}
