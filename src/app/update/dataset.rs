//! Dataset selection

use tracing::info;

use crate::app::{Controller, DatasetFile};

impl Controller {
    /// Choose the dataset for the next analysis
    ///
    /// Clears everything derived from the previous file. An upload still in
    /// flight keeps running, but its reply will be discarded.
    pub fn select_file(&self, file: DatasetFile) {
        let mut s = self.session.lock();
        info!("Selected dataset {}", file.name());

        s.selected_file = Some(file);
        s.error_message = None;
        s.analysis_result = None;
        s.selected_chart_index = 0;
        s.upload_generation += 1;
        self.animation.stop(&mut s);
    }
}
