//! Dataset upload and analysis result handling

use tracing::{error, info, warn};

use super::{Flow, FlowGuard};
use crate::api::UploadReply;
use crate::app::Controller;
use crate::error::{ControllerError, TransportError};

pub const NO_FILE_MESSAGE: &str = "Please select a file first.";
pub const UNREACHABLE_MESSAGE: &str =
    "Failed to connect to the analysis service. Make sure it is running and reachable.";
pub const UNREADABLE_MESSAGE: &str = "The analysis service returned a response that could not be read.";

/// How a submission that reached the backend ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Result applied to the session
    Analyzed { score: u32, charts: usize },
    /// A newer file was selected while the request was in flight
    Superseded,
}

fn transport_message(err: &TransportError) -> &'static str {
    match err {
        TransportError::Unreachable(_) | TransportError::Status(_) => UNREACHABLE_MESSAGE,
        TransportError::Malformed(_) => UNREADABLE_MESSAGE,
    }
}

impl Controller {
    /// Upload the selected dataset and apply the analysis
    pub async fn submit_analysis(&self) -> Result<SubmitOutcome, ControllerError> {
        let (file, generation, _busy) = {
            let mut s = self.session.lock();
            let Some(file) = s.selected_file.clone() else {
                warn!("Submit without a selected file");
                s.error_message = Some(NO_FILE_MESSAGE.to_string());
                return Err(ControllerError::Validation(NO_FILE_MESSAGE.to_string()));
            };
            let busy = FlowGuard::engage(&mut s, &self.session, Flow::Upload)?;
            s.error_message = None;
            (file, s.upload_generation, busy)
        };

        let contents = match file.contents().await {
            Ok(contents) => contents,
            Err(e) => {
                let message = format!("Could not read {}: {}", file.name(), e);
                error!("{}", message);
                let mut s = self.session.lock();
                if s.upload_generation == generation {
                    s.error_message = Some(message.clone());
                }
                return Err(ControllerError::Validation(message));
            }
        };

        info!("Submitting {} for analysis", file.name());
        let reply = self.backend.upload(&file, contents).await;

        let mut s = self.session.lock();
        if s.upload_generation != generation {
            info!("Discarding analysis of {}: a newer file was selected", file.name());
            return Ok(SubmitOutcome::Superseded);
        }

        match reply {
            Ok(UploadReply::Analysis(result)) => {
                let outcome = SubmitOutcome::Analyzed {
                    score: result.score,
                    charts: result.charts.len(),
                };
                info!(
                    "Analysis of {} complete: score {}, {} charts",
                    file.name(),
                    result.score,
                    result.charts.len()
                );
                let score = result.score;
                s.conversation_context = result.dataset_summary.clone();
                s.analysis_result = Some(result);
                s.selected_chart_index = 0;
                s.error_message = None;
                self.animation.start(&mut s, self.session.clone(), score);
                Ok(outcome)
            }
            Ok(UploadReply::Rejected(message)) => {
                warn!("Analysis of {} rejected: {}", file.name(), message);
                s.error_message = Some(message.clone());
                Err(ControllerError::Semantic(message))
            }
            Err(e) => {
                error!("Upload of {} failed: {}", file.name(), e);
                s.error_message = Some(transport_message(&e).to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::testing::{FakeBackend, TICK, analysis, csv_file};

    fn controller(backend: &Arc<FakeBackend>) -> Controller {
        Controller::with_tick(backend.clone(), TICK)
    }

    #[tokio::test]
    async fn test_submit_without_file_is_validation_error() {
        let backend = Arc::new(FakeBackend::new());
        let controller = controller(&backend);

        let err = controller.submit_analysis().await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert_eq!(backend.upload_calls(), 0);

        let s = controller.snapshot();
        assert_eq!(s.error_message.as_deref(), Some(NO_FILE_MESSAGE));
        assert!(!s.is_busy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_success() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Ok(UploadReply::Analysis(analysis(87, &["Revenue"]))));
        let controller = controller(&backend);

        controller.select_file(csv_file("sales.csv"));
        let outcome = controller.submit_analysis().await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Analyzed { score: 87, charts: 1 });

        let s = controller.snapshot();
        let result = s.analysis_result.as_ref().unwrap();
        assert_eq!(result.score, 87);
        assert_eq!(result.charts.len(), 1);
        assert_eq!(s.selected_chart_index, 0);
        assert!(s.error_message.is_none());
        assert!(!s.is_busy);
        assert_eq!(s.conversation_context, "summary of 87");
        assert_eq!(backend.last_upload_name().as_deref(), Some("sales.csv"));
        assert!(controller.is_animating());
    }

    #[tokio::test]
    async fn test_scenario_error_field_at_200() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Ok(UploadReply::Rejected(
            "Unsupported file format".to_string(),
        )));
        let controller = controller(&backend);

        controller.select_file(csv_file("photo.csv"));
        let err = controller.submit_analysis().await.unwrap_err();
        assert!(matches!(err, ControllerError::Semantic(ref m) if m == "Unsupported file format"));

        let s = controller.snapshot();
        assert_eq!(s.error_message.as_deref(), Some("Unsupported file format"));
        assert!(s.analysis_result.is_none());
        assert!(!s.is_busy);
    }

    #[tokio::test]
    async fn test_scenario_network_failure() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Err(TransportError::Unreachable(
            "connection refused".to_string(),
        )));
        let controller = controller(&backend);

        controller.select_file(csv_file("sales.csv"));
        let err = controller.submit_analysis().await.unwrap_err();
        assert!(matches!(err, ControllerError::Transport(_)));

        let s = controller.snapshot();
        let message = s.error_message.unwrap();
        assert!(message.contains("Failed to connect to the analysis service"));
        assert!(!s.is_busy);
        assert!(s.analysis_result.is_none());
    }

    #[tokio::test]
    async fn test_malformed_reply_has_its_own_message() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Err(TransportError::Malformed("eof".to_string())));
        let controller = controller(&backend);

        controller.select_file(csv_file("sales.csv"));
        controller.submit_analysis().await.unwrap_err();
        assert_eq!(
            controller.snapshot().error_message.as_deref(),
            Some(UNREADABLE_MESSAGE)
        );
    }

    #[tokio::test]
    async fn test_unreadable_file_never_reaches_backend() {
        let backend = Arc::new(FakeBackend::new());
        let controller = controller(&backend);

        controller.select_file(crate::app::DatasetFile::from_path(
            "/definitely/not/here/data.csv",
        ));
        let err = controller.submit_analysis().await.unwrap_err();
        assert!(matches!(err, ControllerError::Validation(_)));
        assert_eq!(backend.upload_calls(), 0);

        let s = controller.snapshot();
        assert!(s.error_message.unwrap().starts_with("Could not read data.csv"));
        assert!(!s.is_busy);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_only_while_in_flight() {
        for reply in [
            Ok(UploadReply::Analysis(analysis(3, &["A"]))),
            Ok(UploadReply::Rejected("bad".to_string())),
            Err(TransportError::Status(502)),
        ] {
            let backend = Arc::new(FakeBackend::new());
            let gate = backend.hold_uploads();
            backend.push_upload(reply);
            let controller = controller(&backend);

            controller.select_file(csv_file("sales.csv"));
            assert!(!controller.snapshot().is_busy);

            let task = tokio::spawn({
                let controller = controller.clone();
                async move { controller.submit_analysis().await }
            });
            backend.wait_for_uploads(1).await;
            assert!(controller.snapshot().is_busy);

            gate.notify_one();
            let _ = task.await.unwrap();
            assert!(!controller.snapshot().is_busy);
        }
    }

    #[tokio::test]
    async fn test_error_cleared_before_request_resolves() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Ok(UploadReply::Rejected("first failure".to_string())));
        let controller = controller(&backend);
        controller.select_file(csv_file("sales.csv"));
        controller.submit_analysis().await.unwrap_err();
        assert!(controller.snapshot().error_message.is_some());

        let gate = backend.hold_uploads();
        backend.push_upload(Ok(UploadReply::Rejected("second failure".to_string())));
        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit_analysis().await }
        });
        backend.wait_for_uploads(2).await;
        assert!(controller.snapshot().error_message.is_none());

        gate.notify_one();
        task.await.unwrap().unwrap_err();
        assert_eq!(
            controller.snapshot().error_message.as_deref(),
            Some("second failure")
        );
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_rejected() {
        let backend = Arc::new(FakeBackend::new());
        let gate = backend.hold_uploads();
        backend.push_upload(Ok(UploadReply::Analysis(analysis(10, &["A"]))));
        let controller = controller(&backend);
        controller.select_file(csv_file("sales.csv"));

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit_analysis().await }
        });
        backend.wait_for_uploads(1).await;

        let err = controller.submit_analysis().await.unwrap_err();
        assert!(matches!(err, ControllerError::Busy(_)));
        // Rejection must not clear the in-flight flag
        assert!(controller.snapshot().is_busy);

        gate.notify_one();
        first.await.unwrap().unwrap();
        assert_eq!(backend.upload_calls(), 1);
        assert_eq!(controller.snapshot().analysis_result.unwrap().score, 10);
    }

    #[tokio::test]
    async fn test_stale_reply_is_discarded() {
        let backend = Arc::new(FakeBackend::new());
        let gate = backend.hold_uploads();
        backend.push_upload(Ok(UploadReply::Analysis(analysis(99, &["Old"]))));
        let controller = controller(&backend);
        controller.select_file(csv_file("old.csv"));

        let task = tokio::spawn({
            let controller = controller.clone();
            async move { controller.submit_analysis().await }
        });
        backend.wait_for_uploads(1).await;
        controller.select_file(csv_file("new.csv"));

        gate.notify_one();
        assert_eq!(task.await.unwrap().unwrap(), SubmitOutcome::Superseded);

        let s = controller.snapshot();
        assert!(s.analysis_result.is_none());
        assert!(s.conversation_context.is_empty());
        assert!(!s.is_busy);
        assert_eq!(s.selected_file.unwrap().name(), "new.csv");
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_result_resets_chart_index() {
        let backend = Arc::new(FakeBackend::new());
        backend.push_upload(Ok(UploadReply::Analysis(analysis(50, &["A", "B", "C"]))));
        backend.push_upload(Ok(UploadReply::Analysis(analysis(60, &["D", "E"]))));
        let controller = controller(&backend);
        controller.select_file(csv_file("sales.csv"));

        controller.submit_analysis().await.unwrap();
        controller.select_chart(2).unwrap();
        assert_eq!(controller.snapshot().selected_chart_index, 2);

        controller.submit_analysis().await.unwrap();
        let s = controller.snapshot();
        assert_eq!(s.selected_chart_index, 0);
        assert_eq!(s.analysis_result.unwrap().score, 60);
        assert_eq!(s.conversation_context, "summary of 60");
    }

    #[tokio::test(start_paused = true)]
    async fn test_score_animation_after_submit() {
        for target in [0u32, 1, 100] {
            let backend = Arc::new(FakeBackend::new());
            backend.push_upload(Ok(UploadReply::Analysis(analysis(target, &["A"]))));
            let controller = controller(&backend);
            controller.select_file(csv_file("sales.csv"));
            controller.submit_analysis().await.unwrap();

            let mut last = controller.snapshot().animated_score;
            let mut rounds = 0;
            while controller.is_animating() {
                tokio::time::sleep(TICK).await;
                let current = controller.snapshot().animated_score;
                assert!(current >= last && current <= target);
                last = current;
                rounds += 1;
                assert!(rounds <= target as usize + 10, "animation did not terminate");
            }
            assert_eq!(controller.snapshot().animated_score, target);
        }
    }
}
