use std::time::Duration;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::notifier::{Notifier, NotifyError};
use crate::review_api::{ApiError, StatusSource};
use crate::utils::formatting::status_message;

#[derive(Debug, Error)]
pub enum CycleError {
    #[error("could not fetch homework statuses: {0}")]
    Fetch(#[from] ApiError),

    #[error("could not deliver the status notification: {0}")]
    Notify(#[from] NotifyError),
}

/// Drives the fetch -> format -> notify cycle on a fixed cadence.
///
/// The cursor is the Unix timestamp sent as `from_date`; it starts at the
/// service start time and advances to the server-reported `current_date`
/// after each fully successful cycle, so a failed delivery re-fetches the
/// same record on the next attempt.
pub struct PollService<S, N> {
    source: S,
    notifier: N,
    poll_interval: Duration,
    retry_interval: Duration,
}

impl<S: StatusSource, N: Notifier> PollService<S, N> {
    pub fn new(
        source: S,
        notifier: N,
        poll_interval: Duration,
        retry_interval: Duration,
    ) -> PollService<S, N> {
        PollService {
            source,
            notifier,
            poll_interval,
            retry_interval,
        }
    }

    /// Runs the poll loop until the process is shut down. A failed cycle is
    /// logged and retried after the short interval; the loop itself never
    /// exits.
    pub async fn run(&self) {
        let mut cursor = OffsetDateTime::now_utc().unix_timestamp();

        info!(
            "Starting the status poll loop (interval: {:?}, retry: {:?})",
            self.poll_interval, self.retry_interval
        );

        loop {
            let delay = match self.run_cycle(&mut cursor).await {
                Ok(()) => self.poll_interval,
                Err(err) => {
                    error!("Poll cycle failed: {err}");
                    self.retry_interval
                }
            };

            tokio::time::sleep(delay).await;
        }
    }

    #[tracing::instrument(skip(self))]
    async fn run_cycle(&self, cursor: &mut i64) -> Result<(), CycleError> {
        let page = self.source.fetch_statuses(*cursor).await?;

        // Only the most recent submission is reported, even if several
        // changed status since the last poll.
        if let Some(homework) = page.homeworks.first() {
            info!("Homework status changed: {homework:?}");

            self.notifier.send(&status_message(homework)).await?;
        }

        if let Some(current_date) = page.current_date {
            *cursor = current_date;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use test_log::test;

    use super::{CycleError, PollService};
    use crate::models::{Homework, StatusPage};
    use crate::notifier::{Notifier, NotifyError};
    use crate::review_api::{ApiError, StatusSource};

    struct ScriptedSource(Mutex<Vec<Result<StatusPage, ApiError>>>);

    impl ScriptedSource {
        fn returning(result: Result<StatusPage, ApiError>) -> ScriptedSource {
            ScriptedSource(Mutex::new(vec![result]))
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_statuses(&self, _from_date: i64) -> Result<StatusPage, ApiError> {
            self.0
                .lock()
                .unwrap()
                .pop()
                .expect("Scripted source ran out of responses")
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> RecordingNotifier {
            RecordingNotifier {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn sent(&self) -> Vec<String> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Rejected("scripted failure".to_owned()));
            }

            self.sent.lock().unwrap().push(text.to_owned());
            Ok(())
        }
    }

    fn homework(name: &str, status: &str) -> Homework {
        Homework {
            homework_name: name.to_owned(),
            status: status.to_owned(),
        }
    }

    fn service(
        source: ScriptedSource,
        notifier: RecordingNotifier,
    ) -> PollService<ScriptedSource, RecordingNotifier> {
        PollService::new(
            source,
            notifier,
            Duration::from_secs(300),
            Duration::from_secs(5),
        )
    }

    #[test(tokio::test)]
    async fn approved_homework_is_notified_and_the_cursor_advances() {
        let source = ScriptedSource::returning(Ok(StatusPage {
            homeworks: vec![homework("hw1", "approved")],
            current_date: Some(1000),
        }));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 0;
        service.run_cycle(&mut cursor).await.unwrap();

        let sent = service.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw1"));
        assert!(sent[0].contains("has been accepted"));
        assert_eq!(cursor, 1000);
    }

    #[test(tokio::test)]
    async fn empty_page_sends_nothing_and_keeps_the_cursor() {
        let source = ScriptedSource::returning(Ok(StatusPage::default()));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 123;
        service.run_cycle(&mut cursor).await.unwrap();

        assert!(service.notifier.sent().is_empty());
        assert_eq!(cursor, 123);
    }

    #[test(tokio::test)]
    async fn fetch_error_becomes_a_fetch_cycle_error() {
        let source = ScriptedSource::returning(Err(ApiError::Status {
            status: 500,
            message: "boom".to_owned(),
        }));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 123;
        let result = service.run_cycle(&mut cursor).await;

        assert!(matches!(result, Err(CycleError::Fetch(_))));
        assert!(service.notifier.sent().is_empty());
        assert_eq!(cursor, 123);
    }

    #[test(tokio::test)]
    async fn unrecognized_status_is_reported_with_the_fallback_text() {
        let source = ScriptedSource::returning(Ok(StatusPage {
            homeworks: vec![homework("hw2", "archived")],
            current_date: None,
        }));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 0;
        service.run_cycle(&mut cursor).await.unwrap();

        let sent = service.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw2"));
        assert!(sent[0].contains("not recognized"));
    }

    #[test(tokio::test)]
    async fn delivery_failure_keeps_the_cursor_for_a_retry() {
        let source = ScriptedSource::returning(Ok(StatusPage {
            homeworks: vec![homework("hw1", "approved")],
            current_date: Some(1000),
        }));
        let service = service(source, RecordingNotifier::failing());

        let mut cursor = 123;
        let result = service.run_cycle(&mut cursor).await;

        assert!(matches!(result, Err(CycleError::Notify(_))));
        assert_eq!(cursor, 123);
    }

    #[test(tokio::test)]
    async fn only_the_first_homework_is_reported() {
        let source = ScriptedSource::returning(Ok(StatusPage {
            homeworks: vec![homework("hw1", "approved"), homework("hw2", "rejected")],
            current_date: Some(1000),
        }));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 0;
        service.run_cycle(&mut cursor).await.unwrap();

        let sent = service.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("hw1"));
    }

    #[test(tokio::test)]
    async fn cursor_stays_put_when_the_server_omits_current_date() {
        let source = ScriptedSource::returning(Ok(StatusPage {
            homeworks: vec![homework("hw1", "reviewing")],
            current_date: None,
        }));
        let service = service(source, RecordingNotifier::default());

        let mut cursor = 123;
        service.run_cycle(&mut cursor).await.unwrap();

        assert_eq!(service.notifier.sent().len(), 1);
        assert_eq!(cursor, 123);
    }
}
