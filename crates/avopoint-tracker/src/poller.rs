/*
[INPUT]:  StatusSource (fetch-status capability), task_id, interval, observation/error callbacks
[OUTPUT]: One callback per fetch until stopped; never a callback after stop() returns
[POS]:    Core layer - status polling episode
[UPDATE]: When changing poll cadence, cancellation, or delivery guarantees
*/

use std::fmt;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use avopoint_adapter::{AvopointClient, AvopointError, TaskStatus};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Anything that can report the status of a task.
#[async_trait]
pub trait StatusSource: Send + Sync + 'static {
    async fn fetch_status(&self, task_id: &str) -> avopoint_adapter::Result<TaskStatus>;
}

#[async_trait]
impl StatusSource for AvopointClient {
    async fn fetch_status(&self, task_id: &str) -> avopoint_adapter::Result<TaskStatus> {
        self.task_status(task_id).await
    }
}

/// Identity of one polling episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeId(Uuid);

impl EpisodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Polls one task on a fixed cadence until stopped.
///
/// The first fetch is issued immediately. A new fetch is only issued after the
/// previous one resolved, so at most one request is outstanding. A transport
/// error is delivered once and ends the episode. Terminal statuses are
/// forwarded like any other observation; stopping on them is up to the caller.
///
/// Callbacks run on the polling task and must not call back into `stop()`.
#[derive(Debug)]
pub struct StatusPoller {
    episode: EpisodeId,
    task_id: String,
    interval: Duration,
    shutdown: CancellationToken,
    active: Arc<StdMutex<bool>>,
    handle: JoinHandle<()>,
}

impl StatusPoller {
    /// Start polling. Must be called from within a tokio runtime.
    pub fn start<S, O, E>(
        source: Arc<S>,
        task_id: impl Into<String>,
        interval: Duration,
        on_observation: O,
        on_transport_error: E,
    ) -> Self
    where
        S: StatusSource + ?Sized,
        O: FnMut(TaskStatus) + Send + 'static,
        E: FnOnce(AvopointError) + Send + 'static,
    {
        Self::start_episode(
            EpisodeId::new(),
            source,
            task_id,
            interval,
            on_observation,
            on_transport_error,
        )
    }

    /// Like `start`, with an episode id chosen by the caller so that callbacks
    /// can tag what they deliver.
    pub fn start_episode<S, O, E>(
        episode: EpisodeId,
        source: Arc<S>,
        task_id: impl Into<String>,
        interval: Duration,
        on_observation: O,
        on_transport_error: E,
    ) -> Self
    where
        S: StatusSource + ?Sized,
        O: FnMut(TaskStatus) + Send + 'static,
        E: FnOnce(AvopointError) + Send + 'static,
    {
        let task_id = task_id.into();
        let shutdown = CancellationToken::new();
        let active = Arc::new(StdMutex::new(true));

        tracing::info!(
            episode = %episode,
            task_id = %task_id,
            interval_ms = interval.as_millis() as u64,
            "status poller started"
        );

        let handle = tokio::spawn(poll_loop(
            source,
            task_id.clone(),
            episode,
            interval,
            shutdown.clone(),
            active.clone(),
            on_observation,
            on_transport_error,
        ));

        Self {
            episode,
            task_id,
            interval,
            shutdown,
            active,
            handle,
        }
    }

    /// Cancel pending and future fetches. Idempotent.
    ///
    /// Once this returns no callback fires, even if a fetch was in flight.
    pub fn stop(&self) {
        let was_active = {
            let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *active, false)
        };
        self.shutdown.cancel();
        self.handle.abort();

        if was_active {
            tracing::info!(
                episode = %self.episode,
                task_id = %self.task_id,
                "status poller stopped"
            );
        }
    }

    /// True until stopped or until the episode ended on a transport error.
    pub fn is_active(&self) -> bool {
        let active = *self.active.lock().unwrap_or_else(PoisonError::into_inner);
        active && !self.handle.is_finished()
    }

    pub fn episode(&self) -> EpisodeId {
        self.episode
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[allow(clippy::too_many_arguments)]
async fn poll_loop<S, O, E>(
    source: Arc<S>,
    task_id: String,
    episode: EpisodeId,
    interval: Duration,
    shutdown: CancellationToken,
    active: Arc<StdMutex<bool>>,
    mut on_observation: O,
    on_transport_error: E,
) where
    S: StatusSource + ?Sized,
    O: FnMut(TaskStatus) + Send + 'static,
    E: FnOnce(AvopointError) + Send + 'static,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempt: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        attempt += 1;
        let result = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            result = source.fetch_status(&task_id) => result,
        };

        match result {
            Ok(status) => {
                tracing::debug!(
                    episode = %episode,
                    task_id = %task_id,
                    attempt,
                    status = %status.status,
                    progress = status.progress,
                    "status observed"
                );
                if !deliver(&active, || on_observation(status)) {
                    break;
                }
            }
            Err(err) => {
                tracing::warn!(
                    episode = %episode,
                    task_id = %task_id,
                    attempt,
                    error = %err,
                    "status poll failed; polling stopped"
                );
                deliver(&active, move || on_transport_error(err));
                break;
            }
        }
    }

    tracing::debug!(episode = %episode, task_id = %task_id, attempt, "status poll loop exited");
}

/// Run `callback` only while the episode is active. `stop()` takes the same
/// lock, so a callback either completes before `stop()` returns or never runs.
fn deliver(active: &StdMutex<bool>, callback: impl FnOnce()) -> bool {
    let guard = active.lock().unwrap_or_else(PoisonError::into_inner);
    if !*guard {
        return false;
    }
    callback();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use avopoint_adapter::StatusKind;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;
    use tokio::time::Instant;

    #[derive(Debug)]
    enum Event {
        Observation(TaskStatus),
        TransportError(String),
    }

    #[derive(Default)]
    struct ScriptedSource {
        script: StdMutex<VecDeque<avopoint_adapter::Result<TaskStatus>>>,
        latency: Duration,
        calls: AtomicUsize,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        started_at: StdMutex<Vec<Instant>>,
    }

    impl ScriptedSource {
        fn with_latency(latency: Duration) -> Self {
            Self {
                latency,
                ..Self::default()
            }
        }

        fn push(&self, result: avopoint_adapter::Result<TaskStatus>) {
            self.script.lock().unwrap().push_back(result);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, task_id: &str) -> avopoint_adapter::Result<TaskStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started_at.lock().unwrap().push(Instant::now());
            let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

            if !self.latency.is_zero() {
                tokio::time::sleep(self.latency).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(status(task_id, StatusKind::Validating, 40)))
        }
    }

    fn status(task_id: &str, kind: StatusKind, progress: i32) -> TaskStatus {
        TaskStatus {
            task_id: task_id.to_string(),
            status: kind,
            progress,
            message: String::new(),
            current_step: Some(kind.as_str().to_string()),
            error: None,
            created_at: None,
            updated_at: None,
        }
    }

    fn start(
        source: Arc<ScriptedSource>,
        interval: Duration,
    ) -> (StatusPoller, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let error_tx = tx.clone();
        let poller = StatusPoller::start(
            source,
            "t1",
            interval,
            move |status| {
                let _ = tx.send(Event::Observation(status));
            },
            move |err| {
                let _ = error_tx.send(Event::TransportError(err.to_string()));
            },
        );
        (poller, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_immediately_then_on_interval() {
        let source = Arc::new(ScriptedSource::default());
        let started = Instant::now();
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);

        for _ in 0..3 {
            assert!(matches!(rx.recv().await, Some(Event::Observation(_))));
        }
        poller.stop();

        let started_at = source.started_at.lock().unwrap().clone();
        assert_eq!(started_at[0], started);
        assert_eq!(started_at[1] - started_at[0], DEFAULT_POLL_INTERVAL);
        assert_eq!(started_at[2] - started_at[1], DEFAULT_POLL_INTERVAL);
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_terminal_observations_without_stopping() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(status("t1", StatusKind::Completed, 100)));
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);

        match rx.recv().await {
            Some(Event::Observation(observed)) => assert_eq!(observed.status, StatusKind::Completed),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(Event::Observation(_))));
        assert!(poller.is_active());
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn never_overlaps_fetches_with_slow_source() {
        let source = Arc::new(ScriptedSource::with_latency(Duration::from_millis(2500)));
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);

        for _ in 0..4 {
            assert!(matches!(rx.recv().await, Some(Event::Observation(_))));
        }
        poller.stop();

        assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
        let started_at = source.started_at.lock().unwrap().clone();
        for pair in started_at.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(2500));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_callbacks() {
        let source = Arc::new(ScriptedSource::default());
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);
        assert!(matches!(rx.recv().await, Some(Event::Observation(_))));

        poller.stop();
        poller.stop();
        assert!(!poller.is_active());

        let calls = source.calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), calls);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn response_in_flight_at_stop_is_discarded() {
        let source = Arc::new(ScriptedSource::with_latency(Duration::from_secs(2)));
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);

        while source.calls() == 0 {
            tokio::task::yield_now().await;
        }
        poller.stop();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_is_reported_once_and_ends_episode() {
        let source = Arc::new(ScriptedSource::default());
        source.push(Ok(status("t1", StatusKind::Uploaded, 5)));
        source.push(Err(AvopointError::InvalidResponse("boom".to_string())));
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);

        assert!(matches!(rx.recv().await, Some(Event::Observation(_))));
        match rx.recv().await {
            Some(Event::TransportError(message)) => assert!(message.contains("boom")),
            other => panic!("unexpected event: {other:?}"),
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), 2);
        assert!(rx.try_recv().is_err());
        assert!(!poller.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_poller_stops_it() {
        let source = Arc::new(ScriptedSource::default());
        let (poller, mut rx) = start(source.clone(), DEFAULT_POLL_INTERVAL);
        assert!(matches!(rx.recv().await, Some(Event::Observation(_))));
        drop(poller);

        let calls = source.calls();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(source.calls(), calls);
    }

    #[test]
    fn deliver_respects_gate() {
        let active = StdMutex::new(true);
        let mut delivered = 0;
        assert!(deliver(&active, || delivered += 1));
        *active.lock().unwrap() = false;
        assert!(!deliver(&active, || delivered += 1));
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn episodes_are_distinct() {
        let source = Arc::new(ScriptedSource::default());
        let (first, _rx1) = start(source.clone(), DEFAULT_POLL_INTERVAL);
        let (second, _rx2) = start(source, DEFAULT_POLL_INTERVAL);
        assert_ne!(first.episode(), second.episode());
        assert_eq!(first.task_id(), "t1");
        assert_eq!(first.interval(), DEFAULT_POLL_INTERVAL);
    }
}
