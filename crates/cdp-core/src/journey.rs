//! Journey playback
//!
//! A journey is a fixed six-step narrative. Only steps 0 and 2 depend on the
//! chosen profile and segment. Steps are revealed one per interval by an owned
//! tokio task:
//! - [`JourneyPlayback`] owns the task and its cancel signal; dropping it cancels
//! - [`JourneyStepper`] tracks at most one playback and cancels it before
//!   starting the next
//! - [`PlaybackObserver`] is a cloneable read-only view of log and status

use crate::segment::matches;
use crate::types::{JourneyRecord, Profile, Segment};
use crate::value::display_string;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Number of steps in every journey
pub const STEP_COUNT: usize = 6;

/// Separator between preview values
pub const PREVIEW_SEPARATOR: &str = " — ";

/// Prefix of each emitted log line
pub const LINE_PREFIX: &str = "• ";

/// The six narrated steps for `profile`, with the segment check at step 2
#[must_use]
pub fn script(profile: &Profile, segment: Option<&Segment>) -> Vec<String> {
    let profile_json = serde_json::to_string(profile).unwrap_or_else(|_| "{}".to_string());
    let segment_step = match segment {
        Some(seg) => format!(
            "Profile matches segment \"{}\"? {}",
            seg.name,
            matches(profile, seg)
        ),
        None => "No segment applied".to_string(),
    };

    vec![
        format!("Started journey for profile: {profile_json}"),
        "Evaluate segments...".to_string(),
        segment_step,
        "Send email (simulated)".to_string(),
        "Wait 2s (simulated)".to_string(),
        "Complete".to_string(),
    ]
}

/// First two profile values joined with [`PREVIEW_SEPARATOR`]
#[must_use]
pub fn preview(profile: &Profile) -> String {
    profile
        .values()
        .take(2)
        .map(|v| match v {
            serde_json::Value::Null => String::new(),
            other => display_string(other),
        })
        .collect::<Vec<_>>()
        .join(PREVIEW_SEPARATOR)
}

/// Record written when a journey starts
#[must_use]
pub fn record(profile: &Profile, started_at: i64) -> JourneyRecord {
    JourneyRecord {
        started_at,
        profile_preview: preview(profile),
    }
}

/// Lifecycle of a playback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    /// Steps still being revealed
    Running,
    /// All steps revealed
    Completed,
    /// Stopped before the last step
    Cancelled,
}

#[derive(Debug)]
struct PlaybackShared {
    log: Mutex<Vec<String>>,
    status: Mutex<PlaybackStatus>,
}

/// Read-only view of a playback
#[derive(Debug, Clone)]
pub struct PlaybackObserver {
    shared: Arc<PlaybackShared>,
}

impl PlaybackObserver {
    /// Lines emitted so far
    #[must_use]
    pub fn log(&self) -> Vec<String> {
        self.shared.log.lock().clone()
    }

    /// Lines emitted after the first `from`
    #[must_use]
    pub fn log_since(&self, from: usize) -> Vec<String> {
        self.shared.log.lock().iter().skip(from).cloned().collect()
    }

    /// Current status
    #[must_use]
    pub fn status(&self) -> PlaybackStatus {
        *self.shared.status.lock()
    }

    /// Check if playback has ended, either way
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status() != PlaybackStatus::Running
    }
}

/// An owned, cancelable playback task
#[derive(Debug)]
pub struct JourneyPlayback {
    observer: PlaybackObserver,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<PlaybackStatus>,
}

impl JourneyPlayback {
    /// Spawn playback of `steps`, one line per `interval`
    ///
    /// The first line appears after one interval. Must be called within a
    /// tokio runtime.
    #[must_use]
    pub fn spawn(steps: Vec<String>, interval: Duration) -> Self {
        let shared = Arc::new(PlaybackShared {
            log: Mutex::new(Vec::with_capacity(steps.len())),
            status: Mutex::new(PlaybackStatus::Running),
        });
        let (cancel, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(run_playback(steps, interval, Arc::clone(&shared), cancel_rx));

        Self {
            observer: PlaybackObserver { shared },
            cancel,
            handle,
        }
    }

    /// Observer sharing this playback's log and status
    #[inline]
    #[must_use]
    pub fn observer(&self) -> PlaybackObserver {
        self.observer.clone()
    }

    /// Signal the task to stop; no further lines are emitted
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// Wait for the task to end and return how it ended
    pub async fn wait(self) -> PlaybackStatus {
        // the sender stays alive until the task ends; dropping it cancels
        let Self {
            observer,
            cancel,
            handle,
        } = self;
        let joined = handle.await;
        drop(cancel);
        match joined {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("journey playback task failed: {e}");
                *observer.shared.status.lock() = PlaybackStatus::Cancelled;
                PlaybackStatus::Cancelled
            }
        }
    }

    /// Cancel and wait for the task to end
    pub async fn stop(self) -> PlaybackStatus {
        self.cancel();
        self.wait().await
    }
}

async fn run_playback(
    steps: Vec<String>,
    interval: Duration,
    shared: Arc<PlaybackShared>,
    mut cancel_rx: watch::Receiver<bool>,
) -> PlaybackStatus {
    let start = tokio::time::Instant::now() + interval;
    let mut ticker = tokio::time::interval_at(start, interval.max(Duration::from_millis(1)));
    let total = steps.len();

    for (i, step) in steps.into_iter().enumerate() {
        if *cancel_rx.borrow() {
            return finish(&shared, PlaybackStatus::Cancelled);
        }
        tokio::select! {
            biased;
            changed = cancel_rx.changed() => {
                // a dropped sender also means the owner is gone
                if changed.is_err() || *cancel_rx.borrow() {
                    tracing::info!(step = i, total, "journey playback cancelled");
                    return finish(&shared, PlaybackStatus::Cancelled);
                }
            }
            _ = ticker.tick() => {}
        }
        if *cancel_rx.borrow() {
            return finish(&shared, PlaybackStatus::Cancelled);
        }

        tracing::debug!(step = i, "{step}");
        shared.log.lock().push(format!("{LINE_PREFIX}{step}"));
    }

    tracing::info!(total, "journey playback completed");
    finish(&shared, PlaybackStatus::Completed)
}

fn finish(shared: &PlaybackShared, status: PlaybackStatus) -> PlaybackStatus {
    *shared.status.lock() = status;
    status
}

/// Tracks the single active playback
#[derive(Debug)]
pub struct JourneyStepper {
    interval: Duration,
    current: Option<JourneyPlayback>,
}

impl JourneyStepper {
    /// Create stepper with the given step interval
    #[inline]
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            current: None,
        }
    }

    /// Step interval
    #[inline]
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start playing `steps`, cancelling any playback already tracked
    pub fn start(&mut self, steps: Vec<String>) -> PlaybackObserver {
        if let Some(previous) = self.current.take() {
            if !previous.observer.is_finished() {
                tracing::info!("cancelling previous journey playback");
            }
            previous.cancel();
        }

        let playback = JourneyPlayback::spawn(steps, self.interval);
        let observer = playback.observer();
        self.current = Some(playback);
        observer
    }

    /// Cancel the tracked playback, returning it so callers may await it
    ///
    /// `None` when nothing was tracked.
    pub fn stop(&mut self) -> Option<JourneyPlayback> {
        let playback = self.current.take()?;
        playback.cancel();
        Some(playback)
    }

    /// Hand over the tracked playback without cancelling it
    pub fn take(&mut self) -> Option<JourneyPlayback> {
        self.current.take()
    }

    /// Observer of the tracked playback
    #[must_use]
    pub fn current(&self) -> Option<PlaybackObserver> {
        self.current.as_ref().map(JourneyPlayback::observer)
    }

    /// Check if a tracked playback is still revealing steps
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|p| !p.observer.is_finished())
    }
}

impl Default for JourneyStepper {
    fn default() -> Self {
        Self::new(Duration::from_millis(crate::config::DEFAULT_STEP_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peter() -> Profile {
        Profile::new()
            .with("CustomerID", "1001")
            .with("email", "peter@example.com")
            .with("firstName", "Peter")
    }

    #[test]
    fn script_without_segment() {
        let steps = script(&peter(), None);
        assert_eq!(steps.len(), STEP_COUNT);
        assert_eq!(
            steps[0],
            r#"Started journey for profile: {"CustomerID":"1001","email":"peter@example.com","firstName":"Peter"}"#
        );
        assert_eq!(steps[1], "Evaluate segments...");
        assert_eq!(steps[2], "No segment applied");
        assert_eq!(steps[5], "Complete");
    }

    #[test]
    fn script_with_segment() {
        let hit = Segment::new("Peters", "firstName", "Peter");
        let miss = Segment::new("Bruces", "firstName", "Bruce");
        assert_eq!(
            script(&peter(), Some(&hit))[2],
            "Profile matches segment \"Peters\"? true"
        );
        assert_eq!(
            script(&peter(), Some(&miss))[2],
            "Profile matches segment \"Bruces\"? false"
        );
    }

    #[test]
    fn preview_takes_first_two_values() {
        assert_eq!(preview(&peter()), "1001 — peter@example.com");
        assert_eq!(preview(&Profile::new().with("n", 5)), "5");
        assert_eq!(preview(&Profile::new()), "");
    }

    #[test]
    fn record_carries_preview() {
        let r = record(&peter(), 99);
        assert_eq!(r.started_at, 99);
        assert_eq!(r.profile_preview, "1001 — peter@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn playback_completes_with_all_lines() {
        let playback = JourneyPlayback::spawn(script(&peter(), None), Duration::from_millis(700));
        let observer = playback.observer();

        assert_eq!(playback.wait().await, PlaybackStatus::Completed);
        let log = observer.log();
        assert_eq!(log.len(), STEP_COUNT);
        assert_eq!(log[1], "• Evaluate segments...");
        assert_eq!(observer.status(), PlaybackStatus::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn first_line_waits_one_interval() {
        let playback = JourneyPlayback::spawn(script(&peter(), None), Duration::from_millis(700));
        let observer = playback.observer();

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert!(observer.log().is_empty());

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(observer.log().len(), 1);
        playback.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_playback() {
        let playback = JourneyPlayback::spawn(script(&peter(), None), Duration::from_millis(700));
        let observer = playback.observer();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(playback.stop().await, PlaybackStatus::Cancelled);
        assert_eq!(observer.log().len(), 2);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(observer.log().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_playback_cancels_task() {
        let playback = JourneyPlayback::spawn(script(&peter(), None), Duration::from_millis(700));
        let observer = playback.observer();
        drop(playback);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(observer.status(), PlaybackStatus::Cancelled);
        assert!(observer.log().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stepper_restart_cancels_previous() {
        let mut stepper = JourneyStepper::new(Duration::from_millis(700));
        let first = stepper.start(script(&peter(), None));

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(first.log().len(), 1);

        let second = stepper.start(script(&Profile::new().with("id", "2"), None));
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(first.status(), PlaybackStatus::Cancelled);
        assert_eq!(first.log().len(), 1);
        assert_eq!(second.status(), PlaybackStatus::Completed);
        assert_eq!(second.log().len(), STEP_COUNT);
    }

    #[tokio::test(start_paused = true)]
    async fn stepper_stop_without_playback() {
        let mut stepper = JourneyStepper::default();
        assert!(stepper.stop().is_none());
        assert!(!stepper.is_running());

        stepper.start(script(&peter(), None));
        assert!(stepper.is_running());
        let stopped = stepper.stop().unwrap();
        assert_eq!(stopped.wait().await, PlaybackStatus::Cancelled);
        assert!(stepper.current().is_none());
    }
}
