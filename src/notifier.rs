use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

const VISIBLE_FOR: Duration = Duration::from_millis(5000);
const FADE_FOR: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Shown,
    /// Still laid out while the fade-out transition runs.
    Fading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    pub phase: Phase,
    /// Time left before the fade starts; zero once fading. A page rendered
    /// mid-way through only shows the notice for what is left.
    pub remaining: Duration,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    current: Option<Notice>,
    fade_at: Option<Instant>,
}

/// Single status-message slot. A new message pre-empts the current one and
/// restarts its timer; hides scheduled for older messages are ignored.
#[derive(Clone)]
pub struct Notifier {
    slot: Arc<Mutex<Slot>>,
    visible_for: Duration,
    fade_for: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_timings(VISIBLE_FOR, FADE_FOR)
    }

    pub fn with_timings(visible_for: Duration, fade_for: Duration) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::default())),
            visible_for,
            fade_for,
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn notify(&self, message: impl Into<String>, severity: Severity) {
        let message = message.into();
        debug!(?severity, %message, "notification");

        let generation = {
            let mut slot = self.lock();
            slot.generation += 1;
            slot.current = Some(Notice {
                message,
                severity,
                phase: Phase::Shown,
                remaining: self.visible_for,
            });
            slot.fade_at = Some(Instant::now() + self.visible_for);
            slot.generation
        };

        let slot = Arc::clone(&self.slot);
        let (visible_for, fade_for) = (self.visible_for, self.fade_for);
        tokio::spawn(async move {
            tokio::time::sleep(visible_for).await;
            if !Self::advance(&slot, generation, |s| {
                if let Some(notice) = s.current.as_mut() {
                    notice.phase = Phase::Fading;
                }
            }) {
                return;
            }
            tokio::time::sleep(fade_for).await;
            Self::advance(&slot, generation, |s| s.current = None);
        });
    }

    pub fn current(&self) -> Option<Notice> {
        let slot = self.lock();
        let mut notice = slot.current.clone()?;
        notice.remaining = match (notice.phase, slot.fade_at) {
            (Phase::Shown, Some(fade_at)) => fade_at.saturating_duration_since(Instant::now()),
            _ => Duration::ZERO,
        };
        Some(notice)
    }

    /// Applies `step` only if no newer notice replaced `generation`.
    fn advance(slot: &Mutex<Slot>, generation: u64, step: impl FnOnce(&mut Slot)) -> bool {
        let mut slot = slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.generation != generation {
            return false;
        }
        step(&mut slot);
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test(start_paused = true)]
    async fn hides_in_two_phases() {
        let notifier = Notifier::new();
        notifier.notify("Guardado", Severity::Success);
        assert_eq!(notifier.current().unwrap().phase, Phase::Shown);

        sleep(ms(4900)).await;
        assert_eq!(notifier.current().unwrap().phase, Phase::Shown);

        sleep(ms(200)).await;
        assert_eq!(notifier.current().unwrap().phase, Phase::Fading);

        sleep(ms(300)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_message_resets_the_timer() {
        let notifier = Notifier::new();
        notifier.notify("first", Severity::Info);

        sleep(ms(1000)).await;
        notifier.notify("second", Severity::Error);

        // The first message's deadline (5000 ms) and fade (5300 ms) pass.
        sleep(ms(4500)).await;
        let notice = notifier.current().unwrap();
        assert_eq!(notice.message, "second");
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.phase, Phase::Shown);

        // Second message hides on its own schedule (6000 ms, gone at 6300 ms).
        sleep(ms(600)).await;
        assert_eq!(notifier.current().unwrap().phase, Phase::Fading);
        sleep(ms(300)).await;
        assert_eq!(notifier.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_time_counts_down() {
        let notifier = Notifier::new();
        notifier.notify("Guardado", Severity::Success);
        assert_eq!(notifier.current().unwrap().remaining, ms(5000));

        sleep(ms(2000)).await;
        assert_eq!(notifier.current().unwrap().remaining, ms(3000));

        sleep(ms(3100)).await;
        let notice = notifier.current().unwrap();
        assert_eq!(notice.phase, Phase::Fading);
        assert_eq!(notice.remaining, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn replacement_is_immediate() {
        let notifier = Notifier::new();
        notifier.notify("one", Severity::Info);
        notifier.notify("two", Severity::Success);
        assert_eq!(notifier.current().unwrap().message, "two");
    }
}
