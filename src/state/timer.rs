use tokio::task::JoinHandle;

/// Owned slot for a scheduled background task.
///
/// Scheduling into an occupied slot aborts the previous task first, so at most one task per
/// slot is ever alive. Tasks that may already have woken up before being aborted must still
/// check an epoch of their own before touching game state.
#[derive(Debug, Default)]
pub struct TimerSlot {
    handle: Option<JoinHandle<()>>,
}

impl TimerSlot {
    /// Abort whatever task occupies the slot and store `handle` instead.
    pub fn replace(&mut self, handle: JoinHandle<()>) {
        self.cancel();
        self.handle = Some(handle);
    }

    /// Abort the scheduled task, returning whether one was pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forget the scheduled task without aborting it.
    ///
    /// Called by the task itself once it fired, so later replacements cannot abort it midway.
    pub fn release(&mut self) {
        self.handle.take();
    }

    /// Whether a task is scheduled and still running.
    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for TimerSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use super::*;

    fn counting_task(counter: Arc<AtomicUsize>, after: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn replace_aborts_previous_task() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::default();

        slot.replace(counting_task(fired.clone(), Duration::from_secs(5)));
        slot.replace(counting_task(fired.clone(), Duration::from_secs(5)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::default();

        slot.replace(counting_task(fired.clone(), Duration::from_secs(5)));
        assert!(slot.is_active());
        assert!(slot.cancel());
        assert!(!slot.cancel());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!slot.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn release_keeps_task_running() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut slot = TimerSlot::default();

        slot.replace(counting_task(fired.clone(), Duration::from_secs(1)));
        slot.release();
        slot.replace(counting_task(fired.clone(), Duration::from_secs(1)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 2);
    }
}
