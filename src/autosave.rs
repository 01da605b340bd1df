use tokio::task::JoinHandle;

/// Externally visible state of the save slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    Scheduled,
    Running,
    RunningQueued,
}

/// What a caller has to do after asking the queue to save.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveAction {
    /// run a batch now, then call `finish`
    Start,
    /// a batch is in flight, it will reschedule when done
    Queue,
    /// a row is being edited, retried on blur
    Defer,
    /// a newer timer replaced this one
    Ignore,
}

/// Single-slot save queue: at most one debounce timer and at most one batch
/// in flight per page.
#[derive(Debug, Default)]
pub struct SaveQueue {
    running: bool,
    queued: bool,
    deferred: bool,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl SaveQueue {
    pub fn phase(&self) -> SavePhase {
        match (self.running, self.queued) {
            (true, true) => SavePhase::RunningQueued,
            (true, false) => SavePhase::Running,
            _ if self.timer.is_some() => SavePhase::Scheduled,
            _ => SavePhase::Idle,
        }
    }

    /// Generation for a new timer. Call `arm` with the spawned timer while
    /// still holding the queue.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Replaces the live timer, cancelling the previous one.
    pub fn arm(&mut self, timer: JoinHandle<()>) {
        if let Some(old) = self.timer.replace(timer) {
            old.abort();
        }
    }

    pub fn cancel_timer(&mut self) {
        if let Some(old) = self.timer.take() {
            old.abort();
        }
    }

    pub fn on_timer(&mut self, generation: u64, editing: bool) -> SaveAction {
        if generation != self.generation {
            return SaveAction::Ignore;
        }
        self.timer = None;

        if editing {
            self.deferred = true;
            return SaveAction::Defer;
        }
        self.start_now()
    }

    /// Explicit save request, bypassing the debounce timer.
    pub fn start_now(&mut self) -> SaveAction {
        if self.running {
            self.queued = true;
            return SaveAction::Queue;
        }
        self.running = true;
        self.deferred = false;
        SaveAction::Start
    }

    /// Row lost focus. True if a save was held back for it.
    pub fn on_blur(&mut self) -> bool {
        std::mem::take(&mut self.deferred)
    }

    /// Batch done. True if another save was requested meanwhile.
    pub fn finish(&mut self) -> bool {
        self.running = false;
        std::mem::take(&mut self.queued)
    }
}
