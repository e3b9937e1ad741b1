/// Events emitted while a search runs.
///
/// A search is a sequence of phases; a phase may contain one counted task
/// (cells to match, reactions to search) and free-form messages.
#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback; without one, events are dropped.
///
/// Reporters are shared across worker threads during a space-wide search, hence the
/// `Send + Sync` bound on the callback.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        if self.callback.is_some() {
            self.report(Progress::Message(text.into()));
        }
    }

    /// Runs `work` between a `PhaseStart` and a `PhaseFinish` event.
    pub fn phase<T>(&self, name: &'static str, work: impl FnOnce() -> T) -> T {
        self.report(Progress::PhaseStart { name });
        let output = work();
        self.report(Progress::PhaseFinish);
        output
    }
}
