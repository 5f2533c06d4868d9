/// Events emitted while a workflow runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

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

    /// Runs `body` between a `PhaseStart`/`PhaseFinish` pair. The finish event is only sent
    /// when `body` succeeds.
    pub fn phase<T, E>(
        &self,
        name: &'static str,
        body: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let result = body()?;
        self.report(Progress::PhaseFinish);
        Ok(result)
    }

    /// Runs `body` as a task of `total_steps` increments; `body` receives a callback to
    /// report each completed step.
    pub fn task<T, E>(
        &self,
        total_steps: u64,
        body: impl FnOnce(&(dyn Fn() + Sync)) -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::TaskStart { total_steps });
        let result = body(&|| self.report(Progress::TaskIncrement))?;
        self.report(Progress::TaskFinish);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_reporter() -> (ProgressReporter<'static>, Arc<Mutex<Vec<Progress>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));
        (reporter, events)
    }

    #[test]
    fn silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        let value: Result<u8, ()> = reporter.phase("Idle", || Ok(3));
        assert_eq!(value, Ok(3));
    }

    #[test]
    fn phase_and_task_wrap_their_body() {
        let (reporter, events) = recording_reporter();
        let result: Result<(), ()> = reporter.phase("Fitting", || {
            reporter.task(2, |tick| {
                tick();
                tick();
                Ok(())
            })
        });
        assert!(result.is_ok());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                Progress::PhaseStart { name: "Fitting" },
                Progress::TaskStart { total_steps: 2 },
                Progress::TaskIncrement,
                Progress::TaskIncrement,
                Progress::TaskFinish,
                Progress::PhaseFinish,
            ]
        );
    }

    #[test]
    fn failed_phase_does_not_report_finish() {
        let (reporter, events) = recording_reporter();
        let result: Result<(), &str> = reporter.phase("Loading", || Err("boom"));
        assert_eq!(result, Err("boom"));
        assert_eq!(
            *events.lock().unwrap(),
            vec![Progress::PhaseStart { name: "Loading" }]
        );
    }
}
