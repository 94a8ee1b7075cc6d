//! Background drain of the retry queue.

use super::engine::SyncEngine;
use crossbeam_channel::{unbounded, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) enum SchedulerCommand {
    /// A toggle was queued.
    Wake,
    /// Drain immediately.
    RetryNow,
    Shutdown,
}

/// Worker thread that calls [`SyncEngine::retry_now`] one retry period
/// after the queue becomes non-empty, and again every period while it stays
/// non-empty. Stops when dropped.
pub struct RetryScheduler {
    commands: Sender<SchedulerCommand>,
    worker: Option<JoinHandle<()>>,
    engine: Arc<SyncEngine>,
}

impl RetryScheduler {
    pub(crate) fn start(engine: Arc<SyncEngine>) -> std::io::Result<Self> {
        let (commands, inbox) = unbounded();
        let period = engine.config().retry_period;
        let worker_engine = Arc::clone(&engine);

        let worker = thread::Builder::new()
            .name("habit-retry".into())
            .spawn(move || {
                let engine = worker_engine;
                let mut deadline: Option<Instant> = None;

                loop {
                    if deadline.is_none() && engine.has_pending() {
                        deadline = Some(Instant::now() + period);
                    }

                    let command = match deadline {
                        Some(at) => match inbox.recv_deadline(at) {
                            Ok(command) => Some(command),
                            Err(RecvTimeoutError::Timeout) => None,
                            Err(RecvTimeoutError::Disconnected) => break,
                        },
                        None => match inbox.recv() {
                            Ok(command) => Some(command),
                            Err(_) => break,
                        },
                    };

                    match command {
                        None | Some(SchedulerCommand::RetryNow) => {
                            let report = engine.retry_now();
                            debug!(attempted = report.attempted(), "scheduled retry");
                            deadline = None;
                        }
                        // An armed deadline is never pushed back.
                        Some(SchedulerCommand::Wake) => {}
                        Some(SchedulerCommand::Shutdown) => break,
                    }
                }
                debug!("retry scheduler stopped");
            })?;

        engine.set_waker(Some(commands.clone()));
        Ok(Self {
            commands,
            worker: Some(worker),
            engine,
        })
    }

    /// Ask the worker to drain the queue now instead of at the next tick.
    pub fn retry_now(&self) {
        let _ = self.commands.send(SchedulerCommand::RetryNow);
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.engine.set_waker(None);
        let _ = self.commands.send(SchedulerCommand::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("retry scheduler panicked");
            }
        }
    }
}
