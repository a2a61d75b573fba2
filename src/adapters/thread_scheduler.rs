//! Background-thread scheduler.
//!
//! Each scheduled task gets one worker thread that waits `interval` between
//! runs. The worker runs the task inline, so invocations never overlap.
//! Cancelling signals the worker and joins it: once `cancel` returns, any
//! in-flight run has finished and no further run will start.

use crate::ports::scheduler_port::{ScheduledTask, SchedulerPort, TickTask};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl SchedulerPort for ThreadScheduler {
    fn schedule(&self, interval: Duration, mut task: TickTask) -> Box<dyn ScheduledTask> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => task(),
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Box::new(ThreadTask {
            stop_tx,
            worker: Some(worker),
        })
    }
}

struct ThreadTask {
    stop_tx: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl ScheduledTask for ThreadTask {
    fn cancel(mut self: Box<Self>) {
        let _ = self.stop_tx.send(());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::warn!("scheduler worker panicked");
            }
        }
    }
}
