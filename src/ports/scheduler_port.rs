//! Periodic scheduling port.
//!
//! The controller arms one task per `start()`. Implementations must never run
//! two invocations of the same task concurrently, and must guarantee that the
//! task does not fire again once `cancel` has returned.

use std::time::Duration;

pub type TickTask = Box<dyn FnMut() + Send + 'static>;

pub trait SchedulerPort: Send {
    fn schedule(&self, interval: Duration, task: TickTask) -> Box<dyn ScheduledTask>;
}

pub trait ScheduledTask: Send {
    fn cancel(self: Box<Self>);
}
