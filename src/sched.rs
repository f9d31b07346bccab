//! Cooperative scheduling primitives
//!
//! The browser drives everything from `requestAnimationFrame`. Engines own
//! their per-frame loops as [`FrameTask`]s and their deferred UI transitions
//! as entries in a [`TimerQueue`]; the driver keeps requesting frames only
//! while some task is running or some timer is pending.

use std::cell::Cell;
use std::rc::Rc;

/// A per-frame loop with a stop handle. Once stopped it never restarts.
#[derive(Debug, Clone)]
pub struct FrameTask {
    running: Rc<Cell<bool>>,
    name: &'static str,
}

impl FrameTask {
    pub fn start(name: &'static str) -> Self {
        log::debug!("Frame task '{}' started", name);
        Self {
            running: Rc::new(Cell::new(true)),
            name,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Stop scheduling further frames. Idempotent.
    pub fn stop(&self) {
        if self.running.replace(false) {
            log::debug!("Frame task '{}' stopped", self.name);
        }
    }
}

struct Timer<A> {
    deadline: f64,
    seq: u64,
    action: A,
}

/// Deadline-ordered deferred actions, advanced by an external clock (ms)
pub struct TimerQueue<A> {
    now: f64,
    next_seq: u64,
    pending: Vec<Timer<A>>,
}

impl<A> Default for TimerQueue<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerQueue<A> {
    pub fn new() -> Self {
        Self {
            now: 0.0,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Current clock as last seen by the queue
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Run `action` `delay_ms` after the current clock
    pub fn schedule(&mut self, delay_ms: f64, action: A) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Timer {
            deadline: self.now + delay_ms.max(0.0),
            seq,
            action,
        });
    }

    /// Pop the earliest action due at or before `until`.
    ///
    /// The clock moves to the popped deadline, so actions scheduled while
    /// handling it are relative to when it fired. When nothing is due the
    /// clock moves to `until`.
    pub fn pop_due(&mut self, until: f64) -> Option<A> {
        let next = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= until)
            .min_by(|(_, a), (_, b)| {
                a.deadline
                    .total_cmp(&b.deadline)
                    .then_with(|| a.seq.cmp(&b.seq))
            })
            .map(|(i, _)| i);

        match next {
            Some(i) => {
                let timer = self.pending.swap_remove(i);
                self.now = self.now.max(timer.deadline);
                Some(timer.action)
            }
            None => {
                self.now = self.now.max(until);
                None
            }
        }
    }

    /// Drop every pending action matching `pred`
    pub fn cancel(&mut self, pred: impl Fn(&A) -> bool) {
        self.pending.retain(|t| !pred(&t.action));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_task_stops_once() {
        let task = FrameTask::start("test");
        let handle = task.clone();
        assert!(handle.is_running());
        task.stop();
        task.stop();
        assert!(!handle.is_running());
    }

    #[test]
    fn test_timers_fire_in_deadline_order() {
        let mut q = TimerQueue::new();
        q.schedule(300.0, "c");
        q.schedule(100.0, "a");
        q.schedule(100.0, "b");

        assert_eq!(q.pop_due(50.0), None);
        assert_eq!(q.now(), 50.0);
        assert_eq!(q.pop_due(400.0), Some("a"));
        assert_eq!(q.pop_due(400.0), Some("b"));
        assert_eq!(q.pop_due(400.0), Some("c"));
        assert_eq!(q.pop_due(400.0), None);
        assert!(q.is_empty());
    }

    #[test]
    fn test_chained_timer_is_relative_to_fire_time() {
        let mut q = TimerQueue::new();
        q.schedule(100.0, 1);
        assert_eq!(q.pop_due(1000.0), Some(1));
        assert_eq!(q.now(), 100.0);
        q.schedule(100.0, 2);
        assert_eq!(q.pop_due(1000.0), Some(2));
        assert_eq!(q.now(), 200.0);
    }

    #[test]
    fn test_cancel() {
        let mut q = TimerQueue::new();
        q.schedule(10.0, 1);
        q.schedule(10.0, 2);
        q.cancel(|a| *a == 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop_due(10.0), Some(2));
    }
}
