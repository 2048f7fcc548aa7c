//! Drift-corrected tick timer.
//!
//! Ported from `interval_init`/`interval_wake`/`interval_sleep` in
//! `examples/original_source/src/interval.c`, which samples
//! `CLOCK_MONOTONIC_RAW` and does signed `timespec` subtraction on
//! `wake_time`/`sleep_time`/`sleep_duration_goal`. Those fields can go
//! negative — an OS sleep that overran its request leaves the next goal
//! negative, shortening the following wait — which `Duration` can't
//! represent, so this keeps a fixed `Instant` epoch and does the arithmetic
//! in signed nanoseconds instead, only converting back to a `Duration` at
//! the `thread::sleep` boundary.
//!
//! Only the previous tick's *sleep* overrun is corrected for — the time
//! spent doing the tick's own encode/write work between `wake` and `sleep`
//! is not accounted for. That mirrors the original exactly; see
//! `examples/original_source/src/interval.c`.

use std::thread;
use std::time::{Duration, Instant};

/// A self-correcting periodic timer: each `sleep` shortens or lengthens
/// itself by however much the previous sleep missed its target by, keeping
/// the long-run average period locked to `normal` despite scheduler jitter.
#[derive(Debug)]
pub struct Interval {
    epoch: Instant,
    normal_ns: i64,
    wake_time_ns: i64,
    sleep_time_ns: i64,
    spent_ns: i64,
    goal_ns: i64,
    has_slept: bool,
}

impl Interval {
    pub fn new(period: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            normal_ns: period.as_nanos() as i64,
            wake_time_ns: 0,
            sleep_time_ns: 0,
            spent_ns: 0,
            goal_ns: 0,
            has_slept: false,
        }
    }

    fn now_ns(&self) -> i64 {
        self.epoch.elapsed().as_nanos() as i64
    }

    /// Marks the start of a new tick's work. Call once per iteration, right
    /// before doing the tick's encode/write work.
    pub fn wake(&mut self) {
        self.wake_time_ns = self.now_ns();
        if self.has_slept {
            self.spent_ns = self.wake_time_ns - self.sleep_time_ns;
        } else {
            self.has_slept = true;
        }
    }

    /// Sleeps for whatever remains of this tick's budget given how the
    /// previous sleep over- or under-ran, then carries the new goal forward.
    pub fn sleep(&mut self) {
        self.sleep_time_ns = self.now_ns();

        let sleep_duration_ns = (self.goal_ns - self.spent_ns) + self.normal_ns;
        self.goal_ns = sleep_duration_ns;

        if sleep_duration_ns > 0 {
            thread::sleep(Duration::from_nanos(sleep_duration_ns as u64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sleep_is_roughly_one_period() {
        let period = Duration::from_millis(5);
        let mut interval = Interval::new(period);
        interval.wake();
        let before = Instant::now();
        interval.sleep();
        let elapsed = before.elapsed();
        assert!(elapsed >= Duration::from_millis(4));
        assert!(elapsed <= Duration::from_millis(50));
    }

    #[test]
    fn overrun_sleep_shortens_the_next_one() {
        let mut interval = Interval::new(Duration::from_millis(10));
        interval.wake();
        interval.sleep();

        // Simulate the OS oversleeping well past what was requested.
        thread::sleep(Duration::from_millis(25));
        interval.wake();
        assert!(interval.spent_ns > interval.goal_ns);

        let before = Instant::now();
        interval.sleep();
        let elapsed = before.elapsed();
        // goal went negative, so this sleep should return almost immediately.
        assert!(elapsed < Duration::from_millis(5));
    }

    #[test]
    fn undershoot_does_not_borrow_from_work_time() {
        // wake->sleep work time is never subtracted from the goal, only the
        // previous cycle's sleep duration is. A fast tick shouldn't shrink
        // the very next sleep below roughly one period.
        let mut interval = Interval::new(Duration::from_millis(5));
        interval.wake();
        interval.sleep();
        interval.wake();
        let before = Instant::now();
        interval.sleep();
        let elapsed = before.elapsed();
        assert!(elapsed >= Duration::from_millis(3));
    }
}
