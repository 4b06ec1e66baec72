//! Single-threaded, virtual-time event queue.
//!
//! Everything that moves the rotation forward (the recurring tick, animation
//! completions) is an event on this queue, so all state transitions are
//! serialised. Time only advances when the host pops events or calls
//! [`SchedulerHandle::advance_to`]; tests never depend on the wall clock.

use std::{
    cell::RefCell,
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
    rc::{Rc, Weak},
};

/// Virtual clock in milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackClock {
    pub now_ms: u64,
}

impl PlaybackClock {
    /// Moves forward to `to_ms`. The clock never runs backwards.
    pub fn advance_to(&mut self, to_ms: u64) {
        self.now_ms = self.now_ms.max(to_ms);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// An event that came due, together with the instant it fired at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent<E> {
    pub due_ms: u64,
    pub event: E,
}

#[derive(Debug)]
struct Timer<E> {
    event: E,
    interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Timer(TimerId),
    Posted,
}

#[derive(Debug, PartialEq, Eq)]
struct QueueEntry {
    due_ms: u64,
    seq: u64,
    source: Source,
}

impl Ord for QueueEntry {
    // BinaryHeap is a max-heap; reverse so the earliest (then oldest) entry
    // sits on top.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct Scheduler<E> {
    clock: PlaybackClock,
    queue: BinaryHeap<QueueEntry>,
    timers: HashMap<TimerId, Timer<E>>,
    posted: HashMap<u64, E>,
    next_seq: u64,
    next_timer: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            clock: PlaybackClock::default(),
            queue: BinaryHeap::new(),
            timers: HashMap::new(),
            posted: HashMap::new(),
            next_seq: 0,
            next_timer: 0,
        }
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.clock.now_ms
    }

    pub fn schedule_once(&mut self, delay_ms: u64, event: E) -> TimerId {
        self.add_timer(delay_ms, None, event)
    }

    /// Recurring timer. The first firing happens one interval from now.
    /// A zero interval is treated as 1 ms so the queue always makes progress.
    pub fn schedule_every(&mut self, interval_ms: u64, event: E) -> TimerId {
        let interval_ms = interval_ms.max(1);
        self.add_timer(interval_ms, Some(interval_ms), event)
    }

    /// Queues an event for the current instant, behind anything already due.
    pub fn post(&mut self, event: E) {
        self.post_after(0, event);
    }

    pub fn post_after(&mut self, delay_ms: u64, event: E) {
        let seq = self.bump_seq();
        self.posted.insert(seq, event);
        self.queue.push(QueueEntry {
            due_ms: self.now().saturating_add(delay_ms),
            seq,
            source: Source::Posted,
        });
    }

    /// Returns `true` if the timer was still live.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.timers.remove(&id).is_some()
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    /// Live timers plus posted events still waiting.
    pub fn pending(&self) -> usize {
        self.timers.len() + self.posted.len()
    }

    /// Pops the next event due at or before `until_ms`, moving the clock to
    /// its due time. Cancelled timers are skipped.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<ScheduledEvent<E>> {
        loop {
            let top = self.queue.peek()?;
            if top.due_ms > until_ms {
                return None;
            }
            let entry = self.queue.pop()?;
            self.clock.advance_to(entry.due_ms);

            match entry.source {
                Source::Posted => {
                    if let Some(event) = self.posted.remove(&entry.seq) {
                        return Some(ScheduledEvent {
                            due_ms: entry.due_ms,
                            event,
                        });
                    }
                }
                Source::Timer(id) => {
                    let Some(timer) = self.timers.get(&id) else {
                        continue;
                    };
                    let event = timer.event.clone();
                    let interval = timer.interval_ms;
                    match interval {
                        Some(interval_ms) => {
                            let seq = self.bump_seq();
                            self.queue.push(QueueEntry {
                                due_ms: entry.due_ms.saturating_add(interval_ms),
                                seq,
                                source: Source::Timer(id),
                            });
                        }
                        None => {
                            self.timers.remove(&id);
                        }
                    }
                    return Some(ScheduledEvent {
                        due_ms: entry.due_ms,
                        event,
                    });
                }
            }
        }
    }

    pub fn advance_to(&mut self, to_ms: u64) {
        self.clock.advance_to(to_ms);
    }

    fn add_timer(&mut self, delay_ms: u64, interval_ms: Option<u64>, event: E) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        self.timers.insert(id, Timer { event, interval_ms });
        let seq = self.bump_seq();
        self.queue.push(QueueEntry {
            due_ms: self.now().saturating_add(delay_ms),
            seq,
            source: Source::Timer(id),
        });
        id
    }

    fn bump_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

/// Shared handle to a [`Scheduler`]. Borrows are held only for the duration
/// of each call, so event handlers are free to schedule more work.
#[derive(Debug)]
pub struct SchedulerHandle<E> {
    inner: Rc<RefCell<Scheduler<E>>>,
}

impl<E> Clone for SchedulerHandle<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E: Clone> Default for SchedulerHandle<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> SchedulerHandle<E> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Scheduler::new())),
        }
    }

    pub fn now(&self) -> u64 {
        self.inner.borrow().now()
    }

    pub fn schedule_once(&self, delay_ms: u64, event: E) -> TimerId {
        self.inner.borrow_mut().schedule_once(delay_ms, event)
    }

    /// Recurring timer owned by the returned guard; dropping the guard
    /// cancels it.
    pub fn every(&self, interval_ms: u64, event: E) -> TimerGuard<E> {
        let id = self.inner.borrow_mut().schedule_every(interval_ms, event);
        TimerGuard {
            scheduler: Rc::downgrade(&self.inner),
            id,
            interval_ms: interval_ms.max(1),
        }
    }

    pub fn post(&self, event: E) {
        self.inner.borrow_mut().post(event);
    }

    pub fn post_after(&self, delay_ms: u64, event: E) {
        self.inner.borrow_mut().post_after(delay_ms, event);
    }

    pub fn cancel(&self, id: TimerId) -> bool {
        self.inner.borrow_mut().cancel(id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.borrow().is_active(id)
    }

    pub fn pending(&self) -> usize {
        self.inner.borrow().pending()
    }

    pub fn pop_due(&self, until_ms: u64) -> Option<ScheduledEvent<E>> {
        self.inner.borrow_mut().pop_due(until_ms)
    }

    pub fn advance_to(&self, to_ms: u64) {
        self.inner.borrow_mut().advance_to(to_ms);
    }

    /// Dispatches every event due up to `until_ms`, then parks the clock
    /// there. Events scheduled by `dispatch` are picked up in the same run.
    pub fn run_until(&self, until_ms: u64, mut dispatch: impl FnMut(ScheduledEvent<E>)) {
        loop {
            let next = self.inner.borrow_mut().pop_due(until_ms);
            match next {
                Some(event) => dispatch(event),
                None => break,
            }
        }
        self.advance_to(until_ms);
    }

    pub fn downgrade(&self) -> WeakScheduler<E> {
        WeakScheduler {
            inner: Rc::downgrade(&self.inner),
        }
    }
}

/// Non-owning scheduler reference. Posting through it after the scheduler
/// has been dropped is a no-op.
#[derive(Debug)]
pub struct WeakScheduler<E> {
    inner: Weak<RefCell<Scheduler<E>>>,
}

impl<E> Clone for WeakScheduler<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<E: Clone> WeakScheduler<E> {
    pub fn post_after(&self, delay_ms: u64, event: E) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.borrow_mut().post_after(delay_ms, event);
                true
            }
            None => false,
        }
    }
}

/// Scoped ownership of a recurring timer.
#[derive(Debug)]
pub struct TimerGuard<E> {
    scheduler: Weak<RefCell<Scheduler<E>>>,
    id: TimerId,
    interval_ms: u64,
}

impl<E> TimerGuard<E> {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }
}

impl<E> Drop for TimerGuard<E> {
    fn drop(&mut self) {
        if let Some(inner) = self.scheduler.upgrade() {
            match inner.try_borrow_mut() {
                Ok(mut scheduler) => {
                    scheduler.timers.remove(&self.id);
                }
                Err(_) => {
                    tracing::warn!(timer = ?self.id, "scheduler busy, recurring timer left running");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(handle: &SchedulerHandle<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        handle.run_until(until, |e| fired.push((e.due_ms, e.event)));
        fired
    }

    #[test]
    fn recurring_timer_fires_on_fixed_interval() {
        let handle = SchedulerHandle::new();
        let _guard = handle.every(5_000, "tick");

        let fired = drain(&handle, 16_000);
        assert_eq!(fired, [(5_000, "tick"), (10_000, "tick"), (15_000, "tick")]);
        assert_eq!(handle.now(), 16_000);
    }

    #[test]
    fn dropping_the_guard_cancels_the_timer() {
        let handle = SchedulerHandle::new();
        let guard = handle.every(1_000, "tick");
        assert!(handle.is_active(guard.id()));

        drop(guard);
        assert!(drain(&handle, 10_000).is_empty());
        assert_eq!(handle.pending(), 0);
    }

    #[test]
    fn equal_due_times_fire_in_insertion_order() {
        let handle = SchedulerHandle::new();
        handle.post_after(10, "first");
        handle.schedule_once(10, "second");
        handle.post_after(10, "third");

        let labels: Vec<_> = drain(&handle, 10).into_iter().map(|(_, e)| e).collect();
        assert_eq!(labels, ["first", "second", "third"]);
    }

    #[test]
    fn handlers_may_schedule_follow_up_work() {
        let handle = SchedulerHandle::new();
        handle.post("start");

        let mut fired = Vec::new();
        let inner = handle.clone();
        handle.run_until(100, |e| {
            fired.push((e.due_ms, e.event));
            if e.event == "start" {
                inner.post_after(40, "follow-up");
            }
        });

        assert_eq!(fired, [(0, "start"), (40, "follow-up")]);
    }

    #[test]
    fn weak_post_after_drop_is_a_no_op() {
        let handle: SchedulerHandle<&'static str> = SchedulerHandle::new();
        let weak = handle.downgrade();
        drop(handle);
        assert!(!weak.post_after(0, "late"));
    }

    #[test]
    fn huge_delays_saturate_instead_of_overflowing() {
        let handle = SchedulerHandle::new();
        handle.advance_to(6_000);
        handle.post_after(u64::MAX, "far");
        let id = handle.schedule_once(u64::MAX, "farther");
        let guard = handle.every(u64::MAX, "tick");

        assert!(drain(&handle, 1_000_000).is_empty());
        assert!(handle.is_active(id));
        assert!(handle.is_active(guard.id()));

        drop(guard);
        let fired = drain(&handle, u64::MAX);
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().all(|(due, _)| *due == u64::MAX));
    }

    #[test]
    fn dropping_a_guard_while_the_scheduler_is_borrowed_does_not_panic() {
        let handle = SchedulerHandle::new();
        let guard = handle.every(10, "tick");
        {
            let _busy = handle.inner.borrow();
            drop(guard);
        }
        assert_eq!(drain(&handle, 10), [(10, "tick")]);
    }

    #[test]
    fn one_shot_timer_can_be_cancelled() {
        let handle = SchedulerHandle::new();
        let id = handle.schedule_once(50, "never");
        assert!(handle.cancel(id));
        assert!(!handle.cancel(id));
        assert!(drain(&handle, 100).is_empty());
    }
}
