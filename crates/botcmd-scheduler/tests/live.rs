//! The scheduler loop driven by a clock that jumps forward instead of sleeping.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use botcmd_scheduler::{BoxFuture, Clock, Entry, Schedule, Scheduler};
use chrono::{DateTime, FixedOffset, NaiveTime, TimeDelta, Utc};
use tokio::sync::{mpsc, Notify};

const HOUR: i64 = 3600;

struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    fn at(seconds: i64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(at(seconds)),
        })
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            *self.now.lock().unwrap() += TimeDelta::from_std(duration).unwrap();
            tokio::task::yield_now().await;
        })
    }
}

/// A clock whose sleeps only finish when the test opens the gate.
struct GatedClock {
    now: Mutex<DateTime<Utc>>,
    gate: Notify,
}

impl GatedClock {
    fn at(seconds: i64) -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(at(seconds)),
            gate: Notify::new(),
        })
    }

    /// Let the sleep in progress finish.
    fn open(&self) {
        self.gate.notify_one();
    }
}

impl Clock for GatedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            self.gate.notified().await;
            *self.now.lock().unwrap() += TimeDelta::from_std(duration).unwrap();
        })
    }
}

/// Give the scheduler task time to reach its next wait.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

fn at(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap()
}

type Activations = mpsc::UnboundedSender<(i64, &'static str)>;

fn recording_entry<K: Clock>(
    schedule: Schedule,
    clock: &Arc<K>,
    label: &'static str,
    activations: &Activations,
) -> Arc<Entry<&'static str>> {
    let clock = clock.clone();
    let activations = activations.clone();
    Entry::new(schedule, label, move || {
        let activation = (clock.now().timestamp(), label);
        let activations = activations.clone();
        async move {
            let _ = activations.send(activation);
            anyhow::Ok(())
        }
    })
}

fn daily_utc(hour: u32) -> Schedule {
    Schedule::Daily {
        time_of_day: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
        offset: FixedOffset::east_opt(0).unwrap(),
    }
}

async fn collect(
    receiver: &mut mpsc::UnboundedReceiver<(i64, &'static str)>,
    count: usize,
) -> Vec<(i64, &'static str)> {
    let mut activations = Vec::new();
    while activations.len() < count {
        activations.push(receiver.recv().await.unwrap());
    }
    activations
}

#[tokio::test]
async fn test_add_live() {
    let clock = FakeClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    scheduler.start().unwrap();

    tokio::task::yield_now().await;
    scheduler.add(recording_entry(daily_utc(1), &clock, "first", &sender));
    scheduler.add(recording_entry(daily_utc(2), &clock, "second", &sender));

    let activations = collect(&mut receiver, 4).await;
    scheduler.stop().unwrap();
    assert_eq!(
        activations,
        vec![
            (HOUR, "first"),
            (2 * HOUR, "second"),
            (25 * HOUR, "first"),
            (26 * HOUR, "second"),
        ]
    );
}

#[tokio::test]
async fn test_same_instant_round_robin() {
    let clock = FakeClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    scheduler.add(recording_entry(daily_utc(1), &clock, "a", &sender));
    scheduler.add(recording_entry(daily_utc(1), &clock, "b", &sender));
    scheduler.start().unwrap();

    let activations = collect(&mut receiver, 4).await;
    scheduler.stop().unwrap();
    assert_eq!(
        activations,
        vec![(HOUR, "a"), (HOUR, "b"), (25 * HOUR, "a"), (25 * HOUR, "b")]
    );
}

#[tokio::test]
async fn test_periodic_and_one_shot() {
    let clock = FakeClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    let periodic = Schedule::Periodic {
        next_time: at(60),
        interval: TimeDelta::seconds(60),
    };
    scheduler.add(recording_entry(periodic, &clock, "tick", &sender));
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(90) },
        &clock,
        "once",
        &sender,
    ));
    scheduler.start().unwrap();

    let activations = collect(&mut receiver, 4).await;
    scheduler.stop().unwrap();
    assert_eq!(
        activations,
        vec![(60, "tick"), (90, "once"), (120, "tick"), (180, "tick")]
    );
}

fn explode() -> anyhow::Result<()> {
    panic!("timer panicked")
}

#[tokio::test]
async fn test_failing_callback_does_not_stop_scheduler() {
    let clock = FakeClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    scheduler.add(Entry::new(
        Schedule::OneShot { time: at(10) },
        "broken",
        || async { Err::<(), _>(anyhow::anyhow!("broken timer")) },
    ));
    scheduler.add(Entry::new(
        Schedule::OneShot { time: at(20) },
        "panics",
        || async { explode() },
    ));
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(30) },
        &clock,
        "ok",
        &sender,
    ));
    scheduler.start().unwrap();

    assert_eq!(collect(&mut receiver, 1).await, vec![(30, "ok")]);
    scheduler.stop().unwrap();
}

#[tokio::test]
async fn test_remove_before_due() {
    let clock = FakeClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    let removed = recording_entry(Schedule::OneShot { time: at(10) }, &clock, "removed", &sender);
    scheduler.add(removed.clone());
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(20) },
        &clock,
        "kept",
        &sender,
    ));
    assert!(scheduler.remove(&removed));
    scheduler.start().unwrap();

    assert_eq!(collect(&mut receiver, 1).await, vec![(20, "kept")]);
    scheduler.stop().unwrap();
}

#[tokio::test]
async fn test_add_interrupts_sleep() {
    let clock = GatedClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(1000) },
        &clock,
        "late",
        &sender,
    ));
    scheduler.start().unwrap();
    settle().await;

    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(10) },
        &clock,
        "early",
        &sender,
    ));
    settle().await;
    clock.open();

    assert_eq!(collect(&mut receiver, 1).await, vec![(10, "early")]);
    scheduler.stop().unwrap();
}

#[tokio::test]
async fn test_remove_interrupts_sleep() {
    let clock = GatedClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    let doomed = recording_entry(Schedule::OneShot { time: at(100) }, &clock, "doomed", &sender);
    scheduler.add(doomed.clone());
    scheduler.start().unwrap();
    settle().await;

    assert!(scheduler.remove(&doomed));
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(200) },
        &clock,
        "kept",
        &sender,
    ));
    settle().await;
    clock.open();

    assert_eq!(collect(&mut receiver, 1).await, vec![(200, "kept")]);
    scheduler.stop().unwrap();
}

#[tokio::test]
async fn test_with_entries_interrupts_sleep() {
    let clock = GatedClock::at(0);
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let scheduler = Scheduler::with_clock(clock.clone());
    scheduler.add(recording_entry(
        Schedule::OneShot { time: at(100) },
        &clock,
        "replaced",
        &sender,
    ));
    scheduler.start().unwrap();
    settle().await;

    let replacement = recording_entry(Schedule::OneShot { time: at(50) }, &clock, "new", &sender);
    scheduler.with_entries(|entries| {
        entries.clear();
        entries.push(replacement);
    });
    settle().await;
    clock.open();

    assert_eq!(collect(&mut receiver, 1).await, vec![(50, "new")]);
    scheduler.stop().unwrap();
}
