use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, FixedOffset, NaiveTime, SubsecRound, TimeDelta, TimeZone, Utc};

use crate::clock::BoxFuture;

/// When an entry fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Once, at `time`.
    OneShot { time: DateTime<Utc> },
    /// At `next_time` and then every `interval`.
    Periodic {
        next_time: DateTime<Utc>,
        interval: TimeDelta,
    },
    /// Every day at a wall-clock time in the given offset.
    Daily {
        time_of_day: NaiveTime,
        offset: FixedOffset,
    },
}

impl Schedule {
    /// The next firing at or after `now`, or `None` if there is none.
    ///
    /// A periodic schedule reports its `next_time` even when that is already
    /// in the past; the scheduler fires it and [`activate`](Self::activate)
    /// moves it forward.
    pub fn when_is_next(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::OneShot { time } => (*time > now).then_some(*time),
            Schedule::Periodic { next_time, .. } => Some(*next_time),
            Schedule::Daily {
                time_of_day,
                offset,
            } => {
                let local = now.with_timezone(offset);
                let mut date = local.date_naive();
                if local.time() > *time_of_day {
                    date = date.succ_opt()?;
                }
                offset
                    .from_local_datetime(&date.and_time(*time_of_day))
                    .single()
                    .map(|time| time.with_timezone(&Utc))
            }
        }
    }

    /// Update the schedule for a firing at `now`.
    ///
    /// A periodic schedule that has fallen more than half an interval behind
    /// restarts one interval from now, on a whole second, instead of
    /// catching up on every missed firing.
    pub fn activate(&mut self, now: DateTime<Utc>) {
        let Schedule::Periodic {
            next_time,
            interval,
        } = self
        else {
            return;
        };
        if *interval <= TimeDelta::zero() {
            return;
        }
        if *next_time <= now - *interval / 2 {
            *next_time = round_to_next_second(now + *interval);
        } else {
            while *next_time <= now {
                *next_time += *interval;
            }
        }
    }
}

/// The next whole second strictly after `time`.
pub fn round_to_next_second(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(0) + TimeDelta::seconds(1)
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::OneShot { time } => write!(f, "once at {time}"),
            Schedule::Periodic {
                next_time,
                interval,
            } => write!(f, "every {interval} from {next_time}"),
            Schedule::Daily {
                time_of_day,
                offset,
            } => write!(f, "daily at {time_of_day} {offset}"),
        }
    }
}

pub type Callback = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// A scheduled callback with caller-defined context.
///
/// Entries are compared by identity: removing an entry removes that
/// particular `Arc`, not other entries with equal content.
pub struct Entry<C> {
    schedule: Mutex<Schedule>,
    callback: Callback,
    context: C,
}

impl<C> Entry<C> {
    pub fn new<F, Fut>(schedule: Schedule, context: C, callback: F) -> Arc<Self>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Arc::new(Self {
            schedule: Mutex::new(schedule),
            callback: Arc::new(move || -> BoxFuture<'static, anyhow::Result<()>> {
                Box::pin(callback())
            }),
            context,
        })
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    /// A snapshot of the current schedule.
    pub fn schedule(&self) -> Schedule {
        self.lock_schedule().clone()
    }

    pub fn when_is_next(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.lock_schedule().when_is_next(now)
    }

    pub(crate) fn activate(&self, now: DateTime<Utc>) {
        self.lock_schedule().activate(now);
    }

    pub(crate) fn run(&self) -> BoxFuture<'static, anyhow::Result<()>> {
        (self.callback)()
    }

    fn lock_schedule(&self) -> MutexGuard<'_, Schedule> {
        self.schedule.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: fmt::Debug> fmt::Debug for Entry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("schedule", &self.schedule())
            .field("context", &self.context)
            .finish()
    }
}
