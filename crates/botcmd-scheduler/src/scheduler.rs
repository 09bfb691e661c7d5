use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::entry::Entry;
use crate::error::SchedulerError;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Entries that already fired at `time`.
///
/// Keeps entries due at the same instant from starving each other: an entry
/// in the list is not picked again for a firing at or before `time`.
struct Blacklist<C> {
    time: Option<DateTime<Utc>>,
    entries: Vec<Arc<Entry<C>>>,
}

impl<C> Blacklist<C> {
    fn new() -> Self {
        Self {
            time: None,
            entries: Vec::new(),
        }
    }

    fn suppresses(&self, when: DateTime<Utc>, entry: &Arc<Entry<C>>) -> bool {
        self.time.is_some_and(|time| when <= time)
            && self.entries.iter().any(|fired| Arc::ptr_eq(fired, entry))
    }

    fn record(&mut self, time: DateTime<Utc>, entry: &Arc<Entry<C>>) {
        if self.time != Some(time) {
            self.time = Some(time);
            self.entries.clear();
        }
        self.entries.push(entry.clone());
    }
}

struct Shared<C> {
    entries: Mutex<Vec<Arc<Entry<C>>>>,
    changed: Notify,
    clock: Arc<dyn Clock>,
}

impl<C> Shared<C> {
    fn earliest(
        &self,
        now: DateTime<Utc>,
        blacklist: Option<&Blacklist<C>>,
    ) -> Option<(DateTime<Utc>, Arc<Entry<C>>)> {
        let entries = lock(&self.entries);
        let mut earliest: Option<(DateTime<Utc>, &Arc<Entry<C>>)> = None;
        for entry in entries.iter() {
            let Some(when) = entry.when_is_next(now) else {
                continue;
            };
            if blacklist.is_some_and(|blacklist| blacklist.suppresses(when, entry)) {
                continue;
            }
            if earliest.map_or(true, |(time, _)| when < time) {
                earliest = Some((when, entry));
            }
        }
        earliest.map(|(time, entry)| (time, entry.clone()))
    }

    /// The next entry to fire, skipping those already serviced at the
    /// blacklisted instant.
    ///
    /// When everything due is blacklisted the search moves past that
    /// instant, so a clock that stands still cannot stall the loop.
    fn next_unserviced(
        &self,
        now: DateTime<Utc>,
        blacklist: &Blacklist<C>,
    ) -> Option<(DateTime<Utc>, Arc<Entry<C>>)> {
        self.earliest(now, Some(blacklist)).or_else(|| {
            let time = blacklist.time?;
            self.earliest(now.max(time + TimeDelta::nanoseconds(1)), None)
        })
    }

    fn update<T>(&self, f: impl FnOnce(&mut Vec<Arc<Entry<C>>>) -> T) -> T {
        let result = f(&mut lock(&self.entries));
        self.changed.notify_one();
        result
    }

    async fn run(self: Arc<Self>) {
        let mut blacklist = Blacklist::new();
        loop {
            let now = self.clock.now();
            let Some((next_time, entry)) = self.next_unserviced(now, &blacklist) else {
                debug!("no pending entries, waiting for changes");
                self.changed.notified().await;
                continue;
            };

            if let Ok(delay) = (next_time - now).to_std() {
                if !delay.is_zero() {
                    info!(%next_time, ?delay, "sleeping before running entry");
                    tokio::select! {
                        () = self.clock.sleep(delay) => {}
                        () = self.changed.notified() => {
                            debug!("entries changed while sleeping");
                        }
                    }
                }
            }

            let now = self.clock.now();
            if now < next_time {
                continue;
            }
            blacklist.record(next_time, &entry);
            entry.activate(now);
            match tokio::spawn(entry.run()).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => warn!(?error, "scheduled callback failed, ignoring"),
                Err(error) if error.is_panic() => error!("scheduled callback panicked, ignoring"),
                Err(_) => {
                    info!("scheduled callback cancelled, stopping");
                    return;
                }
            }
        }
    }
}

/// Runs entry callbacks at their scheduled times on one background task.
///
/// Callbacks run one at a time; a slow callback delays every other entry.
/// Callback errors and panics are logged and otherwise ignored.
pub struct Scheduler<C> {
    shared: Arc<Shared<C>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: Send + Sync + 'static> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync + 'static> Scheduler<C> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                entries: Mutex::new(Vec::new()),
                changed: Notify::new(),
                clock,
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawn the background task. Must be called within a tokio runtime.
    pub fn start(&self) -> Result<(), SchedulerError> {
        let mut task = lock(&self.task);
        if task.is_some() {
            return Err(SchedulerError::AlreadyRunning);
        }
        info!("starting scheduler");
        *task = Some(tokio::spawn(self.shared.clone().run()));
        Ok(())
    }

    /// Cancel the background task. A callback already running is not waited
    /// for.
    pub fn stop(&self) -> Result<(), SchedulerError> {
        let handle = lock(&self.task).take().ok_or(SchedulerError::NotRunning)?;
        info!("stopping scheduler");
        handle.abort();
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        lock(&self.task).is_some()
    }

    pub fn add(&self, entry: Arc<Entry<C>>) {
        info!(schedule = %entry.schedule(), "adding entry");
        self.shared.update(|entries| entries.push(entry));
    }

    /// Remove `entry` by identity. Returns whether it was present.
    pub fn remove(&self, entry: &Arc<Entry<C>>) -> bool {
        info!(schedule = %entry.schedule(), "removing entry");
        self.shared.update(|entries| {
            let before = entries.len();
            entries.retain(|existing| !Arc::ptr_eq(existing, entry));
            entries.len() != before
        })
    }

    /// Read or change the entry list atomically.
    ///
    /// The background task re-evaluates the list afterwards.
    pub fn with_entries<T>(&self, f: impl FnOnce(&mut Vec<Arc<Entry<C>>>) -> T) -> T {
        self.shared.update(f)
    }

    pub fn get_entries(&self) -> Vec<Arc<Entry<C>>> {
        lock(&self.shared.entries).clone()
    }

    /// The entry that fires first at or after `now`, with its firing time.
    pub fn get_earliest(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Arc<Entry<C>>)> {
        self.shared.earliest(now, None)
    }
}

impl<C> Drop for Scheduler<C> {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.task).take() {
            handle.abort();
        }
    }
}
