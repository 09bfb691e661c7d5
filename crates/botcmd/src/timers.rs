//! Commands that run other commands later.
//!
//! `at`, `every`, `until` and `daily` validate the command to schedule right
//! away and keep only its words; when the timer fires the words are parsed
//! and dispatched again, as if typed at that moment. `atq` lists timers and
//! `atrm` removes them by id.

use std::sync::{Arc, Weak};

use anyhow::Context as _;
use botcmd_commands::{Commands, CommandsParser, Function, Invocation};
use botcmd_parser::{
    Adjacent, CaptureOnly, Delayed, Empty, HourMinute, Interval, Keyword, List, OneOfStrings,
    ParseFail, ParseResult, Parser, TimeOrDateTime,
};
use botcmd_scheduler::{round_to_next_second, Entry, Schedule, Scheduler, SchedulerError};
use chrono::{
    DateTime, Local, NaiveDateTime, NaiveTime, Offset, SubsecRound, TimeDelta, TimeZone, Utc,
};
use tracing::{debug, error, info, warn};

use crate::context::{CommandContext, IdCounter, Replies, Settings, Txn};
use crate::control::failure_reply;
use crate::state::{StateError, StateFile, StateStore, TimerInfo, TimerRecord};

const TIMER_COMMANDS: &[&str] = &["at", "every", "until", "daily"];

/// `at` may start a periodic timer later; nothing else nests timers.
const NOT_AFTER_AT: &[&str] = &["at", "daily"];

fn default_until_interval() -> TimeDelta {
    TimeDelta::minutes(10)
}

/// A command line of the main registry, captured as words.
///
/// Commands named in `excluded` are refused.
struct Schedulable {
    commands: CommandsParser<CommandContext>,
    excluded: &'static [&'static str],
}

impl Parser for Schedulable {
    type Output = Vec<String>;

    fn parse(&self, args: &[&str]) -> ParseResult<Vec<String>> {
        if let Some(name) = args.first() {
            if self
                .excluded
                .iter()
                .any(|excluded| excluded.eq_ignore_ascii_case(name))
            {
                return Err(ParseFail::new(format!("Cannot schedule {name} here"), 0));
            }
        }
        CaptureOnly::new(&self.commands).parse(args)
    }
}

fn local_to_utc(time: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&time)
        .earliest()
        .map(|time| time.with_timezone(&Utc))
}

fn format_local(time: DateTime<Utc>) -> String {
    time.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// `1h30m`, `10m`, `45s`.
pub fn format_interval(interval: TimeDelta) -> String {
    let total = interval.num_seconds();
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    let mut text = String::new();
    if hours != 0 {
        text.push_str(&format!("{hours}h"));
    }
    if minutes != 0 {
        text.push_str(&format!("{minutes}m"));
    }
    if seconds != 0 || text.is_empty() {
        text.push_str(&format!("{seconds}s"));
    }
    text
}

/// When a timer fires, as shown to the user.
fn describe(schedule: &Schedule, until: Option<DateTime<Utc>>) -> String {
    match schedule {
        Schedule::OneShot { time } => format!("at {}", format_local(*time)),
        Schedule::Periodic {
            next_time,
            interval,
        } => {
            let mut text = format!(
                "at {}, repeats every {}",
                format_local(*next_time),
                format_interval(*interval)
            );
            if let Some(until) = until {
                text.push_str(&format!(" until {}", format_local(until)));
            }
            text
        }
        Schedule::Daily { time_of_day, .. } => {
            format!("daily at {}", time_of_day.format("%H:%M"))
        }
    }
}

/// The bot's timers and the commands that manage them.
pub struct AppTimers {
    scheduler: Scheduler<TimerInfo>,
    ids: IdCounter,
    commands: Weak<Commands<CommandContext>>,
    settings: Arc<Settings>,
    replies: Replies,
    txns: Arc<IdCounter>,
    store: StateStore,
    this: Weak<AppTimers>,
}

impl AppTimers {
    /// `commands` is the registry scheduled commands are looked up in; it
    /// is usually still being built, see [`Arc::new_cyclic`].
    pub fn new(
        commands: Weak<Commands<CommandContext>>,
        settings: Arc<Settings>,
        replies: Replies,
        txns: Arc<IdCounter>,
        store: StateStore,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            scheduler: Scheduler::new(),
            ids: IdCounter::default(),
            commands,
            settings,
            replies,
            txns,
            store,
            this: this.clone(),
        })
    }

    /// Restore saved timers. One-shot timers that are already past and
    /// periodic timers past their `until` are dropped.
    pub fn load(&self) -> Result<usize, StateError> {
        let state = self.store.load()?;
        let now = Utc::now();
        let mut loaded = 0;
        for record in state.timers {
            let schedule = Schedule::try_from(&record.schedule)?;
            self.ids.skip_past(record.info.id);
            let expired = record.info.until.is_some_and(|until| until < now);
            if expired || schedule.when_is_next(now).is_none() {
                info!(id = record.info.id, "dropping expired timer");
                continue;
            }
            self.scheduler.add(self.entry(record.info, schedule));
            loaded += 1;
        }
        Ok(loaded)
    }

    pub fn start(&self) -> Result<(), SchedulerError> {
        self.scheduler.start()
    }

    pub fn stop(&self) -> Result<(), SchedulerError> {
        self.scheduler.stop()
    }

    /// Timers ordered by id.
    pub fn timers(&self) -> Vec<(TimerInfo, Schedule)> {
        let mut timers: Vec<_> = self
            .scheduler
            .get_entries()
            .iter()
            .map(|entry| (entry.context().clone(), entry.schedule()))
            .collect();
        timers.sort_by_key(|(info, _)| info.id);
        timers
    }

    pub fn ids(&self) -> Vec<u64> {
        self.timers().into_iter().map(|(info, _)| info.id).collect()
    }

    fn snapshot(&self) -> StateFile {
        StateFile {
            timers: self
                .timers()
                .into_iter()
                .map(|(info, schedule)| TimerRecord {
                    info,
                    schedule: (&schedule).into(),
                })
                .collect(),
        }
    }

    fn save(&self) -> Result<(), StateError> {
        self.store.save(&self.snapshot())
    }

    fn entry(&self, info: TimerInfo, schedule: Schedule) -> Arc<Entry<TimerInfo>> {
        let timers = self.this.clone();
        let id = info.id;
        Entry::new(schedule, info, move || {
            let timers = timers.clone();
            async move {
                match timers.upgrade() {
                    Some(timers) => timers.activate(id).await,
                    None => Ok(()),
                }
            }
        })
    }

    /// Schedule `command` and persist. Returns the new timer's id.
    pub fn add(
        &self,
        command: Vec<String>,
        until: Option<DateTime<Utc>>,
        schedule: Schedule,
    ) -> Result<u64, StateError> {
        let id = self.ids.next();
        info!(id, command = %command.join(" "), %schedule, "adding timer");
        self.scheduler.add(self.entry(
            TimerInfo {
                id,
                command,
                until,
            },
            schedule,
        ));
        self.save()?;
        Ok(id)
    }

    /// Remove the timers with the given ids. Returns how many were removed.
    pub fn remove(&self, ids: &[u64]) -> Result<usize, StateError> {
        let removed = self.scheduler.with_entries(|entries| {
            let before = entries.len();
            entries.retain(|entry| !ids.contains(&entry.context().id));
            before - entries.len()
        });
        if removed > 0 {
            info!(?ids, removed, "removed timers");
            self.save()?;
        }
        Ok(removed)
    }

    /// The `atq` listing.
    pub fn list(&self) -> String {
        let timers = self.timers();
        if timers.is_empty() {
            return "No timers set.".to_string();
        }
        let lines: Vec<String> = timers
            .iter()
            .map(|(info, schedule)| {
                format!(
                    "{} {}: {}",
                    info.id,
                    describe(schedule, info.until),
                    info.command_line()
                )
            })
            .collect();
        format!("Timers:\n{}", lines.join("\n"))
    }

    /// Run by the scheduler when timer `id` is due.
    pub(crate) async fn activate(&self, id: u64) -> anyhow::Result<()> {
        let Some(entry) = self
            .scheduler
            .get_entries()
            .into_iter()
            .find(|entry| entry.context().id == id)
        else {
            debug!(id, "timer removed before it fired");
            return Ok(());
        };
        let info = entry.context().clone();
        let now = Utc::now();
        if info.until.is_some_and(|until| now.trunc_subsecs(0) > until) {
            info!(id, "timer is past its until, retiring it");
            self.scheduler.remove(&entry);
            if let Err(error) = self.save() {
                warn!(%error, "failed to save timers");
            }
            return Ok(());
        }
        info!(id, command = %info.command_line(), "timer activated");

        // A no-op when the scheduler already advanced the schedule.
        let mut following = entry.schedule();
        following.activate(now);
        let finished = match following {
            Schedule::OneShot { .. } => true,
            Schedule::Periodic { next_time, .. } => {
                info.until.is_some_and(|until| next_time > until)
            }
            Schedule::Daily { .. } => false,
        };
        if finished {
            self.scheduler.remove(&entry);
        }
        if let Err(error) = self.save() {
            warn!(%error, "failed to save timers");
        }

        let context = CommandContext::new(Txn(self.txns.next()), self.replies.clone());
        if !self.settings.quiet() {
            context.reply(format!("Timer activated: \"{}\"", info.command_line()));
        }
        let commands = self.commands.upgrade().context("command registry is gone")?;
        let Some((name, args)) = info.command.split_first() else {
            return Ok(());
        };
        let invocation = Invocation::new(name.as_str(), args.iter().map(String::as_str));
        if let Err(error) = commands.invoke(context.clone(), &invocation).await {
            error!(id, %error, "scheduled command failed");
            context.reply(failure_reply(context.txn, &error));
        }
        Ok(())
    }

    fn schedulable(&self, excluded: &'static [&'static str]) -> Schedulable {
        Schedulable {
            commands: CommandsParser::new(self.commands.clone()),
            excluded,
        }
    }

    /// Add the timer commands to `commands`.
    pub fn register(self: &Arc<Self>, commands: &mut Commands<CommandContext>) {
        let timers = self.clone();
        commands.register(Function::new(
            "at",
            "Schedule operation: at 06:00 climate on or at 1h30m every 10m info",
            Adjacent::new(TimeOrDateTime::new(), self.schedulable(NOT_AFTER_AT)).remaining(),
            move |context: CommandContext, (time, command): (NaiveDateTime, Vec<String>)| {
                let timers = timers.clone();
                async move {
                    let Some(time) = local_to_utc(time) else {
                        context.reply(format!("No such local time: {time}"));
                        return Ok(());
                    };
                    if time <= Utc::now() {
                        context.reply(format!("Time {} is already past", format_local(time)));
                        return Ok(());
                    }
                    let schedule = Schedule::OneShot { time };
                    let id = timers.add(command.clone(), None, schedule)?;
                    context.reply(format!(
                        "Scheduled \"{}\" at {} (id {id})",
                        command.join(" "),
                        format_local(time)
                    ));
                    anyhow::Ok(())
                }
            },
        ));

        let timers = self.clone();
        commands.register(Function::new(
            "every",
            "Schedule operation: every 10m info",
            Adjacent::new(
                Adjacent::new(
                    Interval,
                    Keyword::new("until", TimeOrDateTime::new()).optional(),
                ),
                self.schedulable(TIMER_COMMANDS),
            )
            .remaining(),
            move |context: CommandContext,
                  ((interval, until), command): (
                (TimeDelta, Option<NaiveDateTime>),
                Vec<String>,
            )| {
                let timers = timers.clone();
                async move {
                    let until = match until {
                        Some(time) => match local_to_utc(time) {
                            Some(until) => Some(until),
                            None => {
                                context.reply(format!("No such local time: {time}"));
                                return Ok(());
                            }
                        },
                        None => None,
                    };
                    let schedule = Schedule::Periodic {
                        next_time: round_to_next_second(Utc::now()),
                        interval,
                    };
                    timers.schedule_periodic(&context, command, until, schedule)
                }
            },
        ));

        let timers = self.clone();
        commands.register(Function::new(
            "until",
            "Schedule operation: until 10:00 info",
            Adjacent::new(
                Adjacent::new(
                    TimeOrDateTime::new(),
                    Keyword::new("every", Interval).optional(),
                ),
                self.schedulable(TIMER_COMMANDS),
            )
            .remaining(),
            move |context: CommandContext,
                  ((until, interval), command): (
                (NaiveDateTime, Option<TimeDelta>),
                Vec<String>,
            )| {
                let timers = timers.clone();
                async move {
                    let Some(until) = local_to_utc(until) else {
                        context.reply(format!("No such local time: {until}"));
                        return Ok(());
                    };
                    let schedule = Schedule::Periodic {
                        next_time: round_to_next_second(Utc::now()),
                        interval: interval.unwrap_or_else(default_until_interval),
                    };
                    timers.schedule_periodic(&context, command, Some(until), schedule)
                }
            },
        ));

        let timers = self.clone();
        commands.register(Function::new(
            "daily",
            "Schedule operation: daily 07:30 climate on",
            Adjacent::new(HourMinute, self.schedulable(TIMER_COMMANDS)).remaining(),
            move |context: CommandContext, (time_of_day, command): (NaiveTime, Vec<String>)| {
                let timers = timers.clone();
                async move {
                    let schedule = Schedule::Daily {
                        time_of_day,
                        offset: Local::now().offset().fix(),
                    };
                    let id = timers.add(command.clone(), None, schedule)?;
                    context.reply(format!(
                        "Scheduled \"{}\" daily at {} (id {id})",
                        command.join(" "),
                        time_of_day.format("%H:%M")
                    ));
                    anyhow::Ok(())
                }
            },
        ));

        let timers = self.clone();
        commands.register(Function::new(
            "atq",
            "List scheduled operations",
            Empty,
            move |context: CommandContext, ()| {
                let listing = timers.list();
                async move {
                    context.reply(listing);
                    anyhow::Ok(())
                }
            },
        ));

        let timers = self.clone();
        let live = Arc::downgrade(self);
        commands.register(Function::new(
            "atrm",
            "Remove scheduled operations by their identifiers",
            List::new(Delayed::new(move || {
                let ids = live.upgrade().map(|timers| timers.ids()).unwrap_or_default();
                OneOfStrings::new(ids.iter().map(u64::to_string))
            }))
            .remaining(),
            move |context: CommandContext, ids: Vec<String>| {
                let timers = timers.clone();
                async move {
                    if ids.is_empty() {
                        context.reply("Usage: atrm <id>...");
                        return Ok(());
                    }
                    let ids: Vec<u64> = ids.iter().filter_map(|id| id.parse().ok()).collect();
                    let reply = match timers.remove(&ids)? {
                        0 => "No timers matched".to_string(),
                        1 => "Removed timer".to_string(),
                        removed => format!("Removed {removed} timers"),
                    };
                    context.reply(reply);
                    anyhow::Ok(())
                }
            },
        ));
    }

    fn schedule_periodic(
        &self,
        context: &CommandContext,
        command: Vec<String>,
        until: Option<DateTime<Utc>>,
        schedule: Schedule,
    ) -> anyhow::Result<()> {
        if let (Some(until), Schedule::Periodic { next_time, .. }) = (until, &schedule) {
            if *next_time > until {
                context.reply(format!("Until time {} is already past", format_local(until)));
                return Ok(());
            }
        }
        let description = describe(&schedule, until);
        let id = self.add(command.clone(), until, schedule)?;
        context.reply(format!(
            "Scheduled \"{}\" {description} (id {id})",
            command.join(" ")
        ));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use botcmd_commands::CommandError;
    use tempfile::TempDir;
    use tokio::sync::mpsc::UnboundedReceiver;

    struct Harness {
        commands: Arc<Commands<CommandContext>>,
        timers: Arc<AppTimers>,
        settings: Arc<Settings>,
        replies: Replies,
        receiver: UnboundedReceiver<String>,
    }

    impl Harness {
        fn new(store: StateStore) -> Self {
            let settings = Arc::new(Settings::default());
            let (replies, receiver) = Replies::channel();
            let txns = Arc::new(IdCounter::default());
            let mut timers = None;
            let commands = Arc::new_cyclic(|registry| {
                let mut commands = Commands::new();
                commands.register(Function::new(
                    "echo",
                    "Reply with the text",
                    botcmd_parser::RestAsStr,
                    |context: CommandContext, text: String| async move {
                        context.reply(text);
                        anyhow::Ok(())
                    },
                ));
                let app_timers = AppTimers::new(
                    registry.clone(),
                    settings.clone(),
                    replies.clone(),
                    txns.clone(),
                    store,
                );
                app_timers.register(&mut commands);
                timers = Some(app_timers);
                commands
            });
            Self {
                commands,
                timers: timers.unwrap(),
                settings,
                replies,
                receiver,
            }
        }

        async fn run(&mut self, line: &str) -> Result<Vec<String>, CommandError> {
            let context = CommandContext::new(Txn(0), self.replies.clone());
            self.commands
                .invoke(context, &Invocation::parse(line).unwrap())
                .await?;
            Ok(self.drain())
        }

        fn drain(&mut self) -> Vec<String> {
            let mut replies = Vec::new();
            while let Ok(reply) = self.receiver.try_recv() {
                replies.push(reply);
            }
            replies
        }
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(TimeDelta::minutes(90)), "1h30m");
        assert_eq!(format_interval(TimeDelta::minutes(10)), "10m");
        assert_eq!(format_interval(TimeDelta::seconds(3605)), "1h5s");
        assert_eq!(format_interval(TimeDelta::zero()), "0s");
    }

    #[tokio::test]
    async fn test_at_schedules_one_shot() {
        let mut harness = Harness::new(StateStore::default());
        let replies = harness.run("at 1h30m echo hello there").await.unwrap();
        assert_eq!(replies.len(), 1);
        assert!(
            replies[0].starts_with("Scheduled \"echo hello there\" at "),
            "{replies:?}"
        );
        assert!(replies[0].ends_with("(id 1)"), "{replies:?}");

        let timers = harness.timers.timers();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].0.command, ["echo", "hello", "there"]);
        assert!(matches!(timers[0].1, Schedule::OneShot { .. }));
    }

    #[tokio::test]
    async fn test_every_with_until() {
        let mut harness = Harness::new(StateStore::default());
        harness.run("every 10m until 2h echo tick").await.unwrap();
        let (info, schedule) = harness.timers.timers().remove(0);
        assert_eq!(info.command, ["echo", "tick"]);
        let until = info.until.unwrap();
        match schedule {
            Schedule::Periodic {
                next_time,
                interval,
            } => {
                assert_eq!(interval, TimeDelta::minutes(10));
                assert!(next_time <= Utc::now() + TimeDelta::seconds(1));
                assert!(next_time < until);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_until_defaults_to_ten_minutes() {
        let mut harness = Harness::new(StateStore::default());
        harness.run("until 1h echo tock").await.unwrap();
        harness.run("until 1h every 5m echo tock").await.unwrap();
        let intervals: Vec<_> = harness
            .timers
            .timers()
            .into_iter()
            .map(|(_, schedule)| match schedule {
                Schedule::Periodic { interval, .. } => interval,
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(intervals, [TimeDelta::minutes(10), TimeDelta::minutes(5)]);
    }

    #[tokio::test]
    async fn test_scheduled_command_is_validated_now() {
        let mut harness = Harness::new(StateStore::default());
        match harness.run("at 10m sing").await {
            Err(CommandError::Parse(error)) => {
                assert_eq!(
                    error.message,
                    "No such command: sing while parsing right argument"
                );
                assert_eq!(error.marked_word(), Some("sing"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(harness.run("every 10m every 5m echo x").await.is_err());
        assert!(harness.timers.timers().is_empty());

        // a timer may start a periodic one later
        harness.run("at 10m every 5m echo x").await.unwrap();
        assert_eq!(harness.timers.timers()[0].0.command[0], "every");
    }

    #[tokio::test]
    async fn test_atq_and_atrm() {
        let mut harness = Harness::new(StateStore::default());
        assert_eq!(harness.run("atq").await.unwrap(), ["No timers set."]);

        harness.run("daily 07:30 echo morning").await.unwrap();
        harness.run("at 2h echo later").await.unwrap();
        let listing = harness.run("atq").await.unwrap().remove(0);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "Timers:");
        assert_eq!(lines[1], "1 daily at 07:30: echo morning");
        assert!(lines[2].starts_with("2 at "), "{listing}");
        assert!(lines[2].ends_with(": echo later"), "{listing}");

        match harness.run("atrm 7").await {
            Err(CommandError::Parse(error)) => assert_eq!(error.marked_word(), Some("7")),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(harness.run("atrm").await.unwrap(), ["Usage: atrm <id>..."]);
        assert_eq!(harness.run("atrm 1").await.unwrap(), ["Removed timer"]);
        assert_eq!(harness.timers.ids(), [2]);
    }

    #[tokio::test]
    async fn test_activation_runs_command_and_retires_one_shot() {
        let mut harness = Harness::new(StateStore::default());
        harness.run("at 1h echo wake up").await.unwrap();
        harness.run("daily 08:00 echo coffee").await.unwrap();

        harness.timers.activate(1).await.unwrap();
        assert_eq!(
            harness.drain(),
            ["Timer activated: \"echo wake up\"", "wake up"]
        );
        assert_eq!(harness.timers.ids(), [2]);

        harness.settings.set_quiet(true);
        harness.timers.activate(2).await.unwrap();
        assert_eq!(harness.drain(), ["coffee"]);
        assert_eq!(harness.timers.ids(), [2]);

        // gone already
        harness.timers.activate(1).await.unwrap();
        assert!(harness.drain().is_empty());
    }

    #[tokio::test]
    async fn test_activation_retires_periodic_past_until() {
        let mut harness = Harness::new(StateStore::default());
        let now = Utc::now();
        harness
            .timers
            .add(
                vec!["echo".into(), "last".into()],
                Some(now + TimeDelta::minutes(5)),
                Schedule::Periodic {
                    next_time: now,
                    interval: TimeDelta::minutes(10),
                },
            )
            .unwrap();
        harness.timers.activate(1).await.unwrap();
        assert_eq!(harness.drain(), ["Timer activated: \"echo last\"", "last"]);
        assert!(harness.timers.ids().is_empty());
    }

    #[tokio::test]
    async fn test_no_firing_after_until() {
        let mut harness = Harness::new(StateStore::default());
        let now = Utc::now();
        harness
            .timers
            .add(
                vec!["echo".into(), "late".into()],
                Some(now - TimeDelta::minutes(10)),
                Schedule::Periodic {
                    next_time: now,
                    interval: TimeDelta::hours(1),
                },
            )
            .unwrap();
        harness.timers.activate(1).await.unwrap();
        assert!(harness.drain().is_empty());
        assert!(harness.timers.ids().is_empty());
    }

    #[tokio::test]
    async fn test_every_fires_before_short_until() {
        let mut harness = Harness::new(StateStore::default());
        harness.timers.start().unwrap();
        harness.run("every 1h until 10m echo soon").await.unwrap();

        let mut fired = Vec::new();
        while fired.len() < 2 {
            let reply = tokio::time::timeout(Duration::from_secs(5), harness.receiver.recv())
                .await
                .unwrap()
                .unwrap();
            fired.push(reply);
        }
        assert_eq!(fired, ["Timer activated: \"echo soon\"", "soon"]);
        // the next hourly firing would be past the until
        assert!(harness.timers.ids().is_empty());
        harness.timers.stop().unwrap();
    }

    #[tokio::test]
    async fn test_past_times_are_refused() {
        let mut harness = Harness::new(StateStore::default());
        let replies = harness.run("at 2020-01-01 00:00 echo x").await.unwrap();
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("Time 2020-01-01 "), "{replies:?}");
        assert!(replies[0].ends_with(" is already past"), "{replies:?}");

        let replies = harness
            .run("every 10m until 2020-01-01 00:00 echo x")
            .await
            .unwrap();
        assert!(replies[0].starts_with("Until time 2020-01-01 "), "{replies:?}");
        assert!(harness.timers.timers().is_empty());
    }

    #[tokio::test]
    async fn test_timers_survive_restart() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(Some(dir.path().join("timers.json")));

        let mut first = Harness::new(store.clone());
        first.run("daily 06:00 echo one").await.unwrap();
        first.run("every 1h echo two").await.unwrap();
        first.run("at 3h echo three").await.unwrap();
        first.run("atrm 2").await.unwrap();

        let mut second = Harness::new(store);
        assert_eq!(second.timers.load().unwrap(), 2);
        assert_eq!(second.timers.timers(), first.timers.timers());
        second.run("at 1h echo four").await.unwrap();
        assert_eq!(second.timers.ids(), [1, 3, 4]);
    }

    #[tokio::test]
    async fn test_load_drops_periodic_past_until() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(Some(dir.path().join("timers.json")));
        let now = Utc::now();
        let first = Harness::new(store.clone());
        first
            .timers
            .add(
                vec!["echo".into(), "stale".into()],
                Some(now - TimeDelta::hours(1)),
                Schedule::Periodic {
                    next_time: now - TimeDelta::hours(2),
                    interval: TimeDelta::minutes(10),
                },
            )
            .unwrap();

        let second = Harness::new(store);
        assert_eq!(second.timers.load().unwrap(), 0);
        assert!(second.timers.ids().is_empty());
    }
}
