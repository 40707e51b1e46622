//! Habit entities and their append-only completion log.
//!
//! Streaks and the "completed today" flag are always derived from the log.
//! Only the longest streak is stored, as a high-water mark.

pub mod analytics;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
}

impl Default for Frequency {
    fn default() -> Self {
        Frequency::Daily
    }
}

impl Frequency {
    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
        }
    }

    /// First day of the period containing `date`. Weeks start on Monday.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Frequency::Daily => date,
            Frequency::Weekly => {
                let offset = date.weekday().num_days_from_monday() as i64;
                date.checked_sub_signed(Duration::days(offset))
                    .unwrap_or(date)
            }
        }
    }

    fn period_days(&self) -> i64 {
        match self {
            Frequency::Daily => 1,
            Frequency::Weekly => 7,
        }
    }
}

/// One toggle event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HabitRecord {
    pub date: NaiveDate,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: u32,
    pub title: String,
    pub frequency: Frequency,
    longest_streak: u32,
    history: Vec<HabitRecord>,
}

impl Habit {
    pub fn new(id: u32, title: impl Into<String>, frequency: Frequency) -> Self {
        Self {
            id,
            title: title.into(),
            frequency,
            longest_streak: 0,
            history: Vec::new(),
        }
    }

    pub fn with_history(
        id: u32,
        title: impl Into<String>,
        frequency: Frequency,
        history: Vec<HabitRecord>,
    ) -> Self {
        let mut habit = Self::new(id, title, frequency);
        habit.history = history;
        habit.longest_streak = habit.longest_run();
        habit
    }

    pub fn history(&self) -> &[HabitRecord] {
        &self.history
    }

    pub fn longest_streak(&self) -> u32 {
        self.longest_streak
    }

    pub(crate) fn append(&mut self, record: HabitRecord) {
        self.history.push(record);
    }

    pub(crate) fn raise_longest(&mut self, streak: u32) {
        self.longest_streak = self.longest_streak.max(streak);
    }

    /// Status of `date` according to the latest record for that date.
    pub fn status_on(&self, date: NaiveDate) -> Option<bool> {
        self.history
            .iter()
            .rev()
            .find(|record| record.date == date)
            .map(|record| record.completed)
    }

    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.status_on(date).unwrap_or(false)
    }

    pub fn completed_today(&self, today: NaiveDate) -> bool {
        self.completed_on(today)
    }

    /// Dates whose latest record is a completion.
    pub fn completed_days(&self) -> BTreeSet<NaiveDate> {
        let mut latest: BTreeMap<NaiveDate, bool> = BTreeMap::new();
        for record in &self.history {
            latest.insert(record.date, record.completed);
        }
        latest
            .into_iter()
            .filter_map(|(date, completed)| completed.then_some(date))
            .collect()
    }

    /// Number of distinct dates that appear in the log.
    pub fn tracked_days(&self) -> usize {
        self.history
            .iter()
            .map(|record| record.date)
            .collect::<BTreeSet<_>>()
            .len()
    }

    fn completed_periods(&self, until: Option<NaiveDate>) -> BTreeSet<NaiveDate> {
        self.completed_days()
            .into_iter()
            .filter(|date| until.map_or(true, |until| *date <= until))
            .map(|date| self.frequency.period_start(date))
            .collect()
    }

    /// Consecutive completed periods ending at the current one, or at the
    /// previous one while the current period is still open.
    pub fn current_streak(&self, today: NaiveDate) -> u32 {
        let periods = self.completed_periods(Some(today));
        let step = Duration::days(self.frequency.period_days());
        let mut cursor = self.frequency.period_start(today);
        if !periods.contains(&cursor) {
            match cursor.checked_sub_signed(step) {
                Some(previous) => cursor = previous,
                None => return 0,
            }
        }
        let mut streak = 0;
        while periods.contains(&cursor) {
            streak += 1;
            match cursor.checked_sub_signed(step) {
                Some(previous) => cursor = previous,
                None => break,
            }
        }
        streak
    }

    /// Longest run of consecutive completed periods anywhere in the log.
    pub fn longest_run(&self) -> u32 {
        let step = self.frequency.period_days();
        let mut best = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;
        for period in self.completed_periods(None) {
            run = match previous {
                Some(prev) if period.signed_duration_since(prev).num_days() == step => run + 1,
                _ => 1,
            };
            best = best.max(run);
            previous = Some(period);
        }
        best
    }

    pub fn snapshot(&self, today: NaiveDate) -> HabitSnapshot {
        let current_streak = self.current_streak(today);
        HabitSnapshot {
            id: self.id,
            title: self.title.clone(),
            frequency: self.frequency,
            current_streak,
            longest_streak: self.longest_streak.max(current_streak),
            completed_today: self.completed_today(today),
            history: self.history.clone(),
        }
    }

    /// Rebuild from persisted form. Cached counters are ignored except the
    /// longest streak, which is only ever raised.
    pub fn from_snapshot(snapshot: HabitSnapshot) -> Self {
        let mut habit = Self::with_history(
            snapshot.id,
            snapshot.title,
            snapshot.frequency,
            snapshot.history,
        );
        habit.raise_longest(snapshot.longest_streak);
        habit
    }
}

/// Persisted habit. `currentStreak` and `completedToday` are written for
/// readers of the blob but recomputed from `history` on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSnapshot {
    pub id: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub completed_today: bool,
    #[serde(default)]
    pub history: Vec<HabitRecord>,
}
