use super::{Habit, HabitRecord};
use crate::common::percentage;
use chrono::{Duration, NaiveDate};

/// Completion rates never divide by fewer days than this.
pub const MIN_RATE_WINDOW: usize = 7;

/// Flip today's status by appending a record. Returns the new status.
pub fn toggle_completion(habit: &mut Habit, today: NaiveDate) -> bool {
    let completed = !habit.completed_today(today);
    habit.append(HabitRecord {
        date: today,
        completed,
    });
    let current = habit.current_streak(today);
    habit.raise_longest(current);
    completed
}

/// Percentage of tracked days that ended completed. Counts distinct dates, not
/// records: toggling one day several times counts once, with its latest record
/// deciding. The window is never shorter than a week.
pub fn completion_rate(habit: &Habit) -> u8 {
    let completed = habit.completed_days().len();
    percentage(completed, habit.tracked_days().max(MIN_RATE_WINDOW))
}

pub fn day_completion_rate(habits: &[Habit], date: NaiveDate) -> u8 {
    let completed = habits.iter().filter(|h| h.completed_on(date)).count();
    percentage(completed, habits.len())
}

pub fn overall_completion_rate(habits: &[Habit], today: NaiveDate) -> u8 {
    let completed = habits.iter().filter(|h| h.completed_today(today)).count();
    percentage(completed, habits.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRate {
    pub date: NaiveDate,
    pub rate: u8,
}

/// The seven days ending at `today`, oldest first.
pub fn weekly_overview(habits: &[Habit], today: NaiveDate) -> Vec<DayRate> {
    (0..7)
        .rev()
        .filter_map(|back| today.checked_sub_signed(Duration::days(back)))
        .map(|date| DayRate {
            date,
            rate: day_completion_rate(habits, date),
        })
        .collect()
}

/// Completed days inside the Monday-based week that contains `day`.
pub fn completions_in_week(habit: &Habit, day: NaiveDate) -> u32 {
    let start = super::Frequency::Weekly.period_start(day);
    let end = start + Duration::days(7);
    habit
        .completed_days()
        .into_iter()
        .filter(|date| *date >= start && *date < end)
        .count() as u32
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HabitSummary {
    pub total: usize,
    pub completed_today: usize,
    pub best_current_streak: u32,
    pub longest_streak: u32,
    pub today_rate: u8,
}

pub fn summarize(habits: &[Habit], today: NaiveDate) -> HabitSummary {
    HabitSummary {
        total: habits.len(),
        completed_today: habits.iter().filter(|h| h.completed_today(today)).count(),
        best_current_streak: habits
            .iter()
            .map(|h| h.current_streak(today))
            .max()
            .unwrap_or(0),
        longest_streak: habits
            .iter()
            .map(|h| h.longest_streak())
            .max()
            .unwrap_or(0),
        today_rate: overall_completion_rate(habits, today),
    }
}
