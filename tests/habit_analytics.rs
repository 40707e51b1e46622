use chrono::{Duration, NaiveDate};
use organizer::clock::FixedClock;
use organizer::common::input::FieldText;
use organizer::dashboard::widgets::{
    HabitsCommand, WidgetCommand, WidgetConfig, WidgetEnv, WidgetRegistry,
};
use organizer::dashboard::Dashboard;
use organizer::habits::analytics::{
    completion_rate, day_completion_rate, overall_completion_rate, toggle_completion,
    weekly_overview,
};
use organizer::habits::{Frequency, Habit, HabitRecord};
use organizer::storage::MemoryStore;
use serde_json::Value;
use std::sync::Arc;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn habit_json(dash: &Dashboard) -> Value {
    dash.widget("widget-1").unwrap().state()["habits"][0].clone()
}

#[test]
fn toggling_twice_through_the_dashboard() {
    let clock = Arc::new(FixedClock::on(date(2024, 4, 15)));
    let registry = WidgetRegistry::with_defaults(WidgetEnv::offline(clock));
    let mut dash = Dashboard::new(registry, Box::new(MemoryStore::new()));
    dash.add_widget("habits", WidgetConfig::default()).unwrap();
    let add = HabitsCommand::Add {
        title: FieldText::parse("habit", "Read").unwrap(),
        frequency: Frequency::Daily,
    };
    assert!(dash.apply("widget-1", WidgetCommand::Habits(add)));

    assert!(dash.apply("widget-1", WidgetCommand::Habits(HabitsCommand::Toggle(1))));
    let habit = habit_json(&dash);
    assert_eq!(habit["currentStreak"], 1);
    assert_eq!(habit["longestStreak"], 1);
    assert_eq!(habit["completedToday"], true);

    assert!(dash.apply("widget-1", WidgetCommand::Habits(HabitsCommand::Toggle(1))));
    let habit = habit_json(&dash);
    assert_eq!(habit["currentStreak"], 0);
    assert_eq!(habit["longestStreak"], 1);
    assert_eq!(habit["completedToday"], false);
    assert_eq!(habit["history"].as_array().map(Vec::len), Some(2));
}

#[test]
fn streak_follows_the_clock() {
    let clock = Arc::new(FixedClock::on(date(2024, 4, 15)));
    let registry = WidgetRegistry::with_defaults(WidgetEnv::offline(clock.clone()));
    let mut dash = Dashboard::new(registry, Box::new(MemoryStore::new()));
    dash.add_widget("habits", WidgetConfig::default()).unwrap();
    let add = HabitsCommand::Add {
        title: FieldText::parse("habit", "Stretch").unwrap(),
        frequency: Frequency::Daily,
    };
    dash.apply("widget-1", WidgetCommand::Habits(add));

    for _ in 0..3 {
        dash.apply("widget-1", WidgetCommand::Habits(HabitsCommand::Toggle(1)));
        clock.advance_days(1);
    }
    // Today is still open, so yesterday's run counts.
    let habit = habit_json(&dash);
    assert_eq!(habit["currentStreak"], 3);
    assert_eq!(habit["completedToday"], false);

    clock.advance_days(1);
    let habit = habit_json(&dash);
    assert_eq!(habit["currentStreak"], 0);
    assert_eq!(habit["longestStreak"], 3);
}

#[test]
fn toggle_twice_restores_prior_streak() {
    let today = date(2024, 4, 15);
    let history = (1..=4)
        .map(|back| HabitRecord {
            date: today - Duration::days(back),
            completed: true,
        })
        .collect();
    let mut habit = Habit::with_history(1, "Walk", Frequency::Daily, history);
    let before = habit.current_streak(today);
    assert_eq!(before, 4);

    assert!(toggle_completion(&mut habit, today));
    assert_eq!(habit.current_streak(today), 5);
    assert!(!toggle_completion(&mut habit, today));
    assert_eq!(habit.current_streak(today), before);
    assert!(!habit.completed_today(today));
    assert_eq!(habit.longest_streak(), 5);
}

#[test]
fn weekly_habits_count_weeks() {
    // 2024-04-15 is a Monday.
    let today = date(2024, 4, 17);
    let history = [date(2024, 4, 3), date(2024, 4, 12), date(2024, 4, 15)]
        .into_iter()
        .map(|date| HabitRecord {
            date,
            completed: true,
        })
        .collect();
    let habit = Habit::with_history(1, "Long run", Frequency::Weekly, history);
    assert_eq!(habit.current_streak(today), 3);
    assert_eq!(habit.longest_run(), 3);
}

#[test]
fn rates_are_bounded_percentages() {
    let today = date(2024, 4, 15);
    assert_eq!(day_completion_rate(&[], today), 0);
    assert_eq!(overall_completion_rate(&[], today), 0);

    let mut done = Habit::new(1, "Water", Frequency::Daily);
    toggle_completion(&mut done, today);
    let idle = Habit::new(2, "Meditate", Frequency::Daily);
    let habits = vec![done.clone(), idle];

    assert_eq!(day_completion_rate(&habits, today), 50);
    assert_eq!(overall_completion_rate(&habits, today), 50);
    // One completed day over the minimum seven-day window.
    assert_eq!(completion_rate(&done), 14);

    let week = weekly_overview(&habits, today);
    assert_eq!(week.len(), 7);
    assert_eq!(week[6].date, today);
    assert_eq!(week[6].rate, 50);
    assert!(week.iter().all(|d| d.rate <= 100));
    assert!(week[..6].iter().all(|d| d.rate == 0));
}

#[test]
fn completion_rate_uses_tracked_days_beyond_a_week() {
    let start = date(2024, 3, 1);
    let history = (0..10)
        .map(|offset| HabitRecord {
            date: start + Duration::days(offset),
            completed: offset % 2 == 0,
        })
        .collect();
    let habit = Habit::with_history(1, "Journal", Frequency::Daily, history);
    assert_eq!(completion_rate(&habit), 50);
}
