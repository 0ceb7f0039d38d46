//! Date arithmetic used to lay tasks out in days, weeks and months
//!
//! Every function here is pure, and works on `NaiveDate`s: there is no time of day nor time zone involved,
//! so that the result never depends on when (during the day) it is computed.
//! Weeks start on Sunday.

pub mod window;

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};

use crate::task::Task;

/// Whether [`group_by_date`] should return dates that have no task
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmptyDates {
    /// Omit dates without tasks
    Skip,
    /// Keep every date, e.g. to show an "add a task" button on empty days
    Keep,
}

impl Default for EmptyDates {
    fn default() -> Self {
        EmptyDates::Skip
    }
}

/// The tasks that fall on a given date
#[derive(Clone, Debug, PartialEq)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub tasks: Vec<&'a Task>,
}

/// The current date, in the local time zone
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Formats a date as `YYYY-MM-DD`
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(date)
}

/// The Sunday on or before `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_sunday() as i64;
    add_days(date, -offset)
}

/// The 7 consecutive dates starting at `start`
pub fn week_dates(start: NaiveDate) -> [NaiveDate; 7] {
    let mut dates = [start; 7];
    for (i, date) in dates.iter_mut().enumerate() {
        *date = add_days(start, i as i64);
    }
    dates
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .unwrap_or(date)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month >= 12 { (year + 1, 1) } else { (year, month + 1) };
    match (NaiveDate::from_ymd_opt(year, month, 1), NaiveDate::from_ymd_opt(next_year, next_month, 1)) {
        (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
        _ => 0,
    }
}

/// The day cells of the month that contains `pivot`.
///
/// The first `n` cells are `None`, so that the first day of the month lands on its weekday column (Sunday is column 0).
/// The length of the result is thus `n + days_in_month`.
pub fn month_grid(pivot: NaiveDate) -> Vec<Option<NaiveDate>> {
    let first = first_day_of_month(pivot);
    let leading_blanks = first.weekday().num_days_from_sunday() as usize;
    let n_days = days_in_month(first.year(), first.month());

    let mut grid = vec![None; leading_blanks];
    grid.extend((0..n_days).map(|i| Some(add_days(first, i as i64))));
    grid
}

/// How many tasks are still to be done on each date.
///
/// Completed tasks and tasks without a scheduled date are never counted. Keys display as `YYYY-MM-DD`.
pub fn task_counts_by_date(tasks: &[Task]) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks.iter().filter(|t| t.completed() == false) {
        if let Some(date) = task.scheduled_date() {
            *counts.entry(date).or_insert(0) += 1;
        }
    }
    counts
}

/// The tasks still to be done on each of `dates`, in the order of `dates`
pub fn group_by_date<'a>(tasks: &'a [Task], dates: &[NaiveDate], empty_dates: EmptyDates) -> Vec<DateGroup<'a>> {
    dates.iter()
        .map(|&date| DateGroup { date, tasks: due_on(tasks, date) })
        .filter(|group| empty_dates == EmptyDates::Keep || group.tasks.is_empty() == false)
        .collect()
}

/// Tasks to be done on a given date
pub fn due_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    tasks.iter()
        .filter(|t| t.completed() == false && t.scheduled_date() == Some(date))
        .collect()
}

/// Tasks to be done that have no date
pub fn inbox(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter()
        .filter(|t| t.completed() == false && t.scheduled_date().is_none())
        .collect()
}

/// Tasks to be done strictly after `after`, sorted by date (tasks of the same date keep their relative order)
pub fn upcoming(tasks: &[Task], after: NaiveDate) -> Vec<&Task> {
    let mut result: Vec<&Task> = tasks.iter()
        .filter(|t| t.completed() == false)
        .filter(|t| t.scheduled_date().map(|d| d > after).unwrap_or(false))
        .collect();
    result.sort_by_key(|t| t.scheduled_date());
    result
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Utc, Weekday};
    use crate::task::TaskId;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: &str, scheduled: Option<NaiveDate>, completed: bool) -> Task {
        Task::new_with_parameters(TaskId::from(id), "u-1".into(), id.into(), None, completed, scheduled, Utc::now(), Utc::now())
    }

    #[test]
    fn week_start_of_a_wednesday() {
        // 2024-05-15 is a Wednesday
        assert_eq!(date(2024, 5, 15).weekday(), Weekday::Wed);
        assert_eq!(week_start(date(2024, 5, 15)), date(2024, 5, 12));
        // A Sunday is its own week start
        assert_eq!(week_start(date(2024, 5, 12)), date(2024, 5, 12));
        // Across month and year boundaries
        assert_eq!(week_start(date(2024, 6, 1)), date(2024, 5, 26));
        assert_eq!(week_start(date(2025, 1, 2)), date(2024, 12, 29));
    }

    #[test]
    fn week_start_is_idempotent() {
        let mut day = date(2023, 12, 1);
        for _ in 0..120 {
            let start = week_start(day);
            assert_eq!(week_start(start), start);
            assert_eq!(start.weekday(), Weekday::Sun);

            let dates = week_dates(start);
            assert_eq!(dates.len(), 7);
            assert_eq!(dates[0], start);
            assert!(dates.contains(&day));
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn month_grids() {
        // May 2024 starts on a Wednesday
        let grid = month_grid(date(2024, 5, 20));
        assert_eq!(grid.len(), 3 + 31);
        assert_eq!(&grid[..3], &[None, None, None]);
        assert_eq!(grid[3], Some(date(2024, 5, 1)));
        assert_eq!(grid.last(), Some(&Some(date(2024, 5, 31))));

        // September 2024 starts on a Sunday: no blank
        let grid = month_grid(date(2024, 9, 30));
        assert_eq!(grid.len(), 30);
        assert_eq!(grid[0], Some(date(2024, 9, 1)));

        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2023, 2), 28);
        assert_eq!(days_in_month(2023, 12), 31);
    }

    #[test]
    fn counts_ignore_completed_and_undated_tasks() {
        let tasks = vec![
            task("t-1", Some(date(2024, 5, 15)), false),
            task("t-2", Some(date(2024, 5, 15)), false),
            task("t-3", Some(date(2024, 5, 15)), true),
            task("t-4", Some(date(2024, 5, 16)), true),
            task("t-5", None, false),
        ];
        let counts = task_counts_by_date(&tasks);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get(&date(2024, 5, 15)), Some(&2));
        assert_eq!(iso_date(*counts.keys().next().unwrap()), "2024-05-15");
    }

    #[test]
    fn groups_follow_the_date_order() {
        let tasks = vec![
            task("t-1", Some(date(2024, 5, 14)), false),
            task("t-2", Some(date(2024, 5, 12)), false),
            task("t-3", Some(date(2024, 5, 14)), false),
            task("t-4", Some(date(2024, 5, 13)), true),
        ];
        let dates = week_dates(date(2024, 5, 12));

        let groups = group_by_date(&tasks, &dates, EmptyDates::Skip);
        let summary: Vec<(NaiveDate, Vec<&str>)> = groups.iter()
            .map(|g| (g.date, g.tasks.iter().map(|t| t.title()).collect()))
            .collect();
        assert_eq!(summary, vec![
            (date(2024, 5, 12), vec!["t-2"]),
            (date(2024, 5, 14), vec!["t-1", "t-3"]),
        ]);

        let all = group_by_date(&tasks, &dates, EmptyDates::Keep);
        assert_eq!(all.len(), 7);
        assert!(all[1].tasks.is_empty());
    }

    #[test]
    fn inbox_and_upcoming() {
        let tasks = vec![
            task("later", Some(date(2024, 6, 1)), false),
            task("undated", None, false),
            task("today", Some(date(2024, 5, 15)), false),
            task("sooner", Some(date(2024, 5, 20)), false),
            task("done", None, true),
        ];
        let titles = |list: Vec<&Task>| list.iter().map(|t| t.title().to_string()).collect::<Vec<_>>();

        assert_eq!(titles(inbox(&tasks)), vec!["undated"]);
        assert_eq!(titles(upcoming(&tasks, date(2024, 5, 15))), vec!["sooner", "later"]);
        assert_eq!(titles(due_on(&tasks, date(2024, 5, 15))), vec!["today"]);
    }
}
