//! Navigable week and month windows, such as the ones shown by date pickers and weekly strips

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::task::Task;
use super::{first_day_of_month, month_grid, task_counts_by_date, week_dates, week_start};

/// A date, along with the number of tasks still to be done on it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    pub count: usize,
}

/// Seven days, from a Sunday to the next Saturday.
///
/// Apart from its first day, this does not hold any state: task counts are computed on demand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WeekWindow {
    start: NaiveDate,
}

impl WeekWindow {
    /// The week that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self { start: week_start(date) }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.dates()[6]
    }

    pub fn dates(&self) -> [NaiveDate; 7] {
        week_dates(self.start)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end()
    }

    /// Select a date. If it is outside of this window, the window moves to the week that contains it.
    ///
    /// Returns whether the window has moved
    pub fn select(&mut self, date: NaiveDate) -> bool {
        if self.contains(date) {
            return false;
        }
        log::debug!("{} is not in the week of {}, moving the window", date, self.start);
        *self = Self::containing(date);
        true
    }

    pub fn next(&self) -> Self {
        Self::containing(self.end().succ_opt().unwrap_or(self.start))
    }

    pub fn previous(&self) -> Self {
        Self::containing(self.start.pred_opt().unwrap_or(self.start))
    }

    /// Each day of the week, with its count of tasks to do
    pub fn cells(&self, tasks: &[Task]) -> Vec<DayCell> {
        let counts = task_counts_by_date(tasks);
        self.dates().iter()
            .map(|&date| DayCell { date, count: counts.get(&date).copied().unwrap_or(0) })
            .collect()
    }
}


/// A whole month, laid out as a grid whose columns are weekdays (starting on Sunday)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MonthWindow {
    first: NaiveDate,
}

impl MonthWindow {
    /// The month that contains `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self { first: first_day_of_month(date) }
    }

    pub fn first_day(&self) -> NaiveDate { self.first }
    pub fn year(&self) -> i32 { self.first.year() }
    pub fn month(&self) -> u32 { self.first.month() }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year() && date.month() == self.month()
    }

    pub fn next(&self) -> Self {
        let (year, month) = if self.month() == 12 { (self.year() + 1, 1) } else { (self.year(), self.month() + 1) };
        Self::at(year, month).unwrap_or(*self)
    }

    pub fn previous(&self) -> Self {
        let (year, month) = if self.month() == 1 { (self.year() - 1, 12) } else { (self.year(), self.month() - 1) };
        Self::at(year, month).unwrap_or(*self)
    }

    fn at(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first| Self { first })
    }

    /// See [`month_grid`](super::month_grid)
    pub fn grid(&self) -> Vec<Option<NaiveDate>> {
        month_grid(self.first)
    }

    /// Same layout as [`grid`](Self::grid), with task counts
    pub fn cells(&self, tasks: &[Task]) -> Vec<Option<DayCell>> {
        let counts = task_counts_by_date(tasks);
        self.grid().into_iter()
            .map(|cell| cell.map(|date| DayCell { date, count: counts.get(&date).copied().unwrap_or(0) }))
            .collect()
    }
}
