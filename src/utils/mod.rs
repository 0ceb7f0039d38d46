//! Some utility functions, mostly for debugging

use crate::calendar::iso_date;
use crate::calendar::window::DayCell;
use crate::task::Task;

pub fn print_task(task: &Task) {
    let completion = if task.completed() { "✓" } else { " " };
    let sync = if task.is_pending() { "." } else { "=" };
    let date = task.scheduled_date().map(iso_date).unwrap_or_default();
    println!("    {}{} {}\t{}\t{}", completion, sync, task.title(), date, task.id());
}

/// A debug utility that pretty-prints tasks
pub fn print_task_list(tasks: &[Task]) {
    for task in tasks {
        print_task(task);
    }
}

/// Prints a week (or any run of days), with the count of tasks to do on each day
pub fn print_day_cells(cells: &[DayCell]) {
    for cell in cells {
        let marker = if cell.count > 0 { "•" } else { " " };
        println!("  {} {} {}\t{}", marker, cell.date.format("%a"), iso_date(cell.date), cell.count);
    }
}
