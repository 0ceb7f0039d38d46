//! Fetches the tasks of the configured user, and prints them along with the current week
//!
//! Usage: `daybook [settings.json]`. The session token is read from `DAYBOOK_TOKEN`.

use std::error::Error;
use std::path::Path;

use daybook::calendar::{self, window::WeekWindow};
use daybook::client::Client;
use daybook::config::Settings;
use daybook::Provider;

const TOKEN_VAR: &str = "DAYBOOK_TOKEN";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::from_file(Path::new(&path))?,
        None => Settings::default(),
    }.with_env_overrides();

    let token = std::env::var(TOKEN_VAR)
        .map_err(|_| format!("{} must be set to a valid session token", TOKEN_VAR))?;
    let client = Client::from_settings(&settings, token)?;
    let provider = Provider::with_settings(client, settings);

    provider.refresh().await?;
    let tasks = provider.list();

    println!("---- Tasks -----");
    daybook::utils::print_task_list(&tasks);

    let today = calendar::today();
    let week = WeekWindow::containing(today);
    println!("---- Week of {} -----", calendar::iso_date(week.start()));
    daybook::utils::print_day_cells(&week.cells(&tasks));

    println!("---- Inbox -----");
    for task in calendar::inbox(&tasks) {
        daybook::utils::print_task(task);
    }
    Ok(())
}
