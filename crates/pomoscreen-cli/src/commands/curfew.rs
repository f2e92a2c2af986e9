use chrono::{Local, NaiveDateTime, NaiveTime};
use clap::Subcommand;
use pomoscreen_core::storage::parse_clock_time;
use pomoscreen_core::{is_within_curfew, schedule_countdown_warnings, Config};
use serde_json::json;

#[derive(Subcommand)]
pub enum CurfewAction {
    /// Print whether the curfew is active and the upcoming warnings
    Status {
        /// Evaluate at this local time today instead of now (HH:MM)
        #[arg(long)]
        at: Option<String>,
    },
}

fn evaluation_time(at: Option<&str>) -> Result<NaiveDateTime, Box<dyn std::error::Error>> {
    let now = Local::now().naive_local();
    let Some(at) = at else {
        return Ok(now);
    };
    let (hour, minute) = parse_clock_time(at)?;
    let time = NaiveTime::from_hms_opt(hour.into(), minute.into(), 0)
        .ok_or_else(|| format!("'{at}' is not a time of day"))?;
    Ok(now.date().and_time(time))
}

pub fn run(action: CurfewAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        CurfewAction::Status { at } => {
            let settings = Config::load()?.to_settings()?;
            let window = settings.curfew;
            let now = evaluation_time(at.as_deref())?;

            let status = json!({
                "at": now,
                "within_curfew": is_within_curfew(now, &window),
                "window": window,
                "effective": window.is_effective(),
                "next_start": window.next_start(now),
                "warnings": schedule_countdown_warnings(now, &window),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}
