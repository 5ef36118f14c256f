use chrono::{Local, NaiveDate};
use clap::Args;
use serde::Serialize;
use studytimer_core::storage::daily::date_key;
use studytimer_core::{Config, DailyRecord, DailyStore};

#[derive(Args)]
pub struct StatsArgs {
    /// Day to report (YYYY-MM-DD); defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
    /// Every recorded day
    #[arg(long, conflicts_with = "date")]
    all: bool,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DayReport {
    date: String,
    #[serde(flatten)]
    record: DailyRecord,
}

pub fn run(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = DailyStore::new(config.data_file()?);

    let reports: Vec<DayReport> = if args.all {
        store
            .load_all()?
            .into_iter()
            .map(|(date, record)| DayReport { date, record })
            .collect()
    } else {
        let date = args.date.unwrap_or_else(|| Local::now().date_naive());
        let record = store.try_load(date)?.unwrap_or_default();
        vec![DayReport {
            date: date_key(date),
            record,
        }]
    };

    if args.json {
        let json = if args.all {
            serde_json::to_string_pretty(&reports)?
        } else {
            serde_json::to_string_pretty(&reports[0])?
        };
        println!("{json}");
        return Ok(());
    }

    for report in &reports {
        println!(
            "{}  sessions {:.2}  study {:.1} min",
            report.date, report.record.completed_sessions, report.record.total_study_minutes
        );
    }
    Ok(())
}
