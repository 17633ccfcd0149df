use anyhow::Result;
use chrono::Local;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use daybook_core::service::DaybookService;

use super::helpers::{parse_date, parse_id, today};

const BAR_WIDTH: usize = 20;

pub(crate) async fn cmd_water_log(
    svc: &DaybookService,
    amount: f64,
    date: Option<String>,
    time: Option<String>,
    goal: f64,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let time = time.unwrap_or_else(|| Local::now().format("%H:%M").to_string());
    let entry = svc.log_water(amount, date, &time).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        let day = svc.water_for_date(date, goal).await?;
        println!(
            "Logged {:.0} ml at {} on {}",
            entry.amount, entry.time, entry.date
        );
        println!(
            "  Total: {:.0} / {:.0} ml ({}%)",
            day.total_ml, day.goal_ml, day.percentage
        );
    }

    Ok(())
}

pub(crate) async fn cmd_water_today(
    svc: &DaybookService,
    date: Option<String>,
    goal: f64,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let day = svc.water_for_date(date, goal).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&day)?);
        return Ok(());
    }

    println!(
        "{}: {:.0} / {:.0} ml  {} {}%",
        day.date,
        day.total_ml,
        day.goal_ml,
        progress_bar(day.percentage),
        day.percentage
    );
    if day.remaining_ml() > 0.0 {
        println!("  {:.0} ml to go", day.remaining_ml());
    }

    if !day.entries.is_empty() {
        #[derive(Tabled)]
        struct EntryRow {
            #[tabled(rename = "ID")]
            id: String,
            #[tabled(rename = "Time")]
            time: String,
            #[tabled(rename = "Amount (ml)")]
            amount: String,
        }

        let rows: Vec<EntryRow> = day
            .entries
            .iter()
            .map(|e| EntryRow {
                id: e.id.to_string(),
                time: e.time.clone(),
                amount: format!("{:.0}", e.amount),
            })
            .collect();

        let table = Table::new(&rows)
            .with(Style::rounded())
            .with(Modify::new(Columns::new(2..3)).with(Alignment::right()))
            .to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) async fn cmd_water_history(
    svc: &DaybookService,
    days: u32,
    goal: f64,
    json: bool,
) -> Result<()> {
    let history = svc.water_history(days, today(), goal).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Total (ml)")]
        total: String,
        #[tabled(rename = "Goal")]
        pct: String,
        #[tabled(rename = "")]
        bar: String,
    }

    let rows: Vec<DayRow> = history
        .iter()
        .map(|d| DayRow {
            date: d.date.clone(),
            total: format!("{:.0}", d.total_ml),
            pct: format!("{}%", d.percentage),
            bar: progress_bar(d.percentage),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..3)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) async fn cmd_water_delete(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    svc.delete_water(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted water entry {id}");
    }

    Ok(())
}

fn progress_bar(percentage: u32) -> String {
    let filled = (percentage.min(100) as usize * BAR_WIDTH) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0), "░".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(100), "█".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(250), "█".repeat(BAR_WIDTH));
        assert_eq!(progress_bar(50).chars().filter(|c| *c == '█').count(), 10);
    }
}
