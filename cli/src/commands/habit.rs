use anyhow::{Result, bail};
use chrono::Datelike;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use daybook_core::models::{UpdateHabit, format_date};
use daybook_core::service::DaybookService;

use super::helpers::{parse_date, today, truncate};

pub(crate) async fn cmd_habit_add(
    svc: &DaybookService,
    name: &str,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let habit = svc.add_habit(name, description).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&habit)?);
    } else {
        println!("Added habit '{}' ({})", habit.name, habit.id);
    }

    Ok(())
}

pub(crate) async fn cmd_habit_list(svc: &DaybookService, json: bool) -> Result<()> {
    let habits = svc.list_habits().await?;
    let today = today();

    if json {
        let out: Vec<serde_json::Value> = habits
            .iter()
            .map(|h| {
                serde_json::json!({
                    "habit": h,
                    "streak": h.streak(today),
                    "completion_rate": h.completion_rate(today.year(), today.month()),
                    "done_today": h.is_completed_on(&format_date(today)),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if habits.is_empty() {
        eprintln!("No habits yet. Use `daybook habit add` to create one.");
        return Ok(());
    }

    #[derive(Tabled)]
    struct HabitRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Habit")]
        name: String,
        #[tabled(rename = "Today")]
        today: String,
        #[tabled(rename = "Streak")]
        streak: u32,
        #[tabled(rename = "This month")]
        rate: String,
        #[tabled(rename = "Entries")]
        entries: usize,
    }

    let today_str = format_date(today);
    let rows: Vec<HabitRow> = habits
        .iter()
        .map(|h| HabitRow {
            id: h.habit.id.to_string(),
            name: truncate(&h.habit.name, 30),
            today: if h.is_completed_on(&today_str) { "✓" } else { "" }.to_string(),
            streak: h.streak(today),
            rate: h
                .completion_rate(today.year(), today.month())
                .map_or("-".into(), |r| format!("{r}%")),
            entries: h.completions.len(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..6)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    Ok(())
}

pub(crate) async fn cmd_habit_edit(
    svc: &DaybookService,
    habit: &str,
    name: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    if name.is_none() && description.is_none() {
        bail!("Nothing to change. Pass --name and/or --description");
    }
    let existing = svc.find_habit(habit).await?;
    let updated = svc
        .update_habit(existing.habit.id, &UpdateHabit { name, description })
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated habit '{}'", updated.name);
    }

    Ok(())
}

pub(crate) async fn cmd_habit_delete(svc: &DaybookService, habit: &str, json: bool) -> Result<()> {
    let existing = svc.find_habit(habit).await?;
    svc.delete_habit(existing.habit.id).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "deleted": existing.habit.id,
                "completions_deleted": existing.completions.len(),
            })
        );
    } else {
        println!(
            "Deleted habit '{}' and {} completion(s)",
            existing.habit.name,
            existing.completions.len()
        );
    }

    Ok(())
}

/// Toggle a habit's completion for a day.
pub(crate) async fn cmd_habit_done(
    svc: &DaybookService,
    habit: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let existing = svc.find_habit(habit).await?;
    let done = svc.toggle_completion(existing.habit.id, date).await?;
    let streak = svc.habit_streak(existing.habit.id, today()).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "habit": existing.habit.id,
                "date": format_date(date),
                "completed": done,
                "streak": streak,
            })
        );
    } else if done {
        println!(
            "Marked '{}' done for {} (streak: {streak})",
            existing.habit.name,
            format_date(date)
        );
    } else {
        println!(
            "Cleared '{}' for {}",
            existing.habit.name,
            format_date(date)
        );
    }

    Ok(())
}

pub(crate) async fn cmd_habit_log(
    svc: &DaybookService,
    habit: &str,
    date: Option<String>,
    missed: bool,
    notes: Option<String>,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let existing = svc.find_habit(habit).await?;
    let completion = svc
        .add_completion(existing.habit.id, date, !missed, notes)
        .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&completion)?);
    } else {
        let state = if completion.completed { "done" } else { "missed" };
        println!(
            "Logged '{}' as {state} for {}",
            existing.habit.name, completion.date
        );
        if !completion.notes.is_empty() {
            println!("  Notes: {}", completion.notes);
        }
    }

    Ok(())
}
