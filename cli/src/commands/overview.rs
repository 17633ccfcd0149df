use anyhow::Result;

use daybook_core::models::HabitDay;
use daybook_core::service::DaybookService;

use super::helpers::parse_date;

const SHADES: [char; 4] = ['·', '░', '▒', '█'];

/// Lay the grid out as 7 rows with one column per week, oldest week first.
fn render_grid(days: &[HabitDay]) -> Vec<String> {
    (0..7)
        .map(|row| {
            days.iter()
                .skip(row)
                .step_by(7)
                .map(|d| SHADES[usize::from(d.level())])
                .collect()
        })
        .collect()
}

pub(crate) async fn cmd_overview(
    svc: &DaybookService,
    date: Option<String>,
    goal: f64,
    json: bool,
) -> Result<()> {
    let date = parse_date(date)?;
    let overview = svc.overview(date).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        println!("Overview for {}\n", overview.date);
        println!("  Books reading:     {}", overview.books_reading);
        println!("  Books completed:   {}", overview.books_completed);
        println!(
            "  Water today:       {:.0} / {goal:.0} ml",
            overview.water_today_ml
        );
        println!(
            "  Habits (7 days):   {}% completed",
            overview.habit_completion_pct
        );
        println!(
            "  Blog drafts:       {} ({} published)",
            overview.blog_drafts, overview.blog_published
        );
        println!("\n  Habit activity (12 weeks)");
        for line in render_grid(&overview.habit_grid) {
            println!("    {line}");
        }
        println!("    less {} more", SHADES.iter().collect::<String>());
    }

    Ok(())
}
