use std::path::Path;

use anyhow::{Context, Result};

use daybook_core::legacy_import::parse_legacy_csv;
use daybook_core::service::DaybookService;

pub(crate) async fn cmd_import_legacy(
    svc: &DaybookService,
    path: &Path,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let rows = parse_legacy_csv(file)?;

    if rows.is_empty() {
        if json {
            println!(
                "{}",
                serde_json::json!({ "error": "No rows found in CSV file" })
            );
        } else {
            eprintln!("No rows found in CSV file.");
        }
        return Ok(());
    }

    let summary = svc.import_legacy(&rows, dry_run).await?;

    if json {
        println!(
            "{}",
            serde_json::json!({
                "dry_run": dry_run,
                "rows_parsed": summary.rows_parsed,
                "records_written": summary.records_written,
                "distinct_habits": summary.distinct_habits,
                "dates_spanned": summary.dates_spanned,
            })
        );
    } else {
        if dry_run {
            println!("Dry run, no changes made.\n");
        } else {
            println!("Import complete.\n");
        }
        println!("  Rows parsed:     {}", summary.rows_parsed);
        println!("  Records written: {}", summary.records_written);
        println!("  Habits:          {}", summary.distinct_habits);
        println!("  Dates spanned:   {}", summary.dates_spanned);
        if !dry_run {
            println!("\nRun `daybook migrate habits` to convert them into habits.");
        }
    }

    Ok(())
}
