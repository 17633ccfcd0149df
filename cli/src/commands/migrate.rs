use anyhow::{Result, bail};

use daybook_core::habit_migration::{MigrationIssue, MigrationOutcome, SkipReason};
use daybook_core::service::DaybookService;

fn issue_messages(issues: &[MigrationIssue]) -> Vec<String> {
    issues.iter().map(ToString::to_string).collect()
}

fn print_issues(issues: &[MigrationIssue]) {
    if issues.is_empty() {
        return;
    }
    println!("\n  Issues ({}):", issues.len());
    for issue in issues {
        println!("    - {issue}");
    }
}

pub(crate) async fn cmd_migrate_habits(svc: &DaybookService, json: bool) -> Result<()> {
    let outcome = svc.migrate_habits().await?;

    match &outcome {
        MigrationOutcome::Skipped(reason) => {
            let message = match reason {
                SkipReason::NoLegacyRecords => "No legacy habit tracks to migrate.".to_string(),
                SkipReason::HabitsExist { count } => {
                    format!("Already migrated: {count} habit(s) exist.")
                }
            };
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "skipped": true, "reason": message })
                );
            } else {
                println!("{message}");
            }
        }
        MigrationOutcome::Completed(report) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({
                        "skipped": false,
                        "legacy_records": report.legacy_records,
                        "habits_created": report.habits_created,
                        "completions_created": report.completions_created,
                        "issues": issue_messages(&report.issues),
                    }))?
                );
            } else {
                println!("Migration complete.\n");
                println!("  Legacy records:      {}", report.legacy_records);
                println!("  Habits created:      {}", report.habits_created);
                println!("  Completions created: {}", report.completions_created);
                print_issues(&report.issues);
                println!(
                    "\nLegacy records were kept. Check the result, then run \
                     `daybook migrate cleanup-legacy --yes` to delete them."
                );
            }
        }
    }

    Ok(())
}

pub(crate) async fn cmd_migrate_cleanup(svc: &DaybookService, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("This permanently deletes all legacy habit tracks. Re-run with --yes to confirm");
    }

    let report = svc.cleanup_legacy_habits().await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "legacy_records": report.legacy_records,
                "deleted": report.deleted,
                "issues": issue_messages(&report.issues),
            }))?
        );
    } else if report.legacy_records == 0 {
        println!("No legacy habit tracks to delete.");
    } else {
        println!(
            "Deleted {} of {} legacy habit track(s).",
            report.deleted, report.legacy_records
        );
        print_issues(&report.issues);
    }

    Ok(())
}
