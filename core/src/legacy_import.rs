use std::collections::HashSet;
use std::io::Read;

use anyhow::{Context, Result, bail};

use crate::models::{DATE_FORMAT, NewLegacyHabitRecord, now_timestamp};
use crate::schema::Namespace;
use crate::store::{Store, TxOp};

/// A single row parsed from a legacy habit-track export.
#[derive(Debug, Clone)]
pub struct LegacyRow {
    pub habit_name: String,
    pub date: String,
    pub completed: bool,
    pub notes: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LegacyImportSummary {
    pub rows_parsed: usize,
    pub records_written: usize,
    pub distinct_habits: usize,
    pub dates_spanned: usize,
}

/// Parse a legacy habit-track CSV export from any reader.
///
/// Expected header: `habitName,date,completed,notes,createdAt`.
/// `notes` and `createdAt` are optional. Dates are normalized to `YYYY-MM-DD`.
pub fn parse_legacy_csv<R: Read>(reader: R) -> Result<Vec<LegacyRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

    let required = ["habitName", "date", "completed"];
    for name in &required {
        if !headers.iter().any(|h| h.eq_ignore_ascii_case(name)) {
            bail!("Missing required column: {name}");
        }
    }

    let col =
        |name: &str| -> Option<usize> { headers.iter().position(|h| h.eq_ignore_ascii_case(name)) };

    let idx_name = col("habitName").context("Missing 'habitName' column")?;
    let idx_date = col("date").context("Missing 'date' column")?;
    let idx_completed = col("completed").context("Missing 'completed' column")?;
    let idx_notes = col("notes");
    let idx_created = col("createdAt");

    let mut rows = Vec::new();

    for (line_num, result) in rdr.records().enumerate() {
        let line = line_num + 2;
        let record = result.with_context(|| format!("Failed to parse CSV row {line}"))?;

        // Habit names are kept verbatim; only the CSV reader's trimming applies.
        let habit_name = record.get(idx_name).unwrap_or("").to_string();
        let date = record.get(idx_date).unwrap_or("").trim().to_string();

        if habit_name.is_empty() && date.is_empty() {
            continue; // skip blank rows
        }
        if habit_name.is_empty() {
            bail!("Row {line}: missing habit name");
        }

        let date = normalize_date(&date).with_context(|| format!("Row {line}"))?;
        let completed = parse_completed(record.get(idx_completed).unwrap_or(""))
            .with_context(|| format!("Row {line}"))?;

        let optional = |idx: Option<usize>| -> Option<String> {
            idx.and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        rows.push(LegacyRow {
            habit_name,
            date,
            completed,
            notes: optional(idx_notes),
            created_at: optional(idx_created),
        });
    }

    Ok(rows)
}

fn parse_completed(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Ok(true),
        "false" | "0" | "no" | "n" | "" => Ok(false),
        other => bail!("Cannot parse completed flag: '{other}'"),
    }
}

/// Normalize a legacy date to `YYYY-MM-DD`.
///
/// Older exports use `YYYY-MM-DD`, `M/D/YYYY`, or `D/M/YYYY`.
fn normalize_date(raw: &str) -> Result<String> {
    if chrono::NaiveDate::parse_from_str(raw, DATE_FORMAT).is_ok() {
        return Ok(raw.to_string());
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%m/%d/%Y") {
        return Ok(d.format(DATE_FORMAT).to_string());
    }
    if let Ok(d) = chrono::NaiveDate::parse_from_str(raw, "%d/%m/%Y") {
        return Ok(d.format(DATE_FORMAT).to_string());
    }
    bail!("Cannot parse date: '{raw}'")
}

/// Write parsed rows into the legacy `habitTracks` namespace as one batch.
///
/// When `dry_run` is true, nothing is written.
pub async fn import_legacy_records<S: Store + ?Sized>(
    store: &S,
    rows: &[LegacyRow],
    dry_run: bool,
) -> Result<LegacyImportSummary> {
    let names: HashSet<&str> = rows.iter().map(|r| r.habit_name.as_str()).collect();
    let dates: HashSet<&str> = rows.iter().map(|r| r.date.as_str()).collect();

    let mut records_written = 0;
    if !dry_run && !rows.is_empty() {
        let imported_at = now_timestamp();
        let ops = rows
            .iter()
            .map(|row| {
                let record = NewLegacyHabitRecord {
                    habit_name: row.habit_name.clone(),
                    date: row.date.clone(),
                    completed: row.completed,
                    notes: row.notes.clone(),
                    created_at: row.created_at.clone().unwrap_or_else(|| imported_at.clone()),
                };
                TxOp::update(Namespace::HabitTracks, store.new_id(), &record)
            })
            .collect::<Result<Vec<_>, _>>()?;
        store
            .transact(ops)
            .await
            .context("Failed to write legacy habit tracks")?;
        records_written = rows.len();
        log::info!("Imported {records_written} legacy habit tracks");
    }

    Ok(LegacyImportSummary {
        rows_parsed: rows.len(),
        records_written,
        distinct_habits: names.len(),
        dates_spanned: dates.len(),
    })
}
