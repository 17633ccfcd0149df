use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::schema::Namespace;
use crate::store::{Entity, EntityId};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const DEFAULT_WATER_GOAL_ML: f64 = 2500.0;

/// Current time as an ISO-8601 UTC timestamp with millisecond precision.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// --- Legacy habit tracks ---

/// Pre-migration record that combines a habit name with one day's event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyHabitRecord {
    pub id: EntityId,
    pub habit_name: String,
    pub date: String,
    /// Absent on some old records; those read as not completed.
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLegacyHabitRecord {
    pub habit_name: String,
    pub date: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
}

// --- Habits ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabit {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabit {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitCompletion {
    pub id: EntityId,
    pub date: String,
    pub completed: bool,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub created_at: Option<String>,
    /// Filled from the `habit` link, not stored as an attribute.
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<EntityId>,
}

impl HabitCompletion {
    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let mut completion: HabitCompletion = entity.decode()?;
        completion.habit_id = entity.linked("habit").first().copied();
        Ok(completion)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHabitCompletion {
    pub date: String,
    pub completed: bool,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitWithCompletions {
    #[serde(flatten)]
    pub habit: Habit,
    pub completions: Vec<HabitCompletion>,
}

impl HabitWithCompletions {
    #[must_use]
    pub fn is_completed_on(&self, date: &str) -> bool {
        self.completions
            .iter()
            .any(|c| c.completed && c.date == date)
    }

    /// Consecutive days, ending today, that have a completed entry.
    #[must_use]
    pub fn streak(&self, today: NaiveDate) -> u32 {
        let mut streak = 0;
        let mut day = today;
        while self.is_completed_on(&format_date(day)) {
            streak += 1;
            match day.pred_opt() {
                Some(prev) => day = prev,
                None => break,
            }
        }
        streak
    }

    /// Percentage of this month's entries that are completed, or `None` without entries.
    #[must_use]
    pub fn completion_rate(&self, year: i32, month: u32) -> Option<u32> {
        let in_month: Vec<&HabitCompletion> = self
            .completions
            .iter()
            .filter(|c| {
                NaiveDate::parse_from_str(&c.date, DATE_FORMAT)
                    .is_ok_and(|d| d.year() == year && d.month() == month)
            })
            .collect();
        if in_month.is_empty() {
            return None;
        }
        let done = in_month.iter().filter(|c| c.completed).count();
        Some(percentage(done, in_month.len()))
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
fn percentage(part: usize, whole: usize) -> u32 {
    ((part as f64 / whole as f64) * 100.0).round() as u32
}

pub fn validate_habit_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("Habit name must not be empty");
    }
    Ok(trimmed.to_string())
}

// --- Water intake ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterIntake {
    pub id: EntityId,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWaterIntake {
    pub amount: f64,
    pub date: String,
    pub time: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterDay {
    pub date: String,
    pub total_ml: f64,
    pub goal_ml: f64,
    /// Share of the goal reached, capped at 100.
    pub percentage: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<WaterIntake>,
}

impl WaterDay {
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn new(date: String, entries: Vec<WaterIntake>, goal_ml: f64) -> Self {
        let total_ml: f64 = entries.iter().map(|e| e.amount).sum();
        let percentage = if goal_ml > 0.0 {
            ((total_ml / goal_ml) * 100.0).round().clamp(0.0, 100.0) as u32
        } else {
            100
        };
        Self {
            date,
            total_ml,
            goal_ml,
            percentage,
            entries,
        }
    }

    #[must_use]
    pub fn remaining_ml(&self) -> f64 {
        (self.goal_ml - self.total_ml).max(0.0)
    }
}

pub fn validate_water_amount(amount_ml: f64) -> Result<f64> {
    if !amount_ml.is_finite() || amount_ml <= 0.0 {
        bail!("Water amount must be greater than 0 ml");
    }
    Ok(amount_ml)
}

pub fn validate_time(time: &str) -> Result<String> {
    match NaiveTime::parse_from_str(time, "%H:%M") {
        Ok(t) => Ok(t.format("%H:%M").to_string()),
        Err(_) => bail!("Invalid time '{time}'. Use HH:MM"),
    }
}

// --- Books ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookStatus {
    #[default]
    ToRead,
    InProgress,
    Completed,
}

impl BookStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BookStatus::ToRead => "to-read",
            BookStatus::InProgress => "in-progress",
            BookStatus::Completed => "completed",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            BookStatus::ToRead => "To Read",
            BookStatus::InProgress => "Reading",
            BookStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "to-read" | "toread" | "todo" => Ok(BookStatus::ToRead),
            "in-progress" | "reading" | "started" => Ok(BookStatus::InProgress),
            "completed" | "done" | "finished" => Ok(BookStatus::Completed),
            _ => bail!("Invalid book status '{s}'. Must be one of: to-read, in-progress, completed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub status: BookStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub status: BookStatus,
    pub notes: String,
    pub cover_url: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BookStatusChange {
    pub status: BookStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
}

impl BookStatusChange {
    pub(crate) fn at(status: BookStatus, timestamp: &str) -> Self {
        Self {
            status,
            start_date: (status == BookStatus::InProgress).then(|| timestamp.to_string()),
            finish_date: (status == BookStatus::Completed).then(|| timestamp.to_string()),
        }
    }
}

/// One reading-progress entry, linked to its book.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookProgress {
    pub id: EntityId,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub created_at: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub book_id: Option<EntityId>,
}

impl BookProgress {
    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let mut progress: BookProgress = entity.decode()?;
        progress.book_id = entity.linked("book").first().copied();
        Ok(progress)
    }
}

// --- Blog posts ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlogPostStatus {
    #[default]
    Draft,
    Published,
}

impl BlogPostStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BlogPostStatus::Draft => "draft",
            BlogPostStatus::Published => "published",
        }
    }
}

impl fmt::Display for BlogPostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BlogPostStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "draft" => Ok(BlogPostStatus::Draft),
            "published" | "publish" => Ok(BlogPostStatus::Published),
            _ => bail!("Invalid post status '{s}'. Must be one of: draft, published"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: BlogPostStatus,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_img_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_edited: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlogPost {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub status: BlogPostStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_img_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BlogPostStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_img_url: Option<String>,
}

/// Split a comma-separated tag list, dropping blanks.
#[must_use]
pub fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn validate_title(title: &str) -> Result<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        bail!("Title must not be empty");
    }
    Ok(trimmed.to_string())
}

// --- Projects ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HeaderBackground {
    Gradient { from: String, to: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_background: Option<HeaderBackground>,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub is_public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_img: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_background: Option<HeaderBackground>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_img: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_background: Option<HeaderBackground>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectNote {
    pub id: EntityId,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub attachment_urls: Vec<String>,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub comment_count: u64,
    #[serde(default)]
    pub retweet_count: u64,
    #[serde(default)]
    pub created_at: String,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<EntityId>,
}

impl ProjectNote {
    pub fn from_entity(entity: &Entity) -> Result<Self> {
        let mut note: ProjectNote = entity.decode()?;
        note.project_id = entity.linked("project").first().copied();
        Ok(note)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProjectNote {
    pub content: String,
    pub attachment_urls: Vec<String>,
    pub is_pinned: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectNote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_urls: Option<Vec<String>>,
}

/// A project with its notes split into pinned and unpinned, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFeed {
    #[serde(flatten)]
    pub project: Project,
    pub pinned: Vec<ProjectNote>,
    pub notes: Vec<ProjectNote>,
}

impl ProjectFeed {
    #[must_use]
    pub fn new(project: Project, mut notes: Vec<ProjectNote>) -> Self {
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let (pinned, notes) = notes.into_iter().partition(|n| n.is_pinned);
        Self {
            project,
            pinned,
            notes,
        }
    }

    #[must_use]
    pub fn note_count(&self) -> usize {
        self.pinned.len() + self.notes.len()
    }
}

// --- Overview ---

#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub date: String,
    pub books_reading: usize,
    pub books_completed: usize,
    pub water_today_ml: f64,
    /// Completed share of habit entries over the last 7 days.
    pub habit_completion_pct: u32,
    pub blog_drafts: usize,
    pub blog_published: usize,
    /// Completed habit entries per day over the last 84 days, oldest first.
    pub habit_grid: Vec<HabitDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitDay {
    pub date: String,
    pub completed: usize,
}

impl HabitDay {
    /// Shade bucket for the contribution grid: 0 for none, up to 3 for three or more.
    #[must_use]
    pub fn level(&self) -> u8 {
        match self.completed {
            0 => 0,
            1 => 1,
            2 => 2,
            _ => 3,
        }
    }
}

pub(crate) fn habit_grid(completions: &[HabitCompletion], days: Vec<String>) -> Vec<HabitDay> {
    days.into_iter()
        .map(|date| {
            let completed = completions
                .iter()
                .filter(|c| c.completed && c.date == date)
                .count();
            HabitDay { date, completed }
        })
        .collect()
}

pub(crate) fn habit_completion_pct(completions: &[HabitCompletion], days: &[String]) -> u32 {
    let in_window: Vec<&HabitCompletion> = completions
        .iter()
        .filter(|c| days.contains(&c.date))
        .collect();
    if in_window.is_empty() {
        return 0;
    }
    let done = in_window.iter().filter(|c| c.completed).count();
    percentage(done, in_window.len())
}

// --- Export ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub version: i64,
    pub exported_at: String,
    pub namespaces: BTreeMap<Namespace, Vec<Entity>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(date: &str, completed: bool) -> HabitCompletion {
        HabitCompletion {
            id: EntityId::new(),
            date: date.to_string(),
            completed,
            notes: String::new(),
            created_at: None,
            habit_id: None,
        }
    }

    fn habit_with(completions: Vec<HabitCompletion>) -> HabitWithCompletions {
        HabitWithCompletions {
            habit: Habit {
                id: EntityId::new(),
                name: "Meditate".to_string(),
                description: None,
                created_at: String::new(),
            },
            completions,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_streak_counts_back_from_today() {
        let habit = habit_with(vec![
            completion("2024-03-10", true),
            completion("2024-03-09", true),
            completion("2024-03-08", true),
            completion("2024-03-06", true),
        ]);
        assert_eq!(habit.streak(day("2024-03-10")), 3);
    }

    #[test]
    fn test_streak_zero_without_today() {
        let habit = habit_with(vec![completion("2024-03-09", true)]);
        assert_eq!(habit.streak(day("2024-03-10")), 0);
    }

    #[test]
    fn test_streak_ignores_uncompleted_entries() {
        let habit = habit_with(vec![
            completion("2024-03-10", true),
            completion("2024-03-09", false),
        ]);
        assert_eq!(habit.streak(day("2024-03-10")), 1);
    }

    #[test]
    fn test_completion_rate_for_month() {
        let habit = habit_with(vec![
            completion("2024-03-01", true),
            completion("2024-03-02", false),
            completion("2024-03-03", true),
            completion("2024-02-28", false),
        ]);
        assert_eq!(habit.completion_rate(2024, 3), Some(67));
        assert_eq!(habit.completion_rate(2024, 2), Some(0));
        assert_eq!(habit.completion_rate(2024, 4), None);
    }

    #[test]
    fn test_water_day_caps_percentage() {
        let entry = |amount| WaterIntake {
            id: EntityId::new(),
            amount,
            date: "2024-03-01".to_string(),
            time: "08:00".to_string(),
            created_at: String::new(),
        };
        let day = WaterDay::new("2024-03-01".to_string(), vec![entry(2000.0), entry(1000.0)], 2500.0);
        assert!((day.total_ml - 3000.0).abs() < f64::EPSILON);
        assert_eq!(day.percentage, 100);
        assert!(day.remaining_ml().abs() < f64::EPSILON);

        let half = WaterDay::new("2024-03-02".to_string(), vec![entry(1250.0)], 2500.0);
        assert_eq!(half.percentage, 50);
        assert!((half.remaining_ml() - 1250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_book_status_parse_and_serialize() {
        assert_eq!("reading".parse::<BookStatus>().unwrap(), BookStatus::InProgress);
        assert_eq!("Completed".parse::<BookStatus>().unwrap(), BookStatus::Completed);
        assert!("shelved".parse::<BookStatus>().is_err());
        assert_eq!(
            serde_json::to_string(&BookStatus::ToRead).unwrap(),
            "\"to-read\""
        );
    }

    #[test]
    fn test_book_status_change_sets_dates() {
        let start = BookStatusChange::at(BookStatus::InProgress, "t");
        assert_eq!(start.start_date.as_deref(), Some("t"));
        assert!(start.finish_date.is_none());

        let finish = BookStatusChange::at(BookStatus::Completed, "t");
        assert!(finish.start_date.is_none());
        assert_eq!(finish.finish_date.as_deref(), Some("t"));

        let reset = BookStatusChange::at(BookStatus::ToRead, "t");
        assert!(reset.start_date.is_none() && reset.finish_date.is_none());
    }

    #[test]
    fn test_validators() {
        assert_eq!(validate_habit_name("  Read ").unwrap(), "Read");
        assert!(validate_habit_name("   ").is_err());
        assert!(validate_water_amount(0.0).is_err());
        assert!(validate_water_amount(-5.0).is_err());
        assert_eq!(validate_time("7:05").unwrap(), "07:05");
        assert!(validate_time("25:00").is_err());
    }

    #[test]
    fn test_habit_completion_pct_window() {
        let days = vec!["2024-03-09".to_string(), "2024-03-10".to_string()];
        let completions = vec![
            completion("2024-03-10", true),
            completion("2024-03-09", false),
            completion("2024-03-01", true),
        ];
        assert_eq!(habit_completion_pct(&completions, &days), 50);
        assert_eq!(habit_completion_pct(&[], &days), 0);
    }

    #[test]
    fn test_habit_grid_counts_completed_per_day() {
        let days = vec![
            "2024-03-08".to_string(),
            "2024-03-09".to_string(),
            "2024-03-10".to_string(),
        ];
        let completions = vec![
            completion("2024-03-10", true),
            completion("2024-03-10", true),
            completion("2024-03-10", true),
            completion("2024-03-09", true),
            completion("2024-03-09", false),
            completion("2024-02-01", true),
        ];
        let grid = habit_grid(&completions, days);
        let counts: Vec<usize> = grid.iter().map(|d| d.completed).collect();
        assert_eq!(counts, vec![0, 1, 3]);
        assert_eq!(grid[0].level(), 0);
        assert_eq!(grid[2].level(), 3);
        assert_eq!(grid[2].date, "2024-03-10");
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags(" rust, notes ,, web "), vec!["rust", "notes", "web"]);
        assert!(parse_tags(" , ").is_empty());
    }

    #[test]
    fn test_blog_post_status_parse() {
        assert_eq!("Published".parse::<BlogPostStatus>().unwrap(), BlogPostStatus::Published);
        assert_eq!("draft".parse::<BlogPostStatus>().unwrap(), BlogPostStatus::Draft);
        assert!("archived".parse::<BlogPostStatus>().is_err());
    }

    #[test]
    fn test_project_feed_splits_pinned_newest_first() {
        let note = |content: &str, pinned: bool, created_at: &str| ProjectNote {
            id: EntityId::new(),
            content: content.to_string(),
            attachment_urls: Vec::new(),
            is_pinned: pinned,
            like_count: 0,
            comment_count: 0,
            retweet_count: 0,
            created_at: created_at.to_string(),
            project_id: None,
        };
        let project = Project {
            id: EntityId::new(),
            name: "Garden".to_string(),
            is_public: false,
            header_img: None,
            header_background: None,
            created_at: String::new(),
        };
        let feed = ProjectFeed::new(
            project,
            vec![
                note("old", false, "2024-01-01T00:00:00.000Z"),
                note("rules", true, "2024-01-02T00:00:00.000Z"),
                note("new", false, "2024-01-03T00:00:00.000Z"),
            ],
        );
        assert_eq!(feed.pinned.len(), 1);
        assert_eq!(feed.pinned[0].content, "rules");
        let rest: Vec<&str> = feed.notes.iter().map(|n| n.content.as_str()).collect();
        assert_eq!(rest, vec!["new", "old"]);
        assert_eq!(feed.note_count(), 3);
    }

    #[test]
    fn test_header_background_shape() {
        let bg = HeaderBackground::Gradient {
            from: "#111".to_string(),
            to: "#222".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&bg).unwrap(),
            serde_json::json!({ "type": "gradient", "from": "#111", "to": "#222" })
        );
    }
}
