use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate};

use daybook_core::store::EntityId;

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(today()),
        Some(s) => match s.as_str() {
            "today" => Ok(today()),
            "yesterday" => Ok(today() - chrono::Duration::days(1)),
            "tomorrow" => Ok(today() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse `YYYY-MM`, defaulting to the current month.
pub(crate) fn parse_month(month: Option<&str>) -> Result<(i32, u32)> {
    let Some(s) = month else {
        let now = today();
        return Ok((now.year(), now.month()));
    };
    let first = NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")
        .with_context(|| format!("Invalid month '{s}'. Use YYYY-MM"))?;
    Ok((first.year(), first.month()))
}

pub(crate) fn parse_id(s: &str) -> Result<EntityId> {
    s.parse()
        .with_context(|| format!("Invalid id '{s}'. Ids are shown by the list commands"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_none() {
        assert_eq!(parse_date(None).unwrap(), Local::now().date_naive());
    }

    #[test]
    fn test_parse_date_keywords() {
        let today = Local::now().date_naive();
        assert_eq!(parse_date(Some("today".to_string())).unwrap(), today);
        assert_eq!(
            parse_date(Some("yesterday".to_string())).unwrap(),
            today - chrono::Duration::days(1)
        );
        assert_eq!(
            parse_date(Some("tomorrow".to_string())).unwrap(),
            today + chrono::Duration::days(1)
        );
    }

    #[test]
    fn test_parse_date_iso() {
        let date = parse_date(Some("2024-01-15".to_string())).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope".to_string())).is_err());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(parse_month(Some("2024-03")).unwrap(), (2024, 3));
        assert!(parse_month(Some("2024-13")).is_err());
        assert!(parse_month(Some("March")).is_err());
        let now = Local::now().date_naive();
        assert_eq!(parse_month(None).unwrap(), (now.year(), now.month()));
    }

    #[test]
    fn test_parse_id() {
        let id = EntityId::new();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert!(parse_id("42").is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
        assert_eq!(truncate("Crème fraîche", 10), "Crème f...");
    }
}
