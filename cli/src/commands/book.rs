use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use daybook_core::models::{BookStatus, NewBook};
use daybook_core::service::DaybookService;

use super::helpers::{parse_id, truncate};

pub(crate) async fn cmd_book_add(svc: &DaybookService, book: &NewBook, json: bool) -> Result<()> {
    let book = svc.add_book(book).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        let by = if book.author.is_empty() {
            String::new()
        } else {
            format!(" by {}", book.author)
        };
        println!(
            "Added '{}'{by} as {} ({})",
            book.title,
            book.status.label(),
            book.id
        );
    }

    Ok(())
}

pub(crate) async fn cmd_book_list(
    svc: &DaybookService,
    status: Option<&str>,
    json: bool,
) -> Result<()> {
    let status: Option<BookStatus> = status.map(str::parse).transpose()?;
    let books: Vec<_> = svc
        .list_books()
        .await?
        .into_iter()
        .filter(|b| status.is_none_or(|s| b.status == s))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&books)?);
    } else if books.is_empty() {
        eprintln!("No books found. Use `daybook book add` to add one.");
    } else {
        #[derive(Tabled)]
        struct BookRow {
            #[tabled(rename = "ID")]
            id: String,
            #[tabled(rename = "Title")]
            title: String,
            #[tabled(rename = "Author")]
            author: String,
            #[tabled(rename = "Status")]
            status: &'static str,
            #[tabled(rename = "Started")]
            started: String,
            #[tabled(rename = "Finished")]
            finished: String,
        }

        let day = |ts: Option<&String>| -> String {
            ts.map(|t| t.chars().take(10).collect()).unwrap_or_default()
        };
        let rows: Vec<BookRow> = books
            .iter()
            .map(|b| BookRow {
                id: b.id.to_string(),
                title: truncate(&b.title, 35),
                author: truncate(&b.author, 25),
                status: b.status.label(),
                started: day(b.start_date.as_ref()),
                finished: day(b.finish_date.as_ref()),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) async fn cmd_book_set_status(
    svc: &DaybookService,
    id: &str,
    status: BookStatus,
    json: bool,
) -> Result<()> {
    let book = svc.set_book_status(parse_id(id)?, status).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&book)?);
    } else {
        match status {
            BookStatus::InProgress => println!("Started reading '{}'", book.title),
            BookStatus::Completed => println!("Finished '{}'", book.title),
            BookStatus::ToRead => println!("Moved '{}' back to the reading list", book.title),
        }
    }

    Ok(())
}

pub(crate) async fn cmd_book_delete(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    svc.delete_book(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted book {id}");
    }

    Ok(())
}

/// Record a progress entry when `page` or `note` is given, then list the book's entries.
pub(crate) async fn cmd_book_progress(
    svc: &DaybookService,
    id: &str,
    page: Option<u32>,
    note: Option<String>,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    if page.is_some() || note.is_some() {
        let mut data = serde_json::Map::new();
        if let Some(page) = page {
            data.insert("page".to_string(), page.into());
        }
        if let Some(note) = note {
            data.insert("note".to_string(), note.into());
        }
        svc.record_book_progress(id, &serde_json::Value::from(data)).await?;
    }
    let entries = svc.book_progress(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        eprintln!("No progress recorded. Use `--page` or `--note` to add an entry.");
    } else {
        #[derive(Tabled)]
        struct ProgressRow {
            #[tabled(rename = "Date")]
            date: String,
            #[tabled(rename = "Page")]
            page: String,
            #[tabled(rename = "Note")]
            note: String,
        }

        let rows: Vec<ProgressRow> = entries
            .iter()
            .map(|e| ProgressRow {
                date: e.created_at.chars().take(10).collect(),
                page: e.data.get("page").map(ToString::to_string).unwrap_or_default(),
                note: e
                    .data
                    .get("note")
                    .and_then(|n| n.as_str())
                    .map(|n| truncate(n, 40))
                    .unwrap_or_default(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}
