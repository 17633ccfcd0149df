use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use daybook_core::models::{NewProject, NewProjectNote, ProjectNote, UpdateProject, UpdateProjectNote};
use daybook_core::service::DaybookService;

use super::helpers::{parse_id, truncate};

pub(crate) async fn cmd_project_add(
    svc: &DaybookService,
    project: &NewProject,
    json: bool,
) -> Result<()> {
    let project = svc.add_project(project).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!("Created project '{}' ({})", project.name, project.id);
    }

    Ok(())
}

pub(crate) async fn cmd_project_list(svc: &DaybookService, json: bool) -> Result<()> {
    let projects = svc.list_projects().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
    } else if projects.is_empty() {
        eprintln!("No projects found. Use `daybook project add` to create one.");
    } else {
        #[derive(Tabled)]
        struct ProjectRow {
            #[tabled(rename = "ID")]
            id: String,
            #[tabled(rename = "Name")]
            name: String,
            #[tabled(rename = "Visibility")]
            visibility: &'static str,
            #[tabled(rename = "Notes")]
            notes: usize,
            #[tabled(rename = "Pinned")]
            pinned: usize,
        }

        let rows: Vec<ProjectRow> = projects
            .iter()
            .map(|p| ProjectRow {
                id: p.project.id.to_string(),
                name: truncate(&p.project.name, 35),
                visibility: if p.project.is_public { "public" } else { "private" },
                notes: p.note_count(),
                pinned: p.pinned.len(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

fn print_note(note: &ProjectNote) {
    let pin = if note.is_pinned { "[pinned] " } else { "" };
    let when: String = note.created_at.chars().take(16).collect();
    println!("  {pin}{} · {}", when.replace('T', " "), note.id);
    for line in note.content.lines() {
        println!("    {line}");
    }
    for url in &note.attachment_urls {
        println!("    -> {url}");
    }
}

pub(crate) async fn cmd_project_show(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let feed = svc.project_feed(parse_id(id)?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&feed)?);
        return Ok(());
    }

    let visibility = if feed.project.is_public { "public" } else { "private" };
    println!("{} ({visibility})\n", feed.project.name);
    if feed.note_count() == 0 {
        println!("  No notes yet. Use `daybook project post` to add one.");
    }
    for note in feed.pinned.iter().chain(&feed.notes) {
        print_note(note);
        println!();
    }

    Ok(())
}

pub(crate) async fn cmd_project_edit(
    svc: &DaybookService,
    id: &str,
    update: &UpdateProject,
    json: bool,
) -> Result<()> {
    let project = svc.update_project(parse_id(id)?, update).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&project)?);
    } else {
        println!("Updated project '{}'", project.name);
    }

    Ok(())
}

pub(crate) async fn cmd_project_delete(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    svc.delete_project(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted project {id} and its notes");
    }

    Ok(())
}

pub(crate) async fn cmd_project_post(
    svc: &DaybookService,
    project_id: &str,
    note: &NewProjectNote,
    json: bool,
) -> Result<()> {
    let note = svc.post_note(parse_id(project_id)?, note).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Posted note {}", note.id);
    }

    Ok(())
}

pub(crate) async fn cmd_project_edit_note(
    svc: &DaybookService,
    id: &str,
    update: &UpdateProjectNote,
    json: bool,
) -> Result<()> {
    let note = svc.update_note(parse_id(id)?, update).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!("Updated note {}", note.id);
    }

    Ok(())
}

pub(crate) async fn cmd_project_pin(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let note = svc.toggle_note_pin(parse_id(id)?).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else if note.is_pinned {
        println!("Pinned note {}", note.id);
    } else {
        println!("Unpinned note {}", note.id);
    }

    Ok(())
}

pub(crate) async fn cmd_project_delete_note(
    svc: &DaybookService,
    id: &str,
    json: bool,
) -> Result<()> {
    let id = parse_id(id)?;
    svc.delete_note(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted note {id}");
    }

    Ok(())
}
