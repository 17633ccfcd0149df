use anyhow::Result;
use tabled::{Table, Tabled, settings::Style};

use daybook_core::models::{BlogPost, BlogPostStatus, NewBlogPost, UpdateBlogPost};
use daybook_core::service::DaybookService;

use super::helpers::{parse_id, truncate};

fn print_post(post: &BlogPost, json: bool, verb: &str) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(post)?);
    } else {
        println!("{verb} '{}' ({}, {})", post.title, post.status, post.id);
    }
    Ok(())
}

pub(crate) async fn cmd_blog_add(svc: &DaybookService, post: &NewBlogPost, json: bool) -> Result<()> {
    let post = svc.add_blog_post(post).await?;
    print_post(&post, json, "Created")
}

pub(crate) async fn cmd_blog_list(
    svc: &DaybookService,
    status: Option<BlogPostStatus>,
    json: bool,
) -> Result<()> {
    let posts = svc.list_blog_posts(status).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else if posts.is_empty() {
        eprintln!("No posts found. Use `daybook blog add` to start one.");
    } else {
        #[derive(Tabled)]
        struct PostRow {
            #[tabled(rename = "ID")]
            id: String,
            #[tabled(rename = "Title")]
            title: String,
            #[tabled(rename = "Status")]
            status: &'static str,
            #[tabled(rename = "Tags")]
            tags: String,
            #[tabled(rename = "Edited")]
            edited: String,
        }

        let rows: Vec<PostRow> = posts
            .iter()
            .map(|p| PostRow {
                id: p.id.to_string(),
                title: truncate(&p.title, 40),
                status: p.status.as_str(),
                tags: truncate(&p.tags.join(", "), 30),
                edited: p.last_edited.chars().take(10).collect(),
            })
            .collect();

        let table = Table::new(&rows).with(Style::rounded()).to_string();
        println!("{table}");
    }

    Ok(())
}

pub(crate) async fn cmd_blog_edit(
    svc: &DaybookService,
    id: &str,
    update: &UpdateBlogPost,
    json: bool,
) -> Result<()> {
    let post = svc.update_blog_post(parse_id(id)?, update).await?;
    print_post(&post, json, "Updated")
}

pub(crate) async fn cmd_blog_publish(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let post = svc.publish_blog_post(parse_id(id)?).await?;
    print_post(&post, json, "Published")
}

pub(crate) async fn cmd_blog_delete(svc: &DaybookService, id: &str, json: bool) -> Result<()> {
    let id = parse_id(id)?;
    svc.delete_blog_post(id).await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("Deleted post {id}");
    }

    Ok(())
}
