mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_blog_add, cmd_blog_delete, cmd_blog_edit, cmd_blog_list, cmd_blog_publish, cmd_book_add,
    cmd_book_delete, cmd_book_list, cmd_book_progress, cmd_book_set_status, cmd_export,
    cmd_habit_add, cmd_habit_delete, cmd_habit_done, cmd_habit_edit, cmd_habit_list,
    cmd_habit_log, cmd_import_legacy, cmd_migrate_cleanup, cmd_migrate_habits, cmd_overview,
    cmd_project_add, cmd_project_delete, cmd_project_delete_note, cmd_project_edit,
    cmd_project_edit_note, cmd_project_list, cmd_project_pin, cmd_project_post, cmd_project_show,
    cmd_water_delete, cmd_water_history, cmd_water_log, cmd_water_today,
};
use crate::config::Config;
use daybook_core::models::{
    BlogPostStatus, BookStatus, DEFAULT_WATER_GOAL_ML, NewBlogPost, NewBook, NewProject,
    NewProjectNote, UpdateBlogPost, UpdateProject, UpdateProjectNote, parse_tags,
};
use daybook_core::service::DaybookService;

#[derive(Parser)]
#[command(
    name = "daybook",
    version,
    about = "Personal dashboard for habits, water, reading, writing and projects"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track daily habits
    Habit {
        #[command(subcommand)]
        command: HabitCommands,
    },
    /// Track water intake
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
    /// Manage the reading list
    Book {
        #[command(subcommand)]
        command: BookCommands,
    },
    /// Write and publish blog posts
    Blog {
        #[command(subcommand)]
        command: BlogCommands,
    },
    /// Keep notes on projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Show books, water, habit and blog progress for a day
    Overview {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Daily water goal in ml
        #[arg(long, default_value_t = DEFAULT_WATER_GOAL_ML)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import data from older exports
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Convert stored data to the current model
    Migrate {
        #[command(subcommand)]
        command: MigrateCommands,
    },
    /// Export every record as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum HabitCommands {
    /// Create a habit
    Add {
        /// Habit name
        name: String,
        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List habits with streaks and this month's completion rate
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a habit or change its description
    Edit {
        /// Habit name or ID
        habit: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a habit and all of its completions
    Delete {
        /// Habit name or ID
        habit: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a habit as done for a day
    Done {
        /// Habit name or ID
        habit: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record a day's entry with notes
    Log {
        /// Habit name or ID
        habit: String,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Record the day as missed instead of done
        #[arg(long)]
        missed: bool,
        /// Optional notes
        #[arg(long)]
        notes: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WaterCommands {
    /// Log a drink
    Log {
        /// Amount in ml
        amount: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Time of day (HH:MM, default: now)
        #[arg(long)]
        time: Option<String>,
        /// Daily goal in ml
        #[arg(long, default_value_t = DEFAULT_WATER_GOAL_ML)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a day's intake against the goal (default: today)
    Today {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Daily goal in ml
        #[arg(long, default_value_t = DEFAULT_WATER_GOAL_ML)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show daily totals for the last N days
    History {
        /// Number of days to show
        #[arg(short, long, default_value = "7")]
        days: u32,
        /// Daily goal in ml
        #[arg(long, default_value_t = DEFAULT_WATER_GOAL_ML)]
        goal: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a water entry by ID
    Delete {
        /// Water entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BookCommands {
    /// Add a book
    Add {
        /// Book title
        title: String,
        /// Author
        #[arg(short, long, default_value = "")]
        author: String,
        /// Status: to-read, in-progress, completed
        #[arg(short, long, default_value = "to-read")]
        status: BookStatus,
        /// Notes
        #[arg(long, default_value = "")]
        notes: String,
        /// Cover image URL
        #[arg(long, default_value = "")]
        cover_url: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List books
    List {
        /// Only show books with this status
        #[arg(short, long)]
        status: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a book as being read
    Start {
        /// Book ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a book as finished
    Finish {
        /// Book ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a book by ID
    Delete {
        /// Book ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Record reading progress, then list a book's entries
    Progress {
        /// Book ID
        id: String,
        /// Page reached
        #[arg(long)]
        page: Option<u32>,
        /// Short note for this entry
        #[arg(long)]
        note: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum BlogCommands {
    /// Start a post (saved as a draft unless --publish)
    Add {
        /// Post title
        title: String,
        /// Post body (markdown)
        #[arg(short, long, default_value = "")]
        content: String,
        /// Comma-separated tags
        #[arg(short, long, default_value = "")]
        tags: String,
        /// Header image URL
        #[arg(long)]
        header_img: Option<String>,
        /// Publish immediately
        #[arg(long)]
        publish: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List posts, most recently edited first
    List {
        /// Only show posts with this status: draft, published
        #[arg(short, long)]
        status: Option<BlogPostStatus>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a post's title, body, tags or status
    Edit {
        /// Post ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New body
        #[arg(long)]
        content: Option<String>,
        /// New comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// New status: draft, published
        #[arg(long)]
        status: Option<BlogPostStatus>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a draft
    Publish {
        /// Post ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a post by ID
    Delete {
        /// Post ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// Create a project
    Add {
        /// Project name
        name: String,
        /// Make the project public
        #[arg(long)]
        public: bool,
        /// Header image URL
        #[arg(long)]
        header_img: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List projects with note counts
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a project's notes, pinned first
    Show {
        /// Project ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rename a project or change its visibility
    Edit {
        /// Project ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// Visibility (true for public)
        #[arg(long)]
        public: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a project and all of its notes
    Delete {
        /// Project ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Post a note to a project
    Post {
        /// Project ID
        project: String,
        /// Note text
        content: String,
        /// Attachment URL (repeatable)
        #[arg(long = "attach", value_name = "URL")]
        attachments: Vec<String>,
        /// Pin the note
        #[arg(long)]
        pin: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a note's text
    EditNote {
        /// Note ID
        id: String,
        /// New text
        content: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pin or unpin a note
    Pin {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a note by ID
    DeleteNote {
        /// Note ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import legacy habit tracks from a CSV export
    Legacy {
        /// Path to the CSV file (habitName,date,completed,notes,createdAt)
        file: PathBuf,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MigrateCommands {
    /// Convert legacy habit tracks into habits and completions
    Habits {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete legacy habit tracks after a successful migration
    CleanupLegacy {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    log::debug!("Using database {}", config.db_path.display());
    let svc = DaybookService::open(&config.db_path)?;

    match cli.command {
        Commands::Habit { command } => match command {
            HabitCommands::Add {
                name,
                description,
                json,
            } => cmd_habit_add(&svc, &name, description, json).await,
            HabitCommands::List { json } => cmd_habit_list(&svc, json).await,
            HabitCommands::Edit {
                habit,
                name,
                description,
                json,
            } => cmd_habit_edit(&svc, &habit, name, description, json).await,
            HabitCommands::Delete { habit, json } => cmd_habit_delete(&svc, &habit, json).await,
            HabitCommands::Done { habit, date, json } => {
                cmd_habit_done(&svc, &habit, date, json).await
            }
            HabitCommands::Log {
                habit,
                date,
                missed,
                notes,
                json,
            } => cmd_habit_log(&svc, &habit, date, missed, notes, json).await,
        },
        Commands::Water { command } => match command {
            WaterCommands::Log {
                amount,
                date,
                time,
                goal,
                json,
            } => cmd_water_log(&svc, amount, date, time, goal, json).await,
            WaterCommands::Today { date, goal, json } => {
                cmd_water_today(&svc, date, goal, json).await
            }
            WaterCommands::History { days, goal, json } => {
                cmd_water_history(&svc, days, goal, json).await
            }
            WaterCommands::Delete { id, json } => cmd_water_delete(&svc, &id, json).await,
        },
        Commands::Book { command } => match command {
            BookCommands::Add {
                title,
                author,
                status,
                notes,
                cover_url,
                json,
            } => {
                let book = NewBook {
                    title,
                    author,
                    status,
                    notes,
                    cover_url,
                };
                cmd_book_add(&svc, &book, json).await
            }
            BookCommands::List { status, json } => {
                cmd_book_list(&svc, status.as_deref(), json).await
            }
            BookCommands::Start { id, json } => {
                cmd_book_set_status(&svc, &id, BookStatus::InProgress, json).await
            }
            BookCommands::Finish { id, json } => {
                cmd_book_set_status(&svc, &id, BookStatus::Completed, json).await
            }
            BookCommands::Delete { id, json } => cmd_book_delete(&svc, &id, json).await,
            BookCommands::Progress {
                id,
                page,
                note,
                json,
            } => cmd_book_progress(&svc, &id, page, note, json).await,
        },
        Commands::Blog { command } => match command {
            BlogCommands::Add {
                title,
                content,
                tags,
                header_img,
                publish,
                json,
            } => {
                let post = NewBlogPost {
                    title,
                    content,
                    tags: parse_tags(&tags),
                    status: if publish {
                        BlogPostStatus::Published
                    } else {
                        BlogPostStatus::Draft
                    },
                    header_img_url: header_img,
                };
                cmd_blog_add(&svc, &post, json).await
            }
            BlogCommands::List { status, json } => cmd_blog_list(&svc, status, json).await,
            BlogCommands::Edit {
                id,
                title,
                content,
                tags,
                status,
                json,
            } => {
                let update = UpdateBlogPost {
                    title,
                    content,
                    tags: tags.as_deref().map(parse_tags),
                    status,
                    header_img_url: None,
                };
                cmd_blog_edit(&svc, &id, &update, json).await
            }
            BlogCommands::Publish { id, json } => cmd_blog_publish(&svc, &id, json).await,
            BlogCommands::Delete { id, json } => cmd_blog_delete(&svc, &id, json).await,
        },
        Commands::Project { command } => match command {
            ProjectCommands::Add {
                name,
                public,
                header_img,
                json,
            } => {
                let project = NewProject {
                    name,
                    is_public: public,
                    header_img,
                    header_background: None,
                };
                cmd_project_add(&svc, &project, json).await
            }
            ProjectCommands::List { json } => cmd_project_list(&svc, json).await,
            ProjectCommands::Show { id, json } => cmd_project_show(&svc, &id, json).await,
            ProjectCommands::Edit {
                id,
                name,
                public,
                json,
            } => {
                let update = UpdateProject {
                    name,
                    is_public: public,
                    ..UpdateProject::default()
                };
                cmd_project_edit(&svc, &id, &update, json).await
            }
            ProjectCommands::Delete { id, json } => cmd_project_delete(&svc, &id, json).await,
            ProjectCommands::Post {
                project,
                content,
                attachments,
                pin,
                json,
            } => {
                let note = NewProjectNote {
                    content,
                    attachment_urls: attachments,
                    is_pinned: pin,
                };
                cmd_project_post(&svc, &project, &note, json).await
            }
            ProjectCommands::EditNote { id, content, json } => {
                let update = UpdateProjectNote {
                    content: Some(content),
                    ..UpdateProjectNote::default()
                };
                cmd_project_edit_note(&svc, &id, &update, json).await
            }
            ProjectCommands::Pin { id, json } => cmd_project_pin(&svc, &id, json).await,
            ProjectCommands::DeleteNote { id, json } => {
                cmd_project_delete_note(&svc, &id, json).await
            }
        },
        Commands::Overview { date, goal, json } => cmd_overview(&svc, date, goal, json).await,
        Commands::Import { command } => match command {
            ImportCommands::Legacy {
                file,
                dry_run,
                json,
            } => cmd_import_legacy(&svc, &file, dry_run, json).await,
        },
        Commands::Migrate { command } => match command {
            MigrateCommands::Habits { json } => cmd_migrate_habits(&svc, json).await,
            MigrateCommands::CleanupLegacy { yes, json } => {
                cmd_migrate_cleanup(&svc, yes, json).await
            }
        },
        Commands::Export { output } => cmd_export(&svc, output.as_deref()).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_habit_done() {
        let cli = Cli::try_parse_from(["daybook", "habit", "done", "Read", "--date", "yesterday"])
            .unwrap();
        match cli.command {
            Commands::Habit {
                command: HabitCommands::Done { habit, date, json },
            } => {
                assert_eq!(habit, "Read");
                assert_eq!(date.as_deref(), Some("yesterday"));
                assert!(!json);
            }
            _ => panic!("expected habit done"),
        }
    }

    #[test]
    fn test_parse_book_status() {
        let cli = Cli::try_parse_from(["daybook", "book", "add", "Dune", "--status", "reading"])
            .unwrap();
        match cli.command {
            Commands::Book {
                command: BookCommands::Add { status, .. },
            } => assert_eq!(status, BookStatus::InProgress),
            _ => panic!("expected book add"),
        }
        assert!(Cli::try_parse_from(["daybook", "book", "add", "Dune", "--status", "shelved"]).is_err());
    }

    #[test]
    fn test_cleanup_legacy_flag() {
        let cli = Cli::try_parse_from(["daybook", "migrate", "cleanup-legacy", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Migrate {
                command: MigrateCommands::CleanupLegacy { yes: true, .. }
            }
        ));
    }

    #[test]
    fn test_parse_blog_add_publish() {
        let cli = Cli::try_parse_from([
            "daybook", "blog", "add", "Hello", "--tags", "rust, notes", "--publish",
        ])
        .unwrap();
        match cli.command {
            Commands::Blog {
                command: BlogCommands::Add { tags, publish, .. },
            } => {
                assert!(publish);
                assert_eq!(parse_tags(&tags), vec!["rust", "notes"]);
            }
            _ => panic!("expected blog add"),
        }
        assert!(Cli::try_parse_from(["daybook", "blog", "list", "--status", "archived"]).is_err());
    }

    #[test]
    fn test_parse_project_post_attachments() {
        let cli = Cli::try_parse_from([
            "daybook", "project", "post", "p1", "Planted", "--attach", "a.png", "--attach",
            "b.png", "--pin",
        ])
        .unwrap();
        match cli.command {
            Commands::Project {
                command:
                    ProjectCommands::Post {
                        project,
                        attachments,
                        pin,
                        ..
                    },
            } => {
                assert_eq!(project, "p1");
                assert_eq!(attachments, vec!["a.png", "b.png"]);
                assert!(pin);
            }
            _ => panic!("expected project post"),
        }
    }

    #[test]
    fn test_water_goal_default() {
        let cli = Cli::try_parse_from(["daybook", "water", "today"]).unwrap();
        match cli.command {
            Commands::Water {
                command: WaterCommands::Today { goal, .. },
            } => assert!((goal - DEFAULT_WATER_GOAL_ML).abs() < f64::EPSILON),
            _ => panic!("expected water today"),
        }
    }
}
