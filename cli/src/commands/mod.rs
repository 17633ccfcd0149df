mod blog;
mod book;
mod export;
mod habit;
mod helpers;
mod import;
mod migrate;
mod overview;
mod project;
mod water;

pub(crate) use blog::{cmd_blog_add, cmd_blog_delete, cmd_blog_edit, cmd_blog_list, cmd_blog_publish};
pub(crate) use book::{
    cmd_book_add, cmd_book_delete, cmd_book_list, cmd_book_progress, cmd_book_set_status,
};
pub(crate) use export::cmd_export;
pub(crate) use habit::{
    cmd_habit_add, cmd_habit_delete, cmd_habit_done, cmd_habit_edit, cmd_habit_list,
    cmd_habit_log,
};
pub(crate) use import::cmd_import_legacy;
pub(crate) use migrate::{cmd_migrate_cleanup, cmd_migrate_habits};
pub(crate) use overview::cmd_overview;
pub(crate) use project::{
    cmd_project_add, cmd_project_delete, cmd_project_delete_note, cmd_project_edit,
    cmd_project_edit_note, cmd_project_list, cmd_project_pin, cmd_project_post, cmd_project_show,
};
pub(crate) use water::{cmd_water_delete, cmd_water_history, cmd_water_log, cmd_water_today};
