use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::{Value, json};

use crate::habit_migration::{self, CleanupReport, MigrationOutcome};
use crate::legacy_import::{self, LegacyImportSummary, LegacyRow};
use crate::models::{
    BlogPost, BlogPostStatus, Book, BookProgress, BookStatus, BookStatusChange, ExportData,
    Habit, HabitCompletion, HabitWithCompletions, NewBlogPost, NewBook, NewHabit,
    NewHabitCompletion, NewProject, NewProjectNote, NewWaterIntake, Overview, Project,
    ProjectFeed, ProjectNote, UpdateBlogPost, UpdateHabit, UpdateProject, UpdateProjectNote,
    WaterDay, WaterIntake, format_date, habit_completion_pct, habit_grid, now_timestamp,
    validate_habit_name, validate_time, validate_title, validate_water_amount,
};
use crate::schema::{BOOK_PROGRESS_BOOK, HABIT_COMPLETIONS_HABIT, Namespace, PROJECT_NOTES_PROJECT};
use crate::store::{Entity, EntityId, SqliteStore, Store, TxOp};

const EXPORT_VERSION: i64 = 1;
const OVERVIEW_HABIT_DAYS: u32 = 7;
const HABIT_GRID_DAYS: u32 = 84;

/// Dashboard operations over any [`Store`].
pub struct DaybookService<S: Store = SqliteStore> {
    store: S,
}

impl DaybookService<SqliteStore> {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(SqliteStore::open(db_path)?))
    }

    pub fn new_in_memory() -> Result<Self> {
        Ok(Self::new(SqliteStore::open_in_memory()?))
    }
}

impl<S: Store> DaybookService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn require_entity(&self, namespace: Namespace, id: EntityId) -> Result<Entity> {
        let result = self.store.query(&[namespace]).await?;
        result
            .entities(namespace)
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .with_context(|| format!("No {namespace} entry with id {id}"))
    }

    async fn require<T>(&self, namespace: Namespace, id: EntityId) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        Ok(self.require_entity(namespace, id).await?.decode()?)
    }

    // --- Habits ---

    pub async fn add_habit(&self, name: &str, description: Option<String>) -> Result<Habit> {
        let name = validate_habit_name(name)?;
        let id = self.store.new_id();
        let habit = NewHabit {
            name,
            description,
            created_at: now_timestamp(),
        };
        self.store
            .transact(vec![TxOp::update(Namespace::Habits, id, &habit)?])
            .await
            .context("Failed to create habit")?;
        self.require(Namespace::Habits, id).await
    }

    pub async fn update_habit(&self, id: EntityId, update: &UpdateHabit) -> Result<Habit> {
        let _: Habit = self.require(Namespace::Habits, id).await?;
        let update = UpdateHabit {
            name: update.name.as_deref().map(validate_habit_name).transpose()?,
            description: update.description.clone(),
        };
        self.store
            .transact(vec![TxOp::update(Namespace::Habits, id, &update)?])
            .await
            .context("Failed to update habit")?;
        self.require(Namespace::Habits, id).await
    }

    /// Delete a habit together with all of its completions.
    pub async fn delete_habit(&self, id: EntityId) -> Result<()> {
        let _: Habit = self.require(Namespace::Habits, id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::Habits, id)])
            .await
            .context("Failed to delete habit")?;
        Ok(())
    }

    pub async fn list_habits(&self) -> Result<Vec<HabitWithCompletions>> {
        let result = self
            .store
            .query(&[Namespace::Habits, Namespace::HabitCompletions])
            .await?;

        let mut by_habit: BTreeMap<EntityId, Vec<HabitCompletion>> = BTreeMap::new();
        for entity in result.entities(Namespace::HabitCompletions) {
            let completion = HabitCompletion::from_entity(entity)?;
            if let Some(habit_id) = completion.habit_id {
                by_habit.entry(habit_id).or_default().push(completion);
            }
        }

        result
            .decode_all::<Habit>(Namespace::Habits)?
            .into_iter()
            .map(|habit| {
                let mut completions = by_habit.remove(&habit.id).unwrap_or_default();
                completions.sort_by(|a, b| a.date.cmp(&b.date));
                Ok(HabitWithCompletions { habit, completions })
            })
            .collect()
    }

    pub async fn get_habit(&self, id: EntityId) -> Result<HabitWithCompletions> {
        self.list_habits()
            .await?
            .into_iter()
            .find(|h| h.habit.id == id)
            .with_context(|| format!("No habit with id {id}"))
    }

    /// Find a habit by id, or by exact name when `key` is not an id.
    pub async fn find_habit(&self, key: &str) -> Result<HabitWithCompletions> {
        let habits = self.list_habits().await?;
        let by_id = key.parse::<EntityId>().ok();
        let mut matches = habits
            .into_iter()
            .filter(|h| Some(h.habit.id) == by_id || h.habit.name == key);
        let Some(found) = matches.next() else {
            bail!("No habit named or with id '{key}'");
        };
        if matches.next().is_some() {
            bail!("More than one habit is named '{key}'; use its id instead");
        }
        Ok(found)
    }

    pub async fn add_completion(
        &self,
        habit_id: EntityId,
        date: NaiveDate,
        completed: bool,
        notes: Option<String>,
    ) -> Result<HabitCompletion> {
        let _: Habit = self.require(Namespace::Habits, habit_id).await?;
        let id = self.store.new_id();
        let completion = NewHabitCompletion {
            date: format_date(date),
            completed,
            notes: notes.unwrap_or_default(),
            created_at: Some(now_timestamp()),
        };
        self.store
            .transact(vec![
                TxOp::update(Namespace::HabitCompletions, id, &completion)?,
                TxOp::link(
                    Namespace::HabitCompletions,
                    id,
                    HABIT_COMPLETIONS_HABIT.label,
                    habit_id,
                ),
            ])
            .await
            .context("Failed to record habit completion")?;

        let mut created: HabitCompletion = self.require(Namespace::HabitCompletions, id).await?;
        created.habit_id = Some(habit_id);
        Ok(created)
    }

    /// Flip a habit's state for `date`.
    ///
    /// Returns `true` when the day is now marked done, `false` when an
    /// existing completion was removed.
    pub async fn toggle_completion(&self, habit_id: EntityId, date: NaiveDate) -> Result<bool> {
        let habit = self.get_habit(habit_id).await?;
        let date_str = format_date(date);
        let existing = habit
            .completions
            .iter()
            .find(|c| c.completed && c.date == date_str);

        if let Some(completion) = existing {
            self.store
                .transact(vec![TxOp::delete(Namespace::HabitCompletions, completion.id)])
                .await
                .context("Failed to remove habit completion")?;
            Ok(false)
        } else {
            self.add_completion(habit_id, date, true, None).await?;
            Ok(true)
        }
    }

    pub async fn habit_streak(&self, habit_id: EntityId, today: NaiveDate) -> Result<u32> {
        Ok(self.get_habit(habit_id).await?.streak(today))
    }

    pub async fn completion_rate(
        &self,
        habit_id: EntityId,
        year: i32,
        month: u32,
    ) -> Result<Option<u32>> {
        Ok(self.get_habit(habit_id).await?.completion_rate(year, month))
    }

    // --- Water ---

    pub async fn log_water(
        &self,
        amount_ml: f64,
        date: NaiveDate,
        time: &str,
    ) -> Result<WaterIntake> {
        let amount = validate_water_amount(amount_ml)?;
        let time = validate_time(time)?;
        let id = self.store.new_id();
        let intake = NewWaterIntake {
            amount,
            date: format_date(date),
            time,
            created_at: now_timestamp(),
        };
        self.store
            .transact(vec![TxOp::update(Namespace::WaterIntakes, id, &intake)?])
            .await
            .context("Failed to log water intake")?;
        self.require(Namespace::WaterIntakes, id).await
    }

    async fn all_water(&self) -> Result<Vec<WaterIntake>> {
        let result = self.store.query(&[Namespace::WaterIntakes]).await?;
        Ok(result.decode_all(Namespace::WaterIntakes)?)
    }

    pub async fn water_for_date(&self, date: NaiveDate, goal_ml: f64) -> Result<WaterDay> {
        let date_str = format_date(date);
        let mut entries: Vec<WaterIntake> = self
            .all_water()
            .await?
            .into_iter()
            .filter(|w| w.date == date_str)
            .collect();
        entries.sort_by(|a, b| a.time.cmp(&b.time));
        Ok(WaterDay::new(date_str, entries, goal_ml))
    }

    /// Daily totals for the `days` days ending at `today`, oldest first.
    pub async fn water_history(
        &self,
        days: u32,
        today: NaiveDate,
        goal_ml: f64,
    ) -> Result<Vec<WaterDay>> {
        let all = self.all_water().await?;
        Ok(last_days(today, days)
            .into_iter()
            .map(|date| {
                let entries: Vec<WaterIntake> =
                    all.iter().filter(|w| w.date == date).cloned().collect();
                let mut day = WaterDay::new(date, entries, goal_ml);
                day.entries.clear();
                day
            })
            .collect())
    }

    pub async fn delete_water(&self, id: EntityId) -> Result<()> {
        let _: WaterIntake = self.require(Namespace::WaterIntakes, id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::WaterIntakes, id)])
            .await
            .context("Failed to delete water intake")?;
        Ok(())
    }

    // --- Books ---

    pub async fn add_book(&self, book: &NewBook) -> Result<Book> {
        if book.title.trim().is_empty() {
            bail!("Book title must not be empty");
        }
        let id = self.store.new_id();
        let now = now_timestamp();
        let mut ops = vec![TxOp::update(Namespace::Books, id, book)?];
        ops.push(TxOp::update(
            Namespace::Books,
            id,
            &json!({ "createdAt": now }),
        )?);
        if book.status != BookStatus::ToRead {
            ops.push(TxOp::update(
                Namespace::Books,
                id,
                &BookStatusChange::at(book.status, &now),
            )?);
        }
        self.store
            .transact(ops)
            .await
            .context("Failed to add book")?;
        self.require(Namespace::Books, id).await
    }

    pub async fn list_books(&self) -> Result<Vec<Book>> {
        let result = self.store.query(&[Namespace::Books]).await?;
        Ok(result.decode_all(Namespace::Books)?)
    }

    pub async fn set_book_status(&self, id: EntityId, status: BookStatus) -> Result<Book> {
        let _: Book = self.require(Namespace::Books, id).await?;
        let change = BookStatusChange::at(status, &now_timestamp());
        self.store
            .transact(vec![TxOp::update(Namespace::Books, id, &change)?])
            .await
            .context("Failed to update book status")?;
        self.require(Namespace::Books, id).await
    }

    /// Delete a book together with its progress entries.
    pub async fn delete_book(&self, id: EntityId) -> Result<()> {
        let _: Book = self.require(Namespace::Books, id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::Books, id)])
            .await
            .context("Failed to delete book")?;
        Ok(())
    }

    pub async fn record_book_progress(&self, book_id: EntityId, data: &Value) -> Result<BookProgress> {
        let _: Book = self.require(Namespace::Books, book_id).await?;
        let id = self.store.new_id();
        self.store
            .transact(vec![
                TxOp::update(
                    Namespace::BookProgress,
                    id,
                    &json!({ "data": data, "createdAt": now_timestamp() }),
                )?,
                TxOp::link(Namespace::BookProgress, id, BOOK_PROGRESS_BOOK.label, book_id),
            ])
            .await
            .context("Failed to record book progress")?;
        BookProgress::from_entity(&self.require_entity(Namespace::BookProgress, id).await?)
    }

    /// Progress entries of one book, oldest first.
    pub async fn book_progress(&self, book_id: EntityId) -> Result<Vec<BookProgress>> {
        let result = self
            .store
            .query(&[Namespace::Books, Namespace::BookProgress])
            .await?;
        let book = result
            .entities(Namespace::Books)
            .iter()
            .find(|e| e.id == book_id)
            .with_context(|| format!("No book with id {book_id}"))?;
        let entries = result.entities(Namespace::BookProgress);
        book.linked(BOOK_PROGRESS_BOOK.reverse_label)
            .iter()
            .filter_map(|id| entries.iter().find(|e| e.id == *id))
            .map(BookProgress::from_entity)
            .collect()
    }

    // --- Blog posts ---

    pub async fn add_blog_post(&self, post: &NewBlogPost) -> Result<BlogPost> {
        let post = NewBlogPost {
            title: validate_title(&post.title)?,
            ..post.clone()
        };
        let id = self.store.new_id();
        let now = now_timestamp();
        let published = (post.status == BlogPostStatus::Published).then(|| now.clone());
        self.store
            .transact(vec![
                TxOp::update(Namespace::BlogPosts, id, &post)?,
                TxOp::update(
                    Namespace::BlogPosts,
                    id,
                    &json!({ "createdAt": now, "lastEdited": now, "publishedDate": published }),
                )?,
            ])
            .await
            .context("Failed to create blog post")?;
        self.require(Namespace::BlogPosts, id).await
    }

    /// Apply `update` and stamp `lastEdited`.
    ///
    /// Moving a draft to published sets `publishedDate`; moving back to draft clears it.
    pub async fn update_blog_post(&self, id: EntityId, update: &UpdateBlogPost) -> Result<BlogPost> {
        let existing: BlogPost = self.require(Namespace::BlogPosts, id).await?;
        let update = UpdateBlogPost {
            title: update.title.as_deref().map(validate_title).transpose()?,
            ..update.clone()
        };
        let now = now_timestamp();
        let mut stamps = json!({ "lastEdited": now });
        match update.status {
            Some(BlogPostStatus::Published) if existing.status != BlogPostStatus::Published => {
                stamps["publishedDate"] = Value::String(now.clone());
            }
            Some(BlogPostStatus::Draft) => stamps["publishedDate"] = Value::Null,
            _ => {}
        }
        self.store
            .transact(vec![
                TxOp::update(Namespace::BlogPosts, id, &update)?,
                TxOp::update(Namespace::BlogPosts, id, &stamps)?,
            ])
            .await
            .context("Failed to update blog post")?;
        self.require(Namespace::BlogPosts, id).await
    }

    pub async fn publish_blog_post(&self, id: EntityId) -> Result<BlogPost> {
        let update = UpdateBlogPost {
            status: Some(BlogPostStatus::Published),
            ..UpdateBlogPost::default()
        };
        self.update_blog_post(id, &update).await
    }

    pub async fn delete_blog_post(&self, id: EntityId) -> Result<()> {
        let _: BlogPost = self.require(Namespace::BlogPosts, id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::BlogPosts, id)])
            .await
            .context("Failed to delete blog post")?;
        Ok(())
    }

    /// Posts, most recently edited first, optionally limited to one status.
    pub async fn list_blog_posts(&self, status: Option<BlogPostStatus>) -> Result<Vec<BlogPost>> {
        let result = self.store.query(&[Namespace::BlogPosts]).await?;
        let mut posts: Vec<BlogPost> = result
            .decode_all::<BlogPost>(Namespace::BlogPosts)?
            .into_iter()
            .filter(|p| status.is_none_or(|s| p.status == s))
            .collect();
        posts.sort_by(|a, b| b.last_edited.cmp(&a.last_edited));
        Ok(posts)
    }

    // --- Projects ---

    pub async fn add_project(&self, project: &NewProject) -> Result<Project> {
        if project.name.trim().is_empty() {
            bail!("Project name must not be empty");
        }
        let project = NewProject {
            name: project.name.trim().to_string(),
            ..project.clone()
        };
        let id = self.store.new_id();
        self.store
            .transact(vec![
                TxOp::update(Namespace::Projects, id, &project)?,
                TxOp::update(Namespace::Projects, id, &json!({ "createdAt": now_timestamp() }))?,
            ])
            .await
            .context("Failed to create project")?;
        self.require(Namespace::Projects, id).await
    }

    pub async fn update_project(&self, id: EntityId, update: &UpdateProject) -> Result<Project> {
        let _: Project = self.require(Namespace::Projects, id).await?;
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            bail!("Project name must not be empty");
        }
        let update = UpdateProject {
            name: update.name.as_deref().map(|n| n.trim().to_string()),
            ..update.clone()
        };
        self.store
            .transact(vec![TxOp::update(Namespace::Projects, id, &update)?])
            .await
            .context("Failed to update project")?;
        self.require(Namespace::Projects, id).await
    }

    /// Delete a project together with all of its notes.
    pub async fn delete_project(&self, id: EntityId) -> Result<()> {
        let _: Project = self.require(Namespace::Projects, id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::Projects, id)])
            .await
            .context("Failed to delete project")?;
        Ok(())
    }

    pub async fn list_projects(&self) -> Result<Vec<ProjectFeed>> {
        let result = self
            .store
            .query(&[Namespace::Projects, Namespace::ProjectNotes])
            .await?;
        let notes = result.entities(Namespace::ProjectNotes);

        result
            .entities(Namespace::Projects)
            .iter()
            .map(|entity| -> Result<ProjectFeed> {
                let project: Project = entity.decode()?;
                let project_notes = entity
                    .linked(PROJECT_NOTES_PROJECT.reverse_label)
                    .iter()
                    .filter_map(|id| notes.iter().find(|n| n.id == *id))
                    .map(ProjectNote::from_entity)
                    .collect::<Result<Vec<_>>>()?;
                Ok(ProjectFeed::new(project, project_notes))
            })
            .collect()
    }

    pub async fn project_feed(&self, id: EntityId) -> Result<ProjectFeed> {
        self.list_projects()
            .await?
            .into_iter()
            .find(|p| p.project.id == id)
            .with_context(|| format!("No project with id {id}"))
    }

    /// Create a note and attach it to `project_id` in one batch.
    pub async fn post_note(&self, project_id: EntityId, note: &NewProjectNote) -> Result<ProjectNote> {
        let _: Project = self.require(Namespace::Projects, project_id).await?;
        if note.content.trim().is_empty() {
            bail!("Note content must not be empty");
        }
        let id = self.store.new_id();
        self.store
            .transact(vec![
                TxOp::update(Namespace::ProjectNotes, id, note)?,
                TxOp::update(
                    Namespace::ProjectNotes,
                    id,
                    &json!({ "createdAt": now_timestamp() }),
                )?,
                TxOp::link(
                    Namespace::ProjectNotes,
                    id,
                    PROJECT_NOTES_PROJECT.label,
                    project_id,
                ),
            ])
            .await
            .context("Failed to post note")?;
        self.require_note(id).await
    }

    async fn require_note(&self, id: EntityId) -> Result<ProjectNote> {
        ProjectNote::from_entity(&self.require_entity(Namespace::ProjectNotes, id).await?)
    }

    pub async fn update_note(&self, id: EntityId, update: &UpdateProjectNote) -> Result<ProjectNote> {
        self.require_note(id).await?;
        if update.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            bail!("Note content must not be empty");
        }
        self.store
            .transact(vec![TxOp::update(Namespace::ProjectNotes, id, update)?])
            .await
            .context("Failed to update note")?;
        self.require_note(id).await
    }

    pub async fn toggle_note_pin(&self, id: EntityId) -> Result<ProjectNote> {
        let note = self.require_note(id).await?;
        self.store
            .transact(vec![TxOp::update(
                Namespace::ProjectNotes,
                id,
                &json!({ "isPinned": !note.is_pinned }),
            )?])
            .await
            .context("Failed to update note")?;
        self.require_note(id).await
    }

    pub async fn delete_note(&self, id: EntityId) -> Result<()> {
        self.require_note(id).await?;
        self.store
            .transact(vec![TxOp::delete(Namespace::ProjectNotes, id)])
            .await
            .context("Failed to delete note")?;
        Ok(())
    }

    // --- Overview ---

    pub async fn overview(&self, today: NaiveDate) -> Result<Overview> {
        let result = self
            .store
            .query(&[
                Namespace::Books,
                Namespace::WaterIntakes,
                Namespace::HabitCompletions,
                Namespace::BlogPosts,
            ])
            .await?;

        let books: Vec<Book> = result.decode_all(Namespace::Books)?;
        let water: Vec<WaterIntake> = result.decode_all(Namespace::WaterIntakes)?;
        let completions: Vec<HabitCompletion> = result.decode_all(Namespace::HabitCompletions)?;
        let posts: Vec<BlogPost> = result.decode_all(Namespace::BlogPosts)?;

        let today_str = format_date(today);
        Ok(Overview {
            books_reading: books
                .iter()
                .filter(|b| b.status == BookStatus::InProgress)
                .count(),
            books_completed: books
                .iter()
                .filter(|b| b.status == BookStatus::Completed)
                .count(),
            water_today_ml: water
                .iter()
                .filter(|w| w.date == today_str)
                .map(|w| w.amount)
                .sum(),
            habit_completion_pct: habit_completion_pct(
                &completions,
                &last_days(today, OVERVIEW_HABIT_DAYS),
            ),
            blog_drafts: posts
                .iter()
                .filter(|p| p.status == BlogPostStatus::Draft)
                .count(),
            blog_published: posts
                .iter()
                .filter(|p| p.status == BlogPostStatus::Published)
                .count(),
            habit_grid: habit_grid(&completions, last_days(today, HABIT_GRID_DAYS)),
            date: today_str,
        })
    }

    // --- Legacy data ---

    pub async fn import_legacy(
        &self,
        rows: &[LegacyRow],
        dry_run: bool,
    ) -> Result<LegacyImportSummary> {
        legacy_import::import_legacy_records(&self.store, rows, dry_run).await
    }

    pub async fn migrate_habits(&self) -> Result<MigrationOutcome> {
        habit_migration::migrate_habit_data(&self.store).await
    }

    pub async fn cleanup_legacy_habits(&self) -> Result<CleanupReport> {
        habit_migration::cleanup_legacy_records(&self.store).await
    }

    // --- Export ---

    pub async fn export_all(&self) -> Result<ExportData> {
        let result = self.store.query(&Namespace::ALL).await?;
        let namespaces = Namespace::ALL
            .into_iter()
            .map(|ns| (ns, result.entities(ns).to_vec()))
            .collect();
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: now_timestamp(),
            namespaces,
        })
    }
}

/// The `days` calendar dates ending at `today`, oldest first.
fn last_days(today: NaiveDate, days: u32) -> Vec<String> {
    (0..days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(chrono::Days::new(u64::from(offset))))
        .map(format_date)
        .collect()
}
