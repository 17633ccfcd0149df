use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::StoreError;

/// A named entity set in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Namespace {
    #[serde(rename = "habitTracks")]
    HabitTracks,
    #[serde(rename = "habits")]
    Habits,
    #[serde(rename = "habitCompletions")]
    HabitCompletions,
    #[serde(rename = "waterIntakes")]
    WaterIntakes,
    #[serde(rename = "books")]
    Books,
    #[serde(rename = "bookProgress")]
    BookProgress,
    #[serde(rename = "blogPosts")]
    BlogPosts,
    #[serde(rename = "projects")]
    Projects,
    #[serde(rename = "projectNotes")]
    ProjectNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    String,
    Number,
    Boolean,
    /// Any JSON value: arrays, objects, or scalars.
    Json,
}

#[derive(Debug, Clone, Copy)]
pub struct AttrDef {
    pub name: &'static str,
    pub ty: AttrType,
}

const fn attr(name: &'static str, ty: AttrType) -> AttrDef {
    AttrDef { name, ty }
}

const HABIT_TRACK_ATTRS: &[AttrDef] = &[
    attr("habitName", AttrType::String),
    attr("date", AttrType::String),
    attr("completed", AttrType::Boolean),
    attr("notes", AttrType::String),
    attr("createdAt", AttrType::String),
];

const HABIT_ATTRS: &[AttrDef] = &[
    attr("name", AttrType::String),
    attr("description", AttrType::String),
    attr("createdAt", AttrType::String),
];

const HABIT_COMPLETION_ATTRS: &[AttrDef] = &[
    attr("date", AttrType::String),
    attr("completed", AttrType::Boolean),
    attr("notes", AttrType::String),
    attr("createdAt", AttrType::String),
];

const WATER_INTAKE_ATTRS: &[AttrDef] = &[
    attr("amount", AttrType::Number),
    attr("date", AttrType::String),
    attr("time", AttrType::String),
    attr("createdAt", AttrType::String),
];

const BOOK_ATTRS: &[AttrDef] = &[
    attr("title", AttrType::String),
    attr("author", AttrType::String),
    attr("status", AttrType::String),
    attr("notes", AttrType::String),
    attr("coverUrl", AttrType::String),
    attr("startDate", AttrType::String),
    attr("finishDate", AttrType::String),
    attr("createdAt", AttrType::String),
];

const BOOK_PROGRESS_ATTRS: &[AttrDef] = &[
    attr("data", AttrType::Json),
    attr("createdAt", AttrType::String),
];

const BLOG_POST_ATTRS: &[AttrDef] = &[
    attr("title", AttrType::String),
    attr("content", AttrType::String),
    attr("status", AttrType::String),
    attr("tags", AttrType::Json),
    attr("headerImgUrl", AttrType::String),
    attr("createdAt", AttrType::String),
    attr("lastEdited", AttrType::String),
    attr("publishedDate", AttrType::String),
];

const PROJECT_ATTRS: &[AttrDef] = &[
    attr("name", AttrType::String),
    attr("isPublic", AttrType::Boolean),
    attr("headerImg", AttrType::String),
    attr("headerBackground", AttrType::Json),
    attr("createdAt", AttrType::String),
];

const PROJECT_NOTE_ATTRS: &[AttrDef] = &[
    attr("content", AttrType::String),
    attr("attachmentUrls", AttrType::Json),
    attr("isPinned", AttrType::Boolean),
    attr("likeCount", AttrType::Number),
    attr("commentCount", AttrType::Number),
    attr("retweetCount", AttrType::Number),
    attr("createdAt", AttrType::String),
];

impl Namespace {
    pub const ALL: [Namespace; 9] = [
        Namespace::HabitTracks,
        Namespace::Habits,
        Namespace::HabitCompletions,
        Namespace::WaterIntakes,
        Namespace::Books,
        Namespace::BookProgress,
        Namespace::BlogPosts,
        Namespace::Projects,
        Namespace::ProjectNotes,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::HabitTracks => "habitTracks",
            Namespace::Habits => "habits",
            Namespace::HabitCompletions => "habitCompletions",
            Namespace::WaterIntakes => "waterIntakes",
            Namespace::Books => "books",
            Namespace::BookProgress => "bookProgress",
            Namespace::BlogPosts => "blogPosts",
            Namespace::Projects => "projects",
            Namespace::ProjectNotes => "projectNotes",
        }
    }

    #[must_use]
    pub fn attributes(self) -> &'static [AttrDef] {
        match self {
            Namespace::HabitTracks => HABIT_TRACK_ATTRS,
            Namespace::Habits => HABIT_ATTRS,
            Namespace::HabitCompletions => HABIT_COMPLETION_ATTRS,
            Namespace::WaterIntakes => WATER_INTAKE_ATTRS,
            Namespace::Books => BOOK_ATTRS,
            Namespace::BookProgress => BOOK_PROGRESS_ATTRS,
            Namespace::BlogPosts => BLOG_POST_ATTRS,
            Namespace::Projects => PROJECT_ATTRS,
            Namespace::ProjectNotes => PROJECT_NOTE_ATTRS,
        }
    }

    #[must_use]
    pub fn attribute(self, name: &str) -> Option<&'static AttrDef> {
        self.attributes().iter().find(|a| a.name == name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Namespace::ALL
            .into_iter()
            .find(|ns| ns.as_str() == s)
            .ok_or_else(|| StoreError::UnknownNamespace(s.to_string()))
    }
}

/// A has-one forward link from `on` to `target`, seen from the target as a
/// has-many reverse label.
#[derive(Debug, Clone, Copy)]
pub struct LinkDef {
    pub name: &'static str,
    pub on: Namespace,
    pub label: &'static str,
    pub target: Namespace,
    pub reverse_label: &'static str,
    /// Deleting the target deletes every entity linked to it.
    pub cascade: bool,
}

pub const HABIT_COMPLETIONS_HABIT: LinkDef = LinkDef {
    name: "habitCompletionsHabit",
    on: Namespace::HabitCompletions,
    label: "habit",
    target: Namespace::Habits,
    reverse_label: "completions",
    cascade: true,
};

pub const BOOK_PROGRESS_BOOK: LinkDef = LinkDef {
    name: "bookProgressBook",
    on: Namespace::BookProgress,
    label: "book",
    target: Namespace::Books,
    reverse_label: "bookProgress",
    cascade: true,
};

pub const PROJECT_NOTES_PROJECT: LinkDef = LinkDef {
    name: "projectNotesProject",
    on: Namespace::ProjectNotes,
    label: "project",
    target: Namespace::Projects,
    reverse_label: "projectNotes",
    cascade: true,
};

pub const LINKS: &[LinkDef] = &[
    HABIT_COMPLETIONS_HABIT,
    BOOK_PROGRESS_BOOK,
    PROJECT_NOTES_PROJECT,
];

#[must_use]
pub fn find_link(on: Namespace, label: &str) -> Option<&'static LinkDef> {
    LINKS.iter().find(|l| l.on == on && l.label == label)
}

/// Links defined on `on` (outgoing, forward direction).
pub fn links_from(on: Namespace) -> impl Iterator<Item = &'static LinkDef> {
    LINKS.iter().filter(move |l| l.on == on)
}

/// Links pointing at `target` (incoming, read under `reverse_label`).
pub fn links_to(target: Namespace) -> impl Iterator<Item = &'static LinkDef> {
    LINKS.iter().filter(move |l| l.target == target)
}

/// Links pointing at `target` whose sources should be removed with it.
pub fn cascading_links_to(target: Namespace) -> impl Iterator<Item = &'static LinkDef> {
    LINKS.iter().filter(move |l| l.target == target && l.cascade)
}

/// Check every attribute in `attrs` against the namespace definition.
///
/// `null` clears an attribute and is accepted for any known name.
pub fn validate_attrs(namespace: Namespace, attrs: &Map<String, Value>) -> Result<(), StoreError> {
    for (name, value) in attrs {
        let def = namespace
            .attribute(name)
            .ok_or_else(|| StoreError::UnknownAttribute {
                namespace,
                attribute: name.clone(),
            })?;
        let ok = match (def.ty, value) {
            (_, Value::Null)
            | (AttrType::Json, _)
            | (AttrType::String, Value::String(_))
            | (AttrType::Number, Value::Number(_))
            | (AttrType::Boolean, Value::Bool(_)) => true,
            _ => false,
        };
        if !ok {
            return Err(StoreError::Validation {
                namespace,
                attribute: name.clone(),
                reason: format!("expected {:?}, got {value}", def.ty),
            });
        }
    }
    Ok(())
}
