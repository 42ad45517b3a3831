//! Mapping between domain types and service records.
//!
//! Field names follow the hosted table layout (`Name`, `Tags`, `due_date`,
//! ...). Decoding is lenient: missing or unrecognized values fall back to
//! defaults rather than failing, except for a task without any title.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use super::types::{Fields, Record, ServiceError};
use crate::model::{parse_tags, Category, CategoryColor, CategoryIcon, Priority, Task, GENERAL_CATEGORY};

/// Wire value for a checked "completed" box; unchecked is the empty string.
const COMPLETED_MARK: &str = "completed";

// ============================================================================
// Tasks
// ============================================================================

/// Encode every writable task field. The id is not part of the field map.
pub fn task_to_fields(task: &Task) -> Fields {
    let mut fields = Fields::new();
    fields.insert("Name".into(), Value::from(task.title.as_str()));
    fields.insert("title".into(), Value::from(task.title.as_str()));
    fields.insert("description".into(), Value::from(task.description.as_str()));
    fields.insert(
        "completed".into(),
        Value::from(if task.completed { COMPLETED_MARK } else { "" }),
    );
    fields.insert("priority".into(), Value::from(task.priority.as_str()));
    fields.insert(
        "due_date".into(),
        Value::from(task.due_date.format("%Y-%m-%d").to_string()),
    );
    fields.insert("category".into(), Value::from(task.category.as_str()));
    fields.insert("Tags".into(), Value::from(task.tags.join(",")));
    fields.insert("created_at".into(), Value::from(task.created_at.to_rfc3339()));
    fields.insert("updated_at".into(), Value::from(task.updated_at.to_rfc3339()));
    fields
}

/// Decode a task record.
///
/// Fails only when neither `title` nor `Name` carries text.
pub fn task_from_record(record: &Record) -> Result<Task, ServiceError> {
    let title = record
        .str_field("title")
        .or_else(|| record.str_field("Name"))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ServiceError::Malformed(format!("task {} has no title", record.id)))?
        .to_string();

    let now = Utc::now();
    let created_at = record
        .str_field("created_at")
        .or_else(|| record.str_field("CreatedOn"))
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let updated_at = record
        .str_field("updated_at")
        .or_else(|| record.str_field("ModifiedOn"))
        .and_then(parse_timestamp)
        .unwrap_or(created_at);
    let due_date = record
        .str_field("due_date")
        .and_then(parse_date)
        .unwrap_or_else(|| created_at.date_naive());

    Ok(Task {
        id: record.id.clone(),
        title,
        description: record.str_field("description").unwrap_or_default().to_string(),
        completed: parse_checkbox(record.fields.get("completed")),
        priority: record
            .str_field("priority")
            .and_then(|p| p.parse().ok())
            .unwrap_or(Priority::Medium),
        due_date,
        category: record
            .str_field("category")
            .unwrap_or(GENERAL_CATEGORY)
            .to_string(),
        tags: parse_tag_value(record.fields.get("Tags")),
        created_at,
        updated_at,
    })
}

fn parse_checkbox(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            let s = s.to_lowercase();
            s.contains(COMPLETED_MARK) || s.contains("true")
        }
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

fn parse_tag_value(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => parse_tags(s),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// Accepts `YYYY-MM-DD` or anything starting with it (e.g. an RFC 3339 timestamp).
fn parse_date(s: &str) -> Option<NaiveDate> {
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Accepts RFC 3339 or SQLite's `YYYY-MM-DD HH:MM:SS` (taken as UTC).
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ============================================================================
// Categories
// ============================================================================

pub fn category_to_fields(name: &str, icon: CategoryIcon, color: CategoryColor) -> Fields {
    let mut fields = Fields::new();
    fields.insert("Name".into(), Value::from(name));
    fields.insert("icon".into(), Value::from(icon.as_str()));
    fields.insert("color".into(), Value::from(color.token()));
    fields
}

pub fn category_from_record(record: &Record) -> Category {
    Category {
        id: record.id.clone(),
        name: record.str_field("Name").unwrap_or_default().to_string(),
        icon: record
            .str_field("icon")
            .and_then(|i| i.parse().ok())
            .unwrap_or_default(),
        color: record
            .str_field("color")
            .and_then(CategoryColor::from_token)
            .unwrap_or_default(),
    }
}

/// Record ids arrive as strings or numbers depending on the backend.
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
