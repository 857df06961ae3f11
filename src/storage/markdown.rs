//! Markdown document codec
//!
//! Each object is stored as one markdown file: a YAML front-matter block
//! between two `---` lines, a blank line, then the free-form body.
//!
//! ```text
//! ---
//! id: T-add-button
//! title: Add button
//! status: open
//! priority: high
//! parent: F-login-form
//! prerequisites: []
//! affectedFiles: {}
//! log: []
//! schema: '1.0'
//! childrenIds: []
//! created: 2025-01-01T00:00:00.000Z
//! updated: 2025-01-01T00:00:00.000Z
//! ---
//!
//! Body text...
//! ```
//!
//! `type` and `body` never appear in the front matter.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_yaml::{Mapping, Value};

use crate::domain::{ObjectKind, ObjectStatus, Priority, TrellisObject};
use crate::error::{Result, TrellisError};

/// Written in place of an absent parent
const NO_PARENT: &str = "none";

const DELIMITER: &str = "---";

/// Represents the front-matter section of an object file
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Frontmatter<'a> {
    id: &'a str,
    title: &'a str,
    status: ObjectStatus,
    priority: Priority,
    parent: &'a str,
    prerequisites: &'a [String],
    affected_files: &'a BTreeMap<String, String>,
    log: &'a [String],
    schema: &'a str,
    children_ids: &'a [String],
    created: &'a str,
    updated: &'a str,
}

impl<'a> From<&'a TrellisObject> for Frontmatter<'a> {
    fn from(object: &'a TrellisObject) -> Self {
        Self {
            id: &object.id,
            title: &object.title,
            status: object.status,
            priority: object.priority,
            parent: object.parent.as_deref().unwrap_or(NO_PARENT),
            prerequisites: &object.prerequisites,
            affected_files: &object.affected_files,
            log: &object.log,
            schema: &object.schema,
            children_ids: &object.children_ids,
            created: &object.created,
            updated: &object.updated,
        }
    }
}

/// Renders an object to its markdown document
pub fn render_document(object: &TrellisObject) -> Result<String> {
    let yaml = serde_yaml::to_string(&Frontmatter::from(object))
        .map_err(|e| TrellisError::Format(format!("Failed to serialize front matter: {}", e)))?;

    let mut content = String::with_capacity(yaml.len() + object.body.len() + 10);
    content.push_str(DELIMITER);
    content.push('\n');
    content.push_str(&yaml);
    if !yaml.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(DELIMITER);
    content.push_str("\n\n");
    content.push_str(&object.body);

    Ok(content)
}

/// Splits a document into its front matter and body
fn split_document(content: &str) -> Result<(&str, &str)> {
    let first_line_end = content.find('\n').unwrap_or(content.len());
    if content[..first_line_end].trim_end_matches('\r') != DELIMITER {
        return Err(TrellisError::Format(
            "Missing front matter (document must start with ---)".to_string(),
        ));
    }

    let rest = content.get(first_line_end + 1..).unwrap_or("");
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == DELIMITER {
            let yaml = &rest[..offset];
            let after = &rest[offset + line.len()..];
            let body = after
                .strip_prefix("\r\n")
                .or_else(|| after.strip_prefix('\n'))
                .unwrap_or(after);
            return Ok((yaml, body));
        }
        offset += line.len();
    }

    Err(TrellisError::Format(
        "Missing front matter end delimiter (---)".to_string(),
    ))
}

fn required_str<'a>(fm: &'a Mapping, field: &str) -> Result<&'a str> {
    fm.get(field).and_then(Value::as_str).ok_or_else(|| {
        TrellisError::Validation(format!("Missing or invalid required field: {}", field))
    })
}

fn string_list(fm: &Mapping, field: &str) -> Vec<String> {
    match fm.get(field) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn string_map(fm: &Mapping, field: &str) -> BTreeMap<String, String> {
    match fm.get(field) {
        Some(Value::Mapping(entries)) => entries
            .iter()
            .filter_map(|(k, v)| Some((k.as_str()?.to_string(), v.as_str()?.to_string())))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Parses a markdown document into an object
pub fn parse_document(content: &str) -> Result<TrellisObject> {
    let (yaml, body) = split_document(content)?;

    let value: Value = serde_yaml::from_str(yaml)
        .map_err(|e| TrellisError::Format(format!("Failed to parse front matter: {}", e)))?;
    let Value::Mapping(fm) = value else {
        return Err(TrellisError::Format(
            "Front matter is not a key/value document".to_string(),
        ));
    };

    // The id decides the kind, so it is validated before anything else
    let id = required_str(&fm, "id")?;
    let kind = ObjectKind::from_id(id)?;

    let title = required_str(&fm, "title")?;
    let status = required_str(&fm, "status")?;
    let priority = required_str(&fm, "priority")?;
    let schema = required_str(&fm, "schema")?;
    let created = required_str(&fm, "created")?;
    let updated = required_str(&fm, "updated")?;

    let status: ObjectStatus = status.parse().map_err(TrellisError::Validation)?;
    let priority: Priority = priority.parse().map_err(TrellisError::Validation)?;

    let parent = fm
        .get("parent")
        .and_then(Value::as_str)
        .filter(|p| !p.is_empty() && *p != NO_PARENT)
        .map(str::to_string);

    Ok(TrellisObject {
        id: id.to_string(),
        kind,
        title: title.to_string(),
        status,
        priority,
        parent,
        prerequisites: string_list(&fm, "prerequisites"),
        affected_files: string_map(&fm, "affectedFiles"),
        log: string_list(&fm, "log"),
        schema: schema.to_string(),
        children_ids: string_list(&fm, "childrenIds"),
        created: created.to_string(),
        updated: updated.to_string(),
        body: body.to_string(),
    })
}
