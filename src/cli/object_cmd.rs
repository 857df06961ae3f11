//! Object CLI commands: create, inspect and edit

use anyhow::Result;

use super::output::Output;
use crate::domain::{ObjectKind, ObjectStatus, Priority, TrellisObject};
use crate::engine::{CreateRequest, UpdatePatch};
use crate::storage::{ObjectQuery, Project};

pub struct CreateArgs {
    pub kind: ObjectKind,
    pub title: String,
    pub parent: Option<String>,
    pub priority: Priority,
    pub status: ObjectStatus,
    pub prerequisites: Vec<String>,
    pub body: String,
    pub id: Option<String>,
}

pub struct ListArgs {
    pub kind: Option<ObjectKind>,
    pub status: Option<ObjectStatus>,
    pub priority: Option<Priority>,
    pub scope: Option<String>,
    pub include_closed: bool,
}

pub fn create(project: &Project, output: &Output, args: CreateArgs) -> Result<()> {
    let request = CreateRequest {
        kind: args.kind,
        title: args.title,
        parent: args.parent,
        priority: args.priority,
        status: args.status,
        prerequisites: args.prerequisites,
        body: args.body,
        id: args.id,
    };

    let object = project.engine().create_object(&request).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        output.success(&format!("Created {}: {} - {}", object.kind, object.id, object.title));
    }

    Ok(())
}

pub fn show(project: &Project, output: &Output, id: &str) -> Result<()> {
    let object = project.engine().get_object(id).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        print_object(&object);
    }

    Ok(())
}

pub fn list(project: &Project, output: &Output, args: ListArgs) -> Result<()> {
    let mut query = ObjectQuery::default()
        .include_closed(args.include_closed || args.status.is_some_and(|s| s.is_closed()))
        .scope(args.scope.as_deref());
    query.kind = args.kind;
    query.status = args.status;
    query.priority = args.priority;

    let objects = project.engine().list_objects(&query).into_result()?;

    if output.is_json() {
        output.data(&objects);
    } else if objects.is_empty() {
        println!("No objects");
    } else {
        print_table(&objects);
    }

    Ok(())
}

pub fn next(project: &Project, output: &Output, kind: Option<ObjectKind>, scope: Option<&str>) -> Result<()> {
    let object = project.engine().next_available(kind, scope).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        println!("{}  [{}]  {}", object.id, object.priority, object.title);
    }

    Ok(())
}

pub fn update(project: &Project, output: &Output, id: &str, patch: &UpdatePatch, force: bool) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("Nothing to update for {}", id);
    }

    let object = project.engine().update_object(id, patch, force).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        output.success(&format!("Updated {} ({})", object.id, object.status));
    }

    Ok(())
}

pub fn log(project: &Project, output: &Output, id: &str, entry: &str) -> Result<()> {
    let object = project.engine().append_object_log(id, entry).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        output.success(&format!("Logged to {} ({} entries)", object.id, object.log.len()));
    }

    Ok(())
}

pub fn files(project: &Project, output: &Output, id: &str, files: &[(String, String)]) -> Result<()> {
    let object = project.engine().append_affected_files(id, files).into_result()?;

    if output.is_json() {
        output.data(&object);
    } else {
        output.success(&format!("Recorded {} file(s) on {}", files.len(), object.id));
    }

    Ok(())
}

fn print_table(objects: &[TrellisObject]) {
    println!("{:<28} {:<8} {:<12} {:<8} TITLE", "ID", "TYPE", "STATUS", "PRIORITY");
    println!("{}", "-".repeat(80));

    for object in objects {
        println!(
            "{:<28} {:<8} {:<12} {:<8} {}",
            object.id, object.kind, object.status, object.priority, object.title
        );
    }
}

fn print_object(object: &TrellisObject) {
    println!("{}: {}", object.id, object.title);
    println!("Type: {}", object.kind);
    println!("Status: {}", object.status);
    println!("Priority: {}", object.priority);
    if let Some(parent) = &object.parent {
        println!("Parent: {}", parent);
    }
    println!("Created: {}", object.created);
    println!("Updated: {}", object.updated);

    if !object.prerequisites.is_empty() {
        println!("\nPrerequisites:");
        for id in &object.prerequisites {
            println!("  {}", id);
        }
    }

    if !object.children_ids.is_empty() {
        println!("\nChildren:");
        for id in &object.children_ids {
            println!("  {}", id);
        }
    }

    if !object.affected_files.is_empty() {
        println!("\nAffected files:");
        for (path, description) in &object.affected_files {
            println!("  {}: {}", path, description);
        }
    }

    if !object.log.is_empty() {
        println!("\nLog:");
        for entry in &object.log {
            println!("  - {}", entry.replace('\n', "\n    "));
        }
    }

    if !object.body.trim().is_empty() {
        println!("\n{}", object.body.trim_end());
    }
}
