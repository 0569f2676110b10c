//! Validation pattern guards.

use regex::Regex;
use uuid::Uuid;

use appfold_core::{DomainError, DomainResult};

use crate::commands::{AddPattern, DeletePattern, UpdatePattern};
use crate::guards::require;
use crate::state::AppSnapshot;

pub fn can_add(app: &AppSnapshot, cmd: &AddPattern) -> DomainResult<()> {
    if app.patterns().contains_key(&cmd.pattern_id) {
        return Err(DomainError::conflict(format!(
            "pattern {} already exists",
            cmd.pattern_id
        )));
    }
    check_definition(app, None, &cmd.name, &cmd.pattern)
}

pub fn can_update(app: &AppSnapshot, cmd: &UpdatePattern) -> DomainResult<()> {
    if !app.patterns().contains_key(&cmd.pattern_id) {
        return Err(DomainError::not_found(format!("pattern {}", cmd.pattern_id)));
    }
    check_definition(app, Some(cmd.pattern_id), &cmd.name, &cmd.pattern)
}

pub fn can_delete(app: &AppSnapshot, cmd: &DeletePattern) -> DomainResult<()> {
    if !app.patterns().contains_key(&cmd.pattern_id) {
        return Err(DomainError::not_found(format!("pattern {}", cmd.pattern_id)));
    }
    Ok(())
}

/// Shared checks for add and update; `current` is excluded from the uniqueness scan.
fn check_definition(
    app: &AppSnapshot,
    current: Option<Uuid>,
    name: &str,
    pattern: &str,
) -> DomainResult<()> {
    require(name, "pattern name")?;
    require(pattern, "pattern")?;

    Regex::new(pattern)
        .map_err(|e| DomainError::validation(format!("pattern is not a valid regex: {e}")))?;

    for (id, existing) in app.patterns() {
        if Some(*id) == current {
            continue;
        }
        if existing.name == name {
            return Err(DomainError::validation(format!(
                "a pattern named '{name}' already exists"
            )));
        }
        if existing.pattern == pattern {
            return Err(DomainError::validation("this pattern already exists under another name"));
        }
    }
    Ok(())
}
