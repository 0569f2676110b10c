//! Language configuration guards.

use appfold_core::{DomainError, DomainResult};

use crate::commands::{AddLanguage, RemoveLanguage, UpdateLanguage};
use crate::state::AppSnapshot;

pub fn can_add(app: &AppSnapshot, cmd: &AddLanguage) -> DomainResult<()> {
    if app.languages().contains(&cmd.language) {
        return Err(DomainError::validation(format!(
            "language '{}' has already been added",
            cmd.language
        )));
    }
    Ok(())
}

pub fn can_remove(app: &AppSnapshot, cmd: &RemoveLanguage) -> DomainResult<()> {
    let languages = app.languages();
    if !languages.contains(&cmd.language) {
        return Err(DomainError::not_found(format!("language '{}'", cmd.language)));
    }
    if languages.is_master(&cmd.language) {
        return Err(DomainError::validation("master language cannot be removed"));
    }
    Ok(())
}

pub fn can_update(app: &AppSnapshot, cmd: &UpdateLanguage) -> DomainResult<()> {
    let languages = app.languages();
    if !languages.contains(&cmd.language) {
        return Err(DomainError::not_found(format!("language '{}'", cmd.language)));
    }

    let becomes_master = cmd.is_master || languages.is_master(&cmd.language);
    if becomes_master && cmd.is_optional {
        return Err(DomainError::validation("master language cannot be made optional"));
    }

    if cmd.fallback.contains(&cmd.language) {
        return Err(DomainError::validation("language cannot fall back to itself"));
    }

    if let Some(unknown) = cmd.fallback.iter().find(|f| !languages.contains(f)) {
        return Err(DomainError::validation(format!(
            "fallback language '{unknown}' is not configured"
        )));
    }

    Ok(())
}
