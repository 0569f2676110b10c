//! API client guards.

use appfold_core::{DomainError, DomainResult};

use crate::commands::{AttachClient, RevokeClient, UpdateClient};
use crate::guards::{is_slug, require};
use crate::state::AppSnapshot;

pub fn can_attach(app: &AppSnapshot, cmd: &AttachClient) -> DomainResult<()> {
    require(&cmd.client_id, "client id")?;
    if !is_slug(&cmd.client_id) {
        return Err(DomainError::validation(
            "client id must contain only lowercase letters, digits and single dashes",
        ));
    }
    require(&cmd.secret, "client secret")?;

    if app.clients().contains_key(&cmd.client_id) {
        return Err(DomainError::conflict(format!(
            "client '{}' already exists",
            cmd.client_id
        )));
    }
    Ok(())
}

pub fn can_update(app: &AppSnapshot, cmd: &UpdateClient) -> DomainResult<()> {
    if !app.clients().contains_key(&cmd.client_id) {
        return Err(DomainError::not_found(format!("client '{}'", cmd.client_id)));
    }

    if cmd.name.is_none() && cmd.permission.is_none() {
        return Err(DomainError::validation("either name or permission must be defined"));
    }

    if let Some(name) = &cmd.name {
        require(name, "client name")?;

        let taken = app
            .clients()
            .iter()
            .any(|(id, client)| id != &cmd.client_id && client.name == *name);
        if taken {
            return Err(DomainError::validation(format!(
                "a client with name '{name}' already exists"
            )));
        }
    }
    Ok(())
}

pub fn can_revoke(app: &AppSnapshot, cmd: &RevokeClient) -> DomainResult<()> {
    if !app.clients().contains_key(&cmd.client_id) {
        return Err(DomainError::not_found(format!("client '{}'", cmd.client_id)));
    }
    Ok(())
}
