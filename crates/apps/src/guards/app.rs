//! Lifecycle guards: creation, existence, archival.

use appfold_core::{Actor, DomainError, DomainResult};

use crate::commands::CreateApp;
use crate::guards::{is_slug, require};
use crate::state::AppSnapshot;

pub fn can_create(app: &AppSnapshot, cmd: &CreateApp, actor: &Actor) -> DomainResult<()> {
    if app.is_created() {
        return Err(DomainError::conflict("app already exists"));
    }

    require(&cmd.name, "name")?;
    if !is_slug(&cmd.name) {
        return Err(DomainError::validation(
            "name must contain only lowercase letters, digits and single dashes",
        ));
    }

    // The creator becomes the first owner, which only a user can be.
    if !actor.is_user() {
        return Err(DomainError::validation("apps can only be created by users"));
    }

    Ok(())
}

/// Every command except creation requires a created, non-archived app.
pub fn ensure_active(app: &AppSnapshot) -> DomainResult<()> {
    if !app.is_created() {
        return Err(DomainError::not_found(format!("app {}", app.app_id())));
    }
    if app.is_archived() {
        return Err(DomainError::invariant("app is archived"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{created_app, user};

    #[test]
    fn create_requires_slug_name() {
        let app = AppSnapshot::empty(crate::test_support::app_named("x").id);
        let actor = Actor::User(user());

        let err = can_create(&app, &CreateApp { name: "My App".into() }, &actor).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = can_create(&app, &CreateApp { name: " ".into() }, &actor).unwrap_err();
        assert_eq!(err, DomainError::validation("name is required"));

        assert!(can_create(&app, &CreateApp { name: "my-app".into() }, &actor).is_ok());
    }

    #[test]
    fn create_rejects_client_actor() {
        let app = AppSnapshot::empty(crate::test_support::app_named("x").id);
        let err = can_create(
            &app,
            &CreateApp { name: "my-app".into() },
            &Actor::Client("cli".into()),
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn create_rejects_existing_app() {
        let (app, owner) = created_app("blog");
        let err = can_create(&app, &CreateApp { name: "blog".into() }, &Actor::User(owner))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn ensure_active_requires_created_app() {
        let app = AppSnapshot::empty(crate::test_support::app_named("x").id);
        assert!(matches!(ensure_active(&app), Err(DomainError::NotFound(_))));

        let (app, _) = created_app("blog");
        assert!(ensure_active(&app).is_ok());
    }
}
