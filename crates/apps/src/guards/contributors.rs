//! Contributor guards.

use appfold_core::{Actor, DomainError, DomainResult};
use appfold_events::HandlerError;

use crate::commands::{AssignContributor, RemoveContributor};
use crate::guards::require;
use crate::model::ContributorPermission;
use crate::services::{PlanProvider, UserInfo, UserResolver};
use crate::state::AppSnapshot;

/// Validate an assignment and resolve the contributor to a known user.
pub async fn can_assign(
    app: &AppSnapshot,
    cmd: &AssignContributor,
    actor: &Actor,
    users: &dyn UserResolver,
    plans: &dyn PlanProvider,
) -> Result<UserInfo, HandlerError> {
    require(&cmd.contributor, "contributor id or email")?;

    let user = users
        .resolve(&cmd.contributor)
        .await
        .map_err(|e| HandlerError::dependency("users", e.to_string()))?
        .ok_or_else(|| DomainError::not_found(format!("user '{}'", cmd.contributor)))?;

    if actor.user_id() == Some(user.id) {
        return Err(DomainError::validation("you cannot change your own permission").into());
    }

    match app.contributors().get(&user.id) {
        Some(current) if *current == cmd.permission => {
            return Err(DomainError::validation("contributor already has this permission").into());
        }
        Some(ContributorPermission::Owner) if app.owner_count() == 1 => {
            return Err(DomainError::invariant("cannot demote the only owner").into());
        }
        Some(_) => {}
        None => {
            let plan = match app.plan() {
                Some(configured) => plans
                    .get_plan(&configured.plan_id)
                    .await
                    .map_err(|e| HandlerError::dependency("plans", e.to_string()))?
                    .unwrap_or_else(|| plans.free_plan()),
                None => plans.free_plan(),
            };

            if let Some(max) = plan.max_contributors {
                if app.contributors().len() >= max {
                    return Err(DomainError::validation(format!(
                        "plan '{}' allows at most {max} contributors",
                        plan.name
                    ))
                    .into());
                }
            }
        }
    }

    Ok(user)
}

pub fn can_remove(app: &AppSnapshot, cmd: &RemoveContributor) -> DomainResult<()> {
    match app.contributors().get(&cmd.contributor_id) {
        None => Err(DomainError::not_found(format!(
            "contributor {}",
            cmd.contributor_id
        ))),
        Some(ContributorPermission::Owner) if app.owner_count() == 1 => {
            Err(DomainError::invariant("cannot remove the only owner"))
        }
        Some(_) => Ok(()),
    }
}
