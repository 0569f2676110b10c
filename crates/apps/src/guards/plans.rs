//! Plan change eligibility.

use appfold_core::{Actor, DomainError};
use appfold_events::HandlerError;

use crate::commands::ChangePlan;
use crate::guards::require;
use crate::services::PlanProvider;
use crate::state::AppSnapshot;

/// Checks a user-initiated plan change. The billing callback path skips this.
pub async fn can_change(
    app: &AppSnapshot,
    cmd: &ChangePlan,
    actor: &Actor,
    plans: &dyn PlanProvider,
) -> Result<(), HandlerError> {
    require(&cmd.plan_id, "plan id")?;

    if let Some(current) = app.plan() {
        if current.owner != *actor {
            return Err(DomainError::validation(
                "plan can only be changed by the actor who configured it",
            )
            .into());
        }
        if current.plan_id == cmd.plan_id {
            return Err(DomainError::validation("app is already on this plan").into());
        }
    }

    if plans.is_free_plan(&cmd.plan_id) {
        return Ok(());
    }

    let known = plans
        .get_plan(&cmd.plan_id)
        .await
        .map_err(|e| HandlerError::dependency("plans", e.to_string()))?;
    if known.is_none() {
        return Err(DomainError::validation(format!(
            "a plan with id '{}' does not exist",
            cmd.plan_id
        ))
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{AppEvent, AppPlanChanged};
    use crate::services::{PlanInfo, StaticPlanProvider};
    use crate::test_support::{FailingPlans, created_app, user};
    use appfold_core::Aggregate;

    fn provider() -> StaticPlanProvider {
        StaticPlanProvider::new(
            PlanInfo {
                id: "free".into(),
                name: "Free".into(),
                max_contributors: Some(2),
            },
            vec![PlanInfo {
                id: "pro".into(),
                name: "Pro".into(),
                max_contributors: None,
            }],
        )
    }

    fn change(plan_id: &str) -> ChangePlan {
        ChangePlan {
            plan_id: plan_id.into(),
        }
    }

    #[tokio::test]
    async fn known_plan_is_accepted() {
        let (app, owner) = created_app("blog");
        let result = can_change(&app, &change("pro"), &Actor::User(owner), &provider()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_plan_is_rejected() {
        let (app, owner) = created_app("blog");
        let err = can_change(&app, &change("gold"), &Actor::User(owner), &provider())
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Domain(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn blank_plan_is_rejected() {
        let (app, owner) = created_app("blog");
        let err = can_change(&app, &change(""), &Actor::User(owner), &provider())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HandlerError::Domain(DomainError::validation("plan id is required"))
        );
    }

    #[tokio::test]
    async fn only_plan_owner_may_change_it() {
        let (mut app, owner) = created_app("blog");
        app.apply(&AppEvent::AppPlanChanged(AppPlanChanged {
            app_id: app.named_id(),
            actor: Actor::User(owner),
            plan_id: "pro".into(),
        }));

        let other = Actor::User(user());
        assert!(can_change(&app, &change("free"), &other, &provider()).await.is_err());
        assert!(
            can_change(&app, &change("free"), &Actor::User(owner), &provider())
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn same_plan_is_rejected() {
        let (mut app, owner) = created_app("blog");
        app.apply(&AppEvent::AppPlanChanged(AppPlanChanged {
            app_id: app.named_id(),
            actor: Actor::User(owner),
            plan_id: "pro".into(),
        }));

        let err = can_change(&app, &change("pro"), &Actor::User(owner), &provider())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            HandlerError::Domain(DomainError::validation("app is already on this plan"))
        );
    }

    #[tokio::test]
    async fn provider_failure_is_a_dependency_error() {
        let (app, owner) = created_app("blog");
        let err = can_change(&app, &change("pro"), &Actor::User(owner), &FailingPlans)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::Dependency { service: "plans", .. }));
    }
}
