//! Command routing for the app aggregate.
//!
//! `AppCommandHandler` is the only place app commands are interpreted. Each arm of
//! the routing match runs that command's guards and, if they pass, builds the event
//! batch through [`Emitter`]. The controller commits the batch and folds it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use appfold_core::{AggregateId, DomainError, NamedId};
use appfold_events::{CommandHandler, Decision, HandlerError};

use crate::commands::{AppCommand, AppCommandKind, ChangePlan};
use crate::emit::Emitter;
use crate::events::AppEvent;
use crate::guards;
use crate::model::AppId;
use crate::options::AppOptions;
use crate::services::{BillingManager, PlanChangeResult, PlanProvider, UserResolver};
use crate::state::AppSnapshot;

/// Value returned to the caller of an accepted command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommandOutput {
    Completed,
    /// The billing result of a plan change, returned untouched whether or not an
    /// event was committed.
    PlanChange(PlanChangeResult),
}

pub struct AppCommandHandler {
    options: AppOptions,
    plans: Arc<dyn PlanProvider>,
    billing: Arc<dyn BillingManager>,
    users: Arc<dyn UserResolver>,
}

impl AppCommandHandler {
    pub fn new(
        options: AppOptions,
        plans: Arc<dyn PlanProvider>,
        billing: Arc<dyn BillingManager>,
        users: Arc<dyn UserResolver>,
    ) -> Self {
        Self {
            options,
            plans,
            billing,
            users,
        }
    }

    async fn change_plan(
        &self,
        app: &AppSnapshot,
        command: &AppCommand,
        cmd: ChangePlan,
    ) -> Result<Decision<AppEvent, AppCommandOutput>, HandlerError> {
        guards::plans::can_change(app, &cmd, &command.actor, self.plans.as_ref()).await?;

        let app_id = app.named_id();
        let result = self
            .billing
            .change_plan(&command.actor, &app_id, &cmd.plan_id)
            .await
            .map_err(|e| HandlerError::dependency("billing", e.to_string()))?;

        if !result.authorizes_commit() {
            info!(
                app = %app_id,
                plan_id = %cmd.plan_id,
                result = ?result,
                follow_up = ?result.follow_up(),
                "plan change not confirmed by billing, nothing committed"
            );
            return Ok(Decision::nothing(AppCommandOutput::PlanChange(result)));
        }

        let event = self.plan_event(&app_id, command, cmd);
        Ok(Decision::emit(vec![event], AppCommandOutput::PlanChange(result)))
    }

    /// Moving to the free plan clears the plan instead of recording it.
    fn plan_event(&self, app_id: &NamedId<AppId>, command: &AppCommand, cmd: ChangePlan) -> AppEvent {
        let emit = Emitter::new(app_id, &command.actor);
        if self.plans.is_free_plan(&cmd.plan_id) {
            emit.plan_reset()
        } else {
            emit.plan_changed(cmd)
        }
    }
}

fn completed(events: Vec<AppEvent>) -> Result<Decision<AppEvent, AppCommandOutput>, HandlerError> {
    Ok(Decision::emit(events, AppCommandOutput::Completed))
}

#[async_trait]
impl CommandHandler for AppCommandHandler {
    type State = AppSnapshot;
    type Cmd = AppCommand;
    type Output = AppCommandOutput;

    fn aggregate_type(&self) -> &'static str {
        "apps.app"
    }

    fn empty_state(&self, id: AggregateId) -> AppSnapshot {
        AppSnapshot::empty(AppId(id))
    }

    async fn handle(
        &self,
        app: &AppSnapshot,
        command: AppCommand,
    ) -> Result<Decision<AppEvent, AppCommandOutput>, HandlerError> {
        // Every command except creation needs an existing, unarchived app.
        if !matches!(command.kind, AppCommandKind::CreateApp(_)) {
            guards::app::ensure_active(app)?;
        }
        let app_id = app.named_id();
        let emit = Emitter::new(&app_id, &command.actor);

        match command.kind.clone() {
            AppCommandKind::CreateApp(cmd) => {
                guards::app::can_create(app, &cmd, &command.actor)?;
                let creator = command
                    .actor
                    .user_id()
                    .ok_or_else(|| DomainError::validation("apps can only be created by users"))?;

                let app_id = NamedId::new(app.app_id(), cmd.name);
                let batch =
                    Emitter::new(&app_id, &command.actor).created_batch(creator, &self.options);
                completed(batch)
            }
            AppCommandKind::UpdateApp(cmd) => completed(vec![emit.updated(cmd)]),
            AppCommandKind::ArchiveApp => completed(vec![emit.archived()]),
            AppCommandKind::AssignContributor(cmd) => {
                let user = guards::contributors::can_assign(
                    app,
                    &cmd,
                    &command.actor,
                    self.users.as_ref(),
                    self.plans.as_ref(),
                )
                .await?;
                completed(vec![emit.contributor_assigned(user.id, cmd.permission)])
            }
            AppCommandKind::RemoveContributor(cmd) => {
                guards::contributors::can_remove(app, &cmd)?;
                completed(vec![emit.contributor_removed(cmd)])
            }
            AppCommandKind::AttachClient(cmd) => {
                guards::clients::can_attach(app, &cmd)?;
                completed(vec![emit.client_attached(cmd)])
            }
            AppCommandKind::UpdateClient(cmd) => {
                guards::clients::can_update(app, &cmd)?;
                completed(vec![emit.client_updated(cmd)])
            }
            AppCommandKind::RevokeClient(cmd) => {
                guards::clients::can_revoke(app, &cmd)?;
                completed(vec![emit.client_revoked(cmd)])
            }
            AppCommandKind::AddLanguage(cmd) => {
                guards::languages::can_add(app, &cmd)?;
                completed(vec![emit.language_added_by(cmd)])
            }
            AppCommandKind::RemoveLanguage(cmd) => {
                guards::languages::can_remove(app, &cmd)?;
                completed(vec![emit.language_removed(cmd)])
            }
            AppCommandKind::UpdateLanguage(cmd) => {
                guards::languages::can_update(app, &cmd)?;
                completed(vec![emit.language_updated(cmd)])
            }
            AppCommandKind::AddPattern(cmd) => {
                guards::patterns::can_add(app, &cmd)?;
                completed(vec![emit.pattern_added_by(cmd)])
            }
            AppCommandKind::UpdatePattern(cmd) => {
                guards::patterns::can_update(app, &cmd)?;
                completed(vec![emit.pattern_updated(cmd)])
            }
            AppCommandKind::DeletePattern(cmd) => {
                guards::patterns::can_delete(app, &cmd)?;
                completed(vec![emit.pattern_deleted(cmd)])
            }
            AppCommandKind::ChangePlan(cmd) => self.change_plan(app, &command, cmd).await,
            AppCommandKind::ConfirmPlanChange(cmd) => {
                // Settled out-of-band by billing: no guard, no billing call.
                let event = self.plan_event(&app_id, &command, cmd);
                Ok(Decision::emit(
                    vec![event],
                    AppCommandOutput::PlanChange(PlanChangeResult::Changed),
                ))
            }
        }
    }
}
