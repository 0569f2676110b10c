//! Event construction.
//!
//! One constructor per event kind. Handlers call these once the guards passed, so
//! every event carries the same app identity and actor header.

use uuid::Uuid;

use appfold_core::{Actor, NamedId, UserId};

use crate::commands::{
    AddLanguage, AddPattern, AttachClient, ChangePlan, DeletePattern, RemoveContributor,
    RemoveLanguage, RevokeClient, UpdateApp, UpdateClient, UpdateLanguage, UpdatePattern,
};
use crate::events::*;
use crate::model::{AppId, ContributorPermission, Language};
use crate::options::AppOptions;

/// Builds events for one app on behalf of one actor.
#[derive(Debug, Clone, Copy)]
pub struct Emitter<'a> {
    app_id: &'a NamedId<AppId>,
    actor: &'a Actor,
}

impl<'a> Emitter<'a> {
    pub fn new(app_id: &'a NamedId<AppId>, actor: &'a Actor) -> Self {
        Self { app_id, actor }
    }

    /// The fixed creation batch, in commit order:
    /// created, creator assigned as owner, default language, then the initial
    /// patterns in configured order.
    pub fn created_batch(&self, creator: UserId, options: &AppOptions) -> Vec<AppEvent> {
        let mut batch = Vec::with_capacity(3 + options.initial_patterns.len());
        batch.push(self.created());
        batch.push(self.contributor_assigned(creator, ContributorPermission::Owner));
        batch.push(self.language_added(options.default_language.clone()));

        for initial in &options.initial_patterns {
            batch.push(self.pattern_added(
                Uuid::now_v7(),
                initial.name.clone(),
                initial.pattern.clone(),
                initial.message.clone(),
            ));
        }
        batch
    }

    pub fn created(&self) -> AppEvent {
        AppEvent::AppCreated(AppCreated {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
        })
    }

    pub fn updated(&self, cmd: UpdateApp) -> AppEvent {
        AppEvent::AppUpdated(AppUpdated {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            label: cmd.label,
            description: cmd.description,
        })
    }

    pub fn archived(&self) -> AppEvent {
        AppEvent::AppArchived(AppArchived {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
        })
    }

    pub fn contributor_assigned(
        &self,
        contributor_id: UserId,
        permission: ContributorPermission,
    ) -> AppEvent {
        AppEvent::AppContributorAssigned(AppContributorAssigned {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            contributor_id,
            permission,
        })
    }

    pub fn contributor_removed(&self, cmd: RemoveContributor) -> AppEvent {
        AppEvent::AppContributorRemoved(AppContributorRemoved {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            contributor_id: cmd.contributor_id,
        })
    }

    pub fn client_attached(&self, cmd: AttachClient) -> AppEvent {
        AppEvent::AppClientAttached(AppClientAttached {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            client_id: cmd.client_id,
            secret: cmd.secret,
        })
    }

    pub fn client_updated(&self, cmd: UpdateClient) -> AppEvent {
        AppEvent::AppClientUpdated(AppClientUpdated {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            client_id: cmd.client_id,
            name: cmd.name,
            permission: cmd.permission,
        })
    }

    pub fn client_revoked(&self, cmd: RevokeClient) -> AppEvent {
        AppEvent::AppClientRevoked(AppClientRevoked {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            client_id: cmd.client_id,
        })
    }

    pub fn language_added(&self, language: Language) -> AppEvent {
        AppEvent::AppLanguageAdded(AppLanguageAdded {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            language,
        })
    }

    pub fn language_added_by(&self, cmd: AddLanguage) -> AppEvent {
        self.language_added(cmd.language)
    }

    pub fn language_removed(&self, cmd: RemoveLanguage) -> AppEvent {
        AppEvent::AppLanguageRemoved(AppLanguageRemoved {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            language: cmd.language,
        })
    }

    pub fn language_updated(&self, cmd: UpdateLanguage) -> AppEvent {
        AppEvent::AppLanguageUpdated(AppLanguageUpdated {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            language: cmd.language,
            is_optional: cmd.is_optional,
            is_master: cmd.is_master,
            fallback: cmd.fallback,
        })
    }

    pub fn pattern_added(
        &self,
        pattern_id: Uuid,
        name: String,
        pattern: String,
        message: Option<String>,
    ) -> AppEvent {
        AppEvent::AppPatternAdded(AppPatternAdded {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            pattern_id,
            name,
            pattern,
            message,
        })
    }

    pub fn pattern_added_by(&self, cmd: AddPattern) -> AppEvent {
        self.pattern_added(cmd.pattern_id, cmd.name, cmd.pattern, cmd.message)
    }

    pub fn pattern_updated(&self, cmd: UpdatePattern) -> AppEvent {
        AppEvent::AppPatternUpdated(AppPatternUpdated {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            pattern_id: cmd.pattern_id,
            name: cmd.name,
            pattern: cmd.pattern,
            message: cmd.message,
        })
    }

    pub fn pattern_deleted(&self, cmd: DeletePattern) -> AppEvent {
        AppEvent::AppPatternDeleted(AppPatternDeleted {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            pattern_id: cmd.pattern_id,
        })
    }

    pub fn plan_changed(&self, cmd: ChangePlan) -> AppEvent {
        AppEvent::AppPlanChanged(AppPlanChanged {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
            plan_id: cmd.plan_id,
        })
    }

    pub fn plan_reset(&self) -> AppEvent {
        AppEvent::AppPlanReset(AppPlanReset {
            app_id: self.app_id.clone(),
            actor: self.actor.clone(),
        })
    }
}
