//! Domain events emitted by the app aggregate.
//!
//! Every event carries the app identity and the acting principal. Events are
//! facts: they are never re-ordered or edited once committed.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appfold_core::{Actor, NamedId, UserId};
use appfold_events::Event;

use crate::model::{AppId, ClientPermission, ContributorPermission, Language};

/// Event: AppCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCreated {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
}

/// Event: AppUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUpdated {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub label: Option<String>,
    pub description: Option<String>,
}

/// Event: AppArchived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppArchived {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
}

/// Event: AppContributorAssigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppContributorAssigned {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub contributor_id: UserId,
    pub permission: ContributorPermission,
}

/// Event: AppContributorRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppContributorRemoved {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub contributor_id: UserId,
}

/// Event: AppClientAttached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClientAttached {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub client_id: String,
    pub secret: String,
}

/// Event: AppClientUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClientUpdated {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub client_id: String,
    pub name: Option<String>,
    pub permission: Option<ClientPermission>,
}

/// Event: AppClientRevoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClientRevoked {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub client_id: String,
}

/// Event: AppLanguageAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLanguageAdded {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub language: Language,
}

/// Event: AppLanguageRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLanguageRemoved {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub language: Language,
}

/// Event: AppLanguageUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppLanguageUpdated {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub language: Language,
    pub is_optional: bool,
    pub is_master: bool,
    pub fallback: Vec<Language>,
}

/// Event: AppPatternAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPatternAdded {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub pattern_id: Uuid,
    pub name: String,
    pub pattern: String,
    pub message: Option<String>,
}

/// Event: AppPatternUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPatternUpdated {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub pattern_id: Uuid,
    pub name: String,
    pub pattern: String,
    pub message: Option<String>,
}

/// Event: AppPatternDeleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPatternDeleted {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub pattern_id: Uuid,
}

/// Event: AppPlanChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPlanChanged {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
    pub plan_id: String,
}

/// Event: AppPlanReset (moved back to the free plan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPlanReset {
    pub app_id: NamedId<AppId>,
    pub actor: Actor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppEvent {
    AppCreated(AppCreated),
    AppUpdated(AppUpdated),
    AppArchived(AppArchived),
    AppContributorAssigned(AppContributorAssigned),
    AppContributorRemoved(AppContributorRemoved),
    AppClientAttached(AppClientAttached),
    AppClientUpdated(AppClientUpdated),
    AppClientRevoked(AppClientRevoked),
    AppLanguageAdded(AppLanguageAdded),
    AppLanguageRemoved(AppLanguageRemoved),
    AppLanguageUpdated(AppLanguageUpdated),
    AppPatternAdded(AppPatternAdded),
    AppPatternUpdated(AppPatternUpdated),
    AppPatternDeleted(AppPatternDeleted),
    AppPlanChanged(AppPlanChanged),
    AppPlanReset(AppPlanReset),
}

impl AppEvent {
    /// Identity of the app the event belongs to.
    pub fn app_id(&self) -> &NamedId<AppId> {
        self.header().0
    }

    /// Principal who caused the event.
    pub fn actor(&self) -> &Actor {
        self.header().1
    }

    fn header(&self) -> (&NamedId<AppId>, &Actor) {
        match self {
            AppEvent::AppCreated(e) => (&e.app_id, &e.actor),
            AppEvent::AppUpdated(e) => (&e.app_id, &e.actor),
            AppEvent::AppArchived(e) => (&e.app_id, &e.actor),
            AppEvent::AppContributorAssigned(e) => (&e.app_id, &e.actor),
            AppEvent::AppContributorRemoved(e) => (&e.app_id, &e.actor),
            AppEvent::AppClientAttached(e) => (&e.app_id, &e.actor),
            AppEvent::AppClientUpdated(e) => (&e.app_id, &e.actor),
            AppEvent::AppClientRevoked(e) => (&e.app_id, &e.actor),
            AppEvent::AppLanguageAdded(e) => (&e.app_id, &e.actor),
            AppEvent::AppLanguageRemoved(e) => (&e.app_id, &e.actor),
            AppEvent::AppLanguageUpdated(e) => (&e.app_id, &e.actor),
            AppEvent::AppPatternAdded(e) => (&e.app_id, &e.actor),
            AppEvent::AppPatternUpdated(e) => (&e.app_id, &e.actor),
            AppEvent::AppPatternDeleted(e) => (&e.app_id, &e.actor),
            AppEvent::AppPlanChanged(e) => (&e.app_id, &e.actor),
            AppEvent::AppPlanReset(e) => (&e.app_id, &e.actor),
        }
    }
}

impl Event for AppEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AppEvent::AppCreated(_) => "apps.app.created",
            AppEvent::AppUpdated(_) => "apps.app.updated",
            AppEvent::AppArchived(_) => "apps.app.archived",
            AppEvent::AppContributorAssigned(_) => "apps.contributor.assigned",
            AppEvent::AppContributorRemoved(_) => "apps.contributor.removed",
            AppEvent::AppClientAttached(_) => "apps.client.attached",
            AppEvent::AppClientUpdated(_) => "apps.client.updated",
            AppEvent::AppClientRevoked(_) => "apps.client.revoked",
            AppEvent::AppLanguageAdded(_) => "apps.language.added",
            AppEvent::AppLanguageRemoved(_) => "apps.language.removed",
            AppEvent::AppLanguageUpdated(_) => "apps.language.updated",
            AppEvent::AppPatternAdded(_) => "apps.pattern.added",
            AppEvent::AppPatternUpdated(_) => "apps.pattern.updated",
            AppEvent::AppPatternDeleted(_) => "apps.pattern.deleted",
            AppEvent::AppPlanChanged(_) => "apps.plan.changed",
            AppEvent::AppPlanReset(_) => "apps.plan.reset",
        }
    }

    fn version(&self) -> u32 {
        1
    }
}
