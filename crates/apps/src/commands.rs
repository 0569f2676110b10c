//! Commands accepted by the app aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appfold_core::{Actor, AggregateId, UserId};
use appfold_events::Command;

use crate::model::{AppId, ClientPermission, ContributorPermission, Language};

/// Command: CreateApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateApp {
    pub name: String,
}

/// Command: UpdateApp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateApp {
    pub label: Option<String>,
    pub description: Option<String>,
}

/// Command: AssignContributor.
///
/// `contributor` is whatever the caller knows about the user (id or email); the
/// guard resolves it through the identity resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignContributor {
    pub contributor: String,
    pub permission: ContributorPermission,
}

/// Command: RemoveContributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveContributor {
    pub contributor_id: UserId,
}

/// Command: AttachClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachClient {
    pub client_id: String,
    pub secret: String,
}

impl AttachClient {
    /// Attach a client with a freshly generated secret.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            secret: Uuid::new_v4().simple().to_string(),
        }
    }
}

/// Command: UpdateClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateClient {
    pub client_id: String,
    pub name: Option<String>,
    pub permission: Option<ClientPermission>,
}

/// Command: RevokeClient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevokeClient {
    pub client_id: String,
}

/// Command: AddLanguage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddLanguage {
    pub language: Language,
}

/// Command: RemoveLanguage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveLanguage {
    pub language: Language,
}

/// Command: UpdateLanguage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLanguage {
    pub language: Language,
    pub is_optional: bool,
    pub is_master: bool,
    pub fallback: Vec<Language>,
}

/// Command: AddPattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddPattern {
    pub pattern_id: Uuid,
    pub name: String,
    pub pattern: String,
    pub message: Option<String>,
}

impl AddPattern {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            pattern_id: Uuid::now_v7(),
            name: name.into(),
            pattern: pattern.into(),
            message: None,
        }
    }
}

/// Command: UpdatePattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatePattern {
    pub pattern_id: Uuid,
    pub name: String,
    pub pattern: String,
    pub message: Option<String>,
}

/// Command: DeletePattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePattern {
    pub pattern_id: Uuid,
}

/// Payload shared by both plan change variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePlan {
    pub plan_id: String,
}

/// Closed set of app commands. Routing is an exhaustive match over this enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppCommandKind {
    CreateApp(CreateApp),
    UpdateApp(UpdateApp),
    ArchiveApp,
    AssignContributor(AssignContributor),
    RemoveContributor(RemoveContributor),
    AttachClient(AttachClient),
    UpdateClient(UpdateClient),
    RevokeClient(RevokeClient),
    AddLanguage(AddLanguage),
    RemoveLanguage(RemoveLanguage),
    UpdateLanguage(UpdateLanguage),
    AddPattern(AddPattern),
    UpdatePattern(UpdatePattern),
    DeletePattern(DeletePattern),
    /// User-initiated: runs the guard and the billing side effect before committing.
    ChangePlan(ChangePlan),
    /// Billing callback: the side effect already happened, commit unconditionally.
    ConfirmPlanChange(ChangePlan),
}

/// A command addressed to one app, with the principal issuing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppCommand {
    pub actor: Actor,
    pub app_id: Option<AppId>,
    pub kind: AppCommandKind,
}

impl AppCommand {
    pub fn new(actor: Actor, kind: AppCommandKind) -> Self {
        Self {
            actor,
            app_id: None,
            kind,
        }
    }

    /// Pin the command to a specific app; the controller refuses it elsewhere.
    pub fn for_app(mut self, app_id: AppId) -> Self {
        self.app_id = Some(app_id);
        self
    }
}

impl Command for AppCommand {
    fn actor(&self) -> &Actor {
        &self.actor
    }

    fn target_aggregate_id(&self) -> Option<AggregateId> {
        self.app_id.map(|id| id.aggregate_id())
    }
}
