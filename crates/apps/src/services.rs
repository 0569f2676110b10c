//! External collaborators consulted by app guards and the plan change flow.
//!
//! These are contracts only. The in-memory adapters below serve tests and local
//! setups; production wiring supplies real billing and identity backends.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use appfold_core::{Actor, NamedId, UserId};

use crate::model::AppId;

/// Failure talking to an external collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Limits and metadata of a billing plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInfo {
    pub id: String,
    pub name: String,
    /// `None` means unlimited.
    pub max_contributors: Option<usize>,
}

/// Read-only lookup of billing plans.
#[async_trait]
pub trait PlanProvider: Send + Sync {
    async fn get_plan(&self, plan_id: &str) -> Result<Option<PlanInfo>, ServiceError>;

    /// The plan an app is on when no plan has been configured.
    fn free_plan(&self) -> PlanInfo;

    fn is_free_plan(&self, plan_id: &str) -> bool {
        self.free_plan().id == plan_id
    }
}

/// What the billing side did with a plan change request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PlanChangeResult {
    /// The change is effective; the plan change event may be committed.
    Changed,
    /// Billing refused the change.
    Rejected { reason: String },
    /// Billing needs more time (e.g. checkout in progress).
    Pending { redirect_uri: Option<String> },
}

/// What is expected to happen after a billing result was returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BillingFollowUp {
    /// Nothing further: the result is final.
    None,
    /// Billing will deliver a `ConfirmPlanChange` callback once the change settles.
    AwaitCallback,
}

impl PlanChangeResult {
    /// Only a confirmed change authorizes committing an event.
    pub fn authorizes_commit(&self) -> bool {
        matches!(self, PlanChangeResult::Changed)
    }

    /// Named policy for non-success results: `Rejected` is terminal, `Pending`
    /// settles later through the callback path. Neither commits an event now.
    pub fn follow_up(&self) -> BillingFollowUp {
        match self {
            PlanChangeResult::Changed | PlanChangeResult::Rejected { .. } => BillingFollowUp::None,
            PlanChangeResult::Pending { .. } => BillingFollowUp::AwaitCallback,
        }
    }
}

/// Performs the billing side effect of a plan change.
#[async_trait]
pub trait BillingManager: Send + Sync {
    async fn change_plan(
        &self,
        actor: &Actor,
        app_id: &NamedId<AppId>,
        plan_id: &str,
    ) -> Result<PlanChangeResult, ServiceError>;
}

/// A resolved user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
}

/// Resolves a user reference (id or email) to a known user.
#[async_trait]
pub trait UserResolver: Send + Sync {
    async fn resolve(&self, user_ref: &str) -> Result<Option<UserInfo>, ServiceError>;
}

/// Fixed list of plans, with one designated free plan.
#[derive(Debug, Clone)]
pub struct StaticPlanProvider {
    free: PlanInfo,
    plans: Vec<PlanInfo>,
}

impl StaticPlanProvider {
    pub fn new(free: PlanInfo, plans: Vec<PlanInfo>) -> Self {
        Self { free, plans }
    }
}

impl Default for StaticPlanProvider {
    fn default() -> Self {
        Self::new(
            PlanInfo {
                id: "free".to_string(),
                name: "Free".to_string(),
                max_contributors: None,
            },
            Vec::new(),
        )
    }
}

#[async_trait]
impl PlanProvider for StaticPlanProvider {
    async fn get_plan(&self, plan_id: &str) -> Result<Option<PlanInfo>, ServiceError> {
        if self.free.id == plan_id {
            return Ok(Some(self.free.clone()));
        }
        Ok(self.plans.iter().find(|p| p.id == plan_id).cloned())
    }

    fn free_plan(&self) -> PlanInfo {
        self.free.clone()
    }
}

/// Billing that accepts every change immediately (no payment provider configured).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBillingManager;

#[async_trait]
impl BillingManager for NoopBillingManager {
    async fn change_plan(
        &self,
        _actor: &Actor,
        _app_id: &NamedId<AppId>,
        _plan_id: &str,
    ) -> Result<PlanChangeResult, ServiceError> {
        Ok(PlanChangeResult::Changed)
    }
}

/// In-memory user directory.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    users: RwLock<Vec<UserInfo>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `user`, replacing any entry with the same id.
    pub fn insert(&self, user: UserInfo) -> Result<(), ServiceError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| ServiceError::Unavailable("user directory lock poisoned".to_string()))?;
        users.retain(|u| u.id != user.id);
        users.push(user);
        Ok(())
    }
}

#[async_trait]
impl UserResolver for InMemoryUserDirectory {
    async fn resolve(&self, user_ref: &str) -> Result<Option<UserInfo>, ServiceError> {
        let users = self
            .users
            .read()
            .map_err(|_| ServiceError::Unavailable("user directory lock poisoned".to_string()))?;

        let found = users
            .iter()
            .find(|u| u.id.to_string() == user_ref || u.email.eq_ignore_ascii_case(user_ref))
            .cloned();
        Ok(found)
    }
}
