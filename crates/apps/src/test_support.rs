//! Fixtures shared by the crate's unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use appfold_core::{Actor, Aggregate, AggregateId, NamedId, UserId};

use crate::emit::Emitter;
use crate::model::AppId;
use crate::options::AppOptions;
use crate::services::{
    BillingManager, InMemoryUserDirectory, PlanChangeResult, PlanInfo, PlanProvider,
    ServiceError, UserInfo, UserResolver,
};
use crate::state::AppSnapshot;

pub(crate) fn user() -> UserId {
    UserId::new()
}

pub(crate) fn app_named(name: &str) -> NamedId<AppId> {
    NamedId::new(AppId(AggregateId::new()), name)
}

/// A created app with one owner and `en` as master language.
pub(crate) fn created_app(name: &str) -> (AppSnapshot, UserId) {
    let owner = user();
    let app_id = app_named(name);
    let actor = Actor::User(owner);

    let mut app = AppSnapshot::empty(app_id.id);
    for event in Emitter::new(&app_id, &actor).created_batch(owner, &AppOptions::default()) {
        app.apply(&event);
    }
    (app, owner)
}

/// Directory holding a single user with the given email.
pub(crate) fn directory_with(email: &str) -> (InMemoryUserDirectory, UserId) {
    let directory = InMemoryUserDirectory::new();
    let id = user();
    directory.insert(UserInfo {
        id,
        email: email.to_string(),
        display_name: email.to_string(),
    }).unwrap();
    (directory, id)
}

pub(crate) struct FailingUsers;

#[async_trait]
impl UserResolver for FailingUsers {
    async fn resolve(&self, _user_ref: &str) -> Result<Option<UserInfo>, ServiceError> {
        Err(ServiceError::Unavailable("identity backend down".into()))
    }
}

pub(crate) struct FailingPlans;

#[async_trait]
impl PlanProvider for FailingPlans {
    async fn get_plan(&self, _plan_id: &str) -> Result<Option<PlanInfo>, ServiceError> {
        Err(ServiceError::Unavailable("plan catalogue down".into()))
    }

    fn free_plan(&self) -> PlanInfo {
        PlanInfo {
            id: "free".into(),
            name: "Free".into(),
            max_contributors: None,
        }
    }
}

/// Billing fake returning a fixed result and recording every call.
pub(crate) struct ScriptedBilling {
    result: Result<PlanChangeResult, ServiceError>,
    calls: AtomicUsize,
    last_plan: Mutex<Option<String>>,
}

impl ScriptedBilling {
    pub(crate) fn returning(result: PlanChangeResult) -> Self {
        Self {
            result: Ok(result),
            calls: AtomicUsize::new(0),
            last_plan: Mutex::new(None),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            result: Err(ServiceError::Unavailable("payment provider timeout".into())),
            calls: AtomicUsize::new(0),
            last_plan: Mutex::new(None),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_plan(&self) -> Option<String> {
        self.last_plan.lock().unwrap().clone()
    }
}

#[async_trait]
impl BillingManager for ScriptedBilling {
    async fn change_plan(
        &self,
        _actor: &Actor,
        _app_id: &NamedId<AppId>,
        plan_id: &str,
    ) -> Result<PlanChangeResult, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_plan.lock().unwrap() = Some(plan_id.to_string());
        self.result.clone()
    }
}
