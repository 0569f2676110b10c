//! Apps domain module (event-sourced).
//!
//! An app owns its contributors, API clients, language configuration, validation
//! patterns and billing plan. State is derived purely by folding `AppEvent`s; all
//! decisions go through [`AppCommandHandler`], whose guards may consult the
//! external [`services`].

pub mod commands;
pub mod emit;
pub mod events;
pub mod guards;
pub mod handler;
pub mod model;
pub mod options;
pub mod services;
pub mod state;

pub use commands::{
    AddLanguage, AddPattern, AppCommand, AppCommandKind, AssignContributor, AttachClient,
    ChangePlan, CreateApp, DeletePattern, RemoveContributor, RemoveLanguage, RevokeClient,
    UpdateApp, UpdateClient, UpdateLanguage, UpdatePattern,
};
pub use events::AppEvent;
pub use handler::{AppCommandHandler, AppCommandOutput};
pub use model::{
    AppClient, AppId, AppPattern, AppPlan, ClientPermission, ContributorPermission, Language,
    LanguageConfig, LanguagesConfig,
};
pub use options::{AppOptions, InitialPattern};
pub use services::{
    BillingFollowUp, BillingManager, InMemoryUserDirectory, NoopBillingManager,
    PlanChangeResult, PlanInfo, PlanProvider, ServiceError, StaticPlanProvider, UserInfo,
    UserResolver,
};
pub use state::AppSnapshot;

#[cfg(test)]
pub(crate) mod test_support;
