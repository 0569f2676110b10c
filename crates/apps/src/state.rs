//! App snapshot: the state folded from an app's event history.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appfold_core::{Aggregate, AggregateId, AggregateRoot, NamedId, UserId};

use crate::events::AppEvent;
use crate::model::{
    AppClient, AppId, AppPattern, AppPlan, ClientPermission, ContributorPermission,
    LanguagesConfig,
};

/// Aggregate root: App.
///
/// # Invariants
/// - The first folded event is always `AppCreated`; before that the snapshot is empty.
/// - `version` equals the number of folded events.
/// - Ordered maps keep serialized checkpoints byte-stable for the same history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSnapshot {
    id: AggregateId,
    name: String,
    label: Option<String>,
    description: Option<String>,
    contributors: BTreeMap<UserId, ContributorPermission>,
    clients: BTreeMap<String, AppClient>,
    languages: LanguagesConfig,
    patterns: BTreeMap<Uuid, AppPattern>,
    plan: Option<AppPlan>,
    archived: bool,
    created: bool,
    version: u64,
}

impl AppSnapshot {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: AppId) -> Self {
        Self {
            id: id.aggregate_id(),
            name: String::new(),
            label: None,
            description: None,
            contributors: BTreeMap::new(),
            clients: BTreeMap::new(),
            languages: LanguagesConfig::default(),
            patterns: BTreeMap::new(),
            plan: None,
            archived: false,
            created: false,
            version: 0,
        }
    }

    pub fn app_id(&self) -> AppId {
        AppId(self.id)
    }

    /// Identity stamped onto events (id + name the app was created with).
    pub fn named_id(&self) -> NamedId<AppId> {
        NamedId::new(self.app_id(), self.name.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn contributors(&self) -> &BTreeMap<UserId, ContributorPermission> {
        &self.contributors
    }

    pub fn owner_count(&self) -> usize {
        self.contributors
            .values()
            .filter(|p| **p == ContributorPermission::Owner)
            .count()
    }

    pub fn clients(&self) -> &BTreeMap<String, AppClient> {
        &self.clients
    }

    pub fn languages(&self) -> &LanguagesConfig {
        &self.languages
    }

    pub fn patterns(&self) -> &BTreeMap<Uuid, AppPattern> {
        &self.patterns
    }

    pub fn plan(&self) -> Option<&AppPlan> {
        self.plan.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_archived(&self) -> bool {
        self.archived
    }
}

impl AggregateRoot for AppSnapshot {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for AppSnapshot {
    type Event = AppEvent;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AppEvent::AppCreated(e) => {
                self.id = e.app_id.id.aggregate_id();
                self.name = e.app_id.name.clone();
                self.created = true;
            }
            AppEvent::AppUpdated(e) => {
                self.label = e.label.clone();
                self.description = e.description.clone();
            }
            AppEvent::AppArchived(_) => {
                self.archived = true;
            }
            AppEvent::AppContributorAssigned(e) => {
                self.contributors.insert(e.contributor_id, e.permission);
            }
            AppEvent::AppContributorRemoved(e) => {
                self.contributors.remove(&e.contributor_id);
            }
            AppEvent::AppClientAttached(e) => {
                self.clients.insert(
                    e.client_id.clone(),
                    AppClient {
                        name: e.client_id.clone(),
                        secret: e.secret.clone(),
                        permission: ClientPermission::default(),
                    },
                );
            }
            AppEvent::AppClientUpdated(e) => {
                if let Some(client) = self.clients.get_mut(&e.client_id) {
                    if let Some(name) = &e.name {
                        client.name = name.clone();
                    }
                    if let Some(permission) = e.permission {
                        client.permission = permission;
                    }
                }
            }
            AppEvent::AppClientRevoked(e) => {
                self.clients.remove(&e.client_id);
            }
            AppEvent::AppLanguageAdded(e) => {
                self.languages.add(e.language.clone());
            }
            AppEvent::AppLanguageRemoved(e) => {
                self.languages.remove(&e.language);
            }
            AppEvent::AppLanguageUpdated(e) => {
                self.languages
                    .update(&e.language, e.is_optional, e.is_master, &e.fallback);
            }
            AppEvent::AppPatternAdded(e) => {
                self.patterns.insert(
                    e.pattern_id,
                    AppPattern {
                        name: e.name.clone(),
                        pattern: e.pattern.clone(),
                        message: e.message.clone(),
                    },
                );
            }
            AppEvent::AppPatternUpdated(e) => {
                self.patterns.insert(
                    e.pattern_id,
                    AppPattern {
                        name: e.name.clone(),
                        pattern: e.pattern.clone(),
                        message: e.message.clone(),
                    },
                );
            }
            AppEvent::AppPatternDeleted(e) => {
                self.patterns.remove(&e.pattern_id);
            }
            AppEvent::AppPlanChanged(e) => {
                self.plan = Some(AppPlan {
                    owner: e.actor.clone(),
                    plan_id: e.plan_id.clone(),
                });
            }
            AppEvent::AppPlanReset(_) => {
                self.plan = None;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::*;
    use crate::model::Language;
    use crate::test_support::{app_named, user};
    use appfold_core::Actor;
    use appfold_events::{fold, replay};

    fn lang(code: &str) -> Language {
        Language::parse(code).unwrap()
    }

    fn sample_history(app_id: &NamedId<AppId>, actor: &Actor) -> Vec<AppEvent> {
        let owner = user();
        let pattern_id = Uuid::now_v7();
        vec![
            AppEvent::AppCreated(AppCreated {
                app_id: app_id.clone(),
                actor: actor.clone(),
            }),
            AppEvent::AppContributorAssigned(AppContributorAssigned {
                app_id: app_id.clone(),
                actor: actor.clone(),
                contributor_id: owner,
                permission: ContributorPermission::Owner,
            }),
            AppEvent::AppLanguageAdded(AppLanguageAdded {
                app_id: app_id.clone(),
                actor: actor.clone(),
                language: lang("en"),
            }),
            AppEvent::AppClientAttached(AppClientAttached {
                app_id: app_id.clone(),
                actor: actor.clone(),
                client_id: "frontend".to_string(),
                secret: "s3cr3t".to_string(),
            }),
            AppEvent::AppClientUpdated(AppClientUpdated {
                app_id: app_id.clone(),
                actor: actor.clone(),
                client_id: "frontend".to_string(),
                name: Some("Frontend".to_string()),
                permission: Some(ClientPermission::Reader),
            }),
            AppEvent::AppPatternAdded(AppPatternAdded {
                app_id: app_id.clone(),
                actor: actor.clone(),
                pattern_id,
                name: "Slug".to_string(),
                pattern: "^[a-z0-9-]+$".to_string(),
                message: None,
            }),
            AppEvent::AppPlanChanged(AppPlanChanged {
                app_id: app_id.clone(),
                actor: actor.clone(),
                plan_id: "business".to_string(),
            }),
        ]
    }

    #[test]
    fn created_event_sets_identity() {
        let app_id = app_named("blog");
        let mut app = AppSnapshot::empty(app_id.id);
        assert!(!app.is_created());

        app.apply(&AppEvent::AppCreated(AppCreated {
            app_id: app_id.clone(),
            actor: Actor::User(user()),
        }));

        assert!(app.is_created());
        assert_eq!(app.name(), "blog");
        assert_eq!(app.named_id(), app_id);
        assert_eq!(app.version(), 1);
    }

    #[test]
    fn history_folds_into_expected_state() {
        let app_id = app_named("blog");
        let actor = Actor::User(user());
        let history = sample_history(&app_id, &actor);

        let app = replay(AppSnapshot::empty(app_id.id), &history);

        assert_eq!(app.version(), history.len() as u64);
        assert_eq!(app.owner_count(), 1);
        assert_eq!(app.languages().master(), Some(&lang("en")));
        let client = &app.clients()["frontend"];
        assert_eq!(client.name, "Frontend");
        assert_eq!(client.permission, ClientPermission::Reader);
        assert_eq!(app.patterns().len(), 1);
        assert_eq!(
            app.plan(),
            Some(&AppPlan {
                owner: actor,
                plan_id: "business".to_string()
            })
        );
    }

    #[test]
    fn incremental_and_bulk_folding_agree() {
        let app_id = app_named("blog");
        let actor = Actor::User(user());
        let history = sample_history(&app_id, &actor);

        let bulk = replay(AppSnapshot::empty(app_id.id), &history);

        let mut incremental = AppSnapshot::empty(app_id.id);
        for event in &history {
            incremental = fold(incremental, event);
        }

        assert_eq!(bulk, incremental);
    }

    #[test]
    fn replay_is_idempotent_and_checkpoint_stable() {
        let app_id = app_named("blog");
        let actor = Actor::User(user());
        let history = sample_history(&app_id, &actor);

        let first = replay(AppSnapshot::empty(app_id.id), &history);
        let second = replay(AppSnapshot::empty(app_id.id), &history);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );

        let restored: AppSnapshot =
            serde_json::from_value(serde_json::to_value(&first).unwrap()).unwrap();
        assert_eq!(restored, first);
    }

    #[test]
    fn plan_reset_clears_plan() {
        let app_id = app_named("blog");
        let actor = Actor::User(user());
        let mut app = replay(AppSnapshot::empty(app_id.id), &sample_history(&app_id, &actor));

        app.apply(&AppEvent::AppPlanReset(AppPlanReset {
            app_id: app_id.clone(),
            actor,
        }));

        assert!(app.plan().is_none());
    }

    #[test]
    fn revoked_client_and_deleted_pattern_disappear() {
        let app_id = app_named("blog");
        let actor = Actor::User(user());
        let mut app = replay(AppSnapshot::empty(app_id.id), &sample_history(&app_id, &actor));
        let pattern_id = *app.patterns().keys().next().unwrap();

        app.apply(&AppEvent::AppClientRevoked(AppClientRevoked {
            app_id: app_id.clone(),
            actor: actor.clone(),
            client_id: "frontend".to_string(),
        }));
        app.apply(&AppEvent::AppPatternDeleted(AppPatternDeleted {
            app_id: app_id.clone(),
            actor,
            pattern_id,
        }));

        assert!(app.clients().is_empty());
        assert!(app.patterns().is_empty());
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_event(app_id: NamedId<AppId>, actor: Actor) -> impl Strategy<Value = AppEvent> {
            let contributors = prop::sample::select(vec![
                UserId::from_uuid(Uuid::from_u128(1)),
                UserId::from_uuid(Uuid::from_u128(2)),
                UserId::from_uuid(Uuid::from_u128(3)),
            ]);
            let permissions = prop::sample::select(vec![
                ContributorPermission::Owner,
                ContributorPermission::Developer,
                ContributorPermission::Editor,
            ]);
            let languages = prop::sample::select(vec!["en", "de", "fr", "it"]);
            let clients = prop::sample::select(vec!["web", "cli", "mobile"]);
            let pattern_ids = (0u128..4).prop_map(Uuid::from_u128);

            let a = app_id.clone();
            let b = actor.clone();
            let assigned = (contributors.clone(), permissions).prop_map(move |(c, p)| {
                AppEvent::AppContributorAssigned(AppContributorAssigned {
                    app_id: a.clone(),
                    actor: b.clone(),
                    contributor_id: c,
                    permission: p,
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let removed = contributors.prop_map(move |c| {
                AppEvent::AppContributorRemoved(AppContributorRemoved {
                    app_id: a.clone(),
                    actor: b.clone(),
                    contributor_id: c,
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let attached = (clients.clone(), "[a-z0-9]{8}").prop_map(move |(c, s)| {
                AppEvent::AppClientAttached(AppClientAttached {
                    app_id: a.clone(),
                    actor: b.clone(),
                    client_id: c.to_string(),
                    secret: s,
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let revoked = clients.prop_map(move |c| {
                AppEvent::AppClientRevoked(AppClientRevoked {
                    app_id: a.clone(),
                    actor: b.clone(),
                    client_id: c.to_string(),
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let lang_added = languages.clone().prop_map(move |l| {
                AppEvent::AppLanguageAdded(AppLanguageAdded {
                    app_id: a.clone(),
                    actor: b.clone(),
                    language: Language::parse(l).unwrap(),
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let lang_removed = languages.prop_map(move |l| {
                AppEvent::AppLanguageRemoved(AppLanguageRemoved {
                    app_id: a.clone(),
                    actor: b.clone(),
                    language: Language::parse(l).unwrap(),
                })
            });
            let (a, b) = (app_id.clone(), actor.clone());
            let pattern_added = (pattern_ids.clone(), "[A-Z][a-z]{2,6}").prop_map(move |(id, n)| {
                AppEvent::AppPatternAdded(AppPatternAdded {
                    app_id: a.clone(),
                    actor: b.clone(),
                    pattern_id: id,
                    name: n,
                    pattern: "^.*$".to_string(),
                    message: None,
                })
            });
            let (a, b) = (app_id, actor);
            let pattern_deleted = pattern_ids.prop_map(move |id| {
                AppEvent::AppPatternDeleted(AppPatternDeleted {
                    app_id: a.clone(),
                    actor: b.clone(),
                    pattern_id: id,
                })
            });

            prop_oneof![
                assigned,
                removed,
                attached,
                revoked,
                lang_added,
                lang_removed,
                pattern_added,
                pattern_deleted,
            ]
        }

        fn arb_history() -> impl Strategy<Value = (NamedId<AppId>, Vec<AppEvent>)> {
            let app_id = NamedId::new(AppId::new(AggregateId::from_uuid(Uuid::from_u128(99))), "app");
            let actor = Actor::User(UserId::from_uuid(Uuid::from_u128(1)));
            let created = AppEvent::AppCreated(AppCreated {
                app_id: app_id.clone(),
                actor: actor.clone(),
            });
            prop::collection::vec(arb_event(app_id.clone(), actor), 0..40).prop_map(move |tail| {
                let mut history = vec![created.clone()];
                history.extend(tail);
                (app_id.clone(), history)
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: bulk replay equals one-at-a-time folding.
            #[test]
            fn bulk_replay_equals_incremental_fold((app_id, history) in arb_history()) {
                let bulk = replay(AppSnapshot::empty(app_id.id), &history);

                let mut incremental = AppSnapshot::empty(app_id.id);
                for event in &history {
                    incremental.apply(event);
                }

                prop_assert_eq!(&bulk, &incremental);
            }

            /// Property: version equals the number of folded events, step by step.
            #[test]
            fn version_tracks_event_count((app_id, history) in arb_history()) {
                let mut app = AppSnapshot::empty(app_id.id);
                for (idx, event) in history.iter().enumerate() {
                    app.apply(event);
                    prop_assert_eq!(app.version(), idx as u64 + 1);
                }
            }

            /// Property: serialized checkpoints of two replays are byte-identical.
            #[test]
            fn replay_checkpoints_are_identical((app_id, history) in arb_history()) {
                let first = replay(AppSnapshot::empty(app_id.id), &history);
                let second = replay(AppSnapshot::empty(app_id.id), &history);
                prop_assert_eq!(
                    serde_json::to_vec(&first).unwrap(),
                    serde_json::to_vec(&second).unwrap()
                );
            }
        }
    }
}
