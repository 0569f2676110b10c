//! Value types held inside an app snapshot.

use serde::{Deserialize, Serialize};

use appfold_core::{Actor, AggregateId, DomainError, DomainResult};

/// App identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(pub AggregateId);

impl AppId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.0
    }
}

impl core::fmt::Display for AppId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Permission level of a contributor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributorPermission {
    Owner,
    Developer,
    Editor,
    Reader,
}

/// Permission level of an API client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientPermission {
    Developer,
    #[default]
    Editor,
    Reader,
}

/// An API client attached to an app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClient {
    pub name: String,
    pub secret: String,
    pub permission: ClientPermission,
}

/// Language code such as `en`, `de` or `pt-BR`.
///
/// Construction validates the shape, so a `Language` held anywhere in the domain
/// is always well-formed. Deserialization goes through the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Language(String);

impl Language {
    pub fn parse(code: &str) -> DomainResult<Self> {
        let (base, region) = match code.split_once('-') {
            Some((base, region)) => (base, Some(region)),
            None => (code, None),
        };

        let base_ok = (2..=3).contains(&base.len()) && base.chars().all(|c| c.is_ascii_lowercase());
        let region_ok = region
            .map(|r| r.len() == 2 && r.chars().all(|c| c.is_ascii_uppercase()))
            .unwrap_or(true);

        if base_ok && region_ok {
            Ok(Self(code.to_string()))
        } else {
            Err(DomainError::validation(format!("'{code}' is not a valid language code")))
        }
    }

    pub fn english() -> Self {
        Self("en".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Language {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.0
    }
}

impl core::fmt::Display for Language {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-language settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    pub language: Language,
    pub is_optional: bool,
    pub fallback: Vec<Language>,
}

impl LanguageConfig {
    fn new(language: Language) -> Self {
        Self {
            language,
            is_optional: false,
            fallback: Vec::new(),
        }
    }
}

/// Ordered language configuration with one designated master.
///
/// The first language ever added becomes master. Order of `languages` is the
/// order languages were added.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LanguagesConfig {
    master: Option<Language>,
    languages: Vec<LanguageConfig>,
}

impl LanguagesConfig {
    pub fn master(&self) -> Option<&Language> {
        self.master.as_ref()
    }

    pub fn is_master(&self, language: &Language) -> bool {
        self.master.as_ref() == Some(language)
    }

    pub fn contains(&self, language: &Language) -> bool {
        self.get(language).is_some()
    }

    pub fn get(&self, language: &Language) -> Option<&LanguageConfig> {
        self.languages.iter().find(|c| &c.language == language)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LanguageConfig> {
        self.languages.iter()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub(crate) fn add(&mut self, language: Language) {
        if self.contains(&language) {
            return;
        }
        if self.master.is_none() {
            self.master = Some(language.clone());
        }
        self.languages.push(LanguageConfig::new(language));
    }

    pub(crate) fn remove(&mut self, language: &Language) {
        self.languages.retain(|c| &c.language != language);
        for config in &mut self.languages {
            config.fallback.retain(|f| f != language);
        }
        if self.is_master(language) {
            self.master = self.languages.first().map(|c| c.language.clone());
        }
    }

    pub(crate) fn update(
        &mut self,
        language: &Language,
        is_optional: bool,
        is_master: bool,
        fallback: &[Language],
    ) {
        let Some(config) = self.languages.iter_mut().find(|c| &c.language == language) else {
            return;
        };
        config.is_optional = is_optional;
        config.fallback = fallback.to_vec();

        if is_master {
            config.is_optional = false;
            self.master = Some(language.clone());
        }
    }
}

/// A named validation pattern offered to schema fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPattern {
    pub name: String,
    pub pattern: String,
    pub message: Option<String>,
}

/// The billing plan currently configured for an app, and who configured it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppPlan {
    pub owner: Actor,
    pub plan_id: String,
}
