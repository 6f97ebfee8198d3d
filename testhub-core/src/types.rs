//! Domain types for the Testing Hub collections.
//!
//! Three collections are modelled here: library [`Template`]s (source of
//! truth), playground [`WorkingCopy`] records, and generated [`TestArtifact`]s.
//! Working copies and artifacts both point back at a template through a
//! [`SourceKey`], which is the only join key used between collections.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Mint a fresh random id.
            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Permanent identifier of a library template.
    TemplateId
);
string_id!(
    /// Identifier of a playground working copy. Never used as a join key.
    WorkingCopyId
);
string_id!(
    /// Identifier of a test artifact record.
    ArtifactId
);

/// Generated records, keyed by entity name.
pub type EntityData = BTreeMap<String, Vec<Value>>;

/// Total number of records across every entity.
pub fn record_count(data: &EntityData) -> usize {
    data.values().map(Vec::len).sum()
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Kind of library template a record is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Page,
    Feature,
    Entity,
}

impl SourceType {
    /// Whether working copies of this type appear in the testing view.
    pub fn is_testable(self) -> bool {
        matches!(self, SourceType::Page | SourceType::Feature)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Page => write!(f, "page"),
            SourceType::Feature => write!(f, "feature"),
            SourceType::Entity => write!(f, "entity"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "page" => Ok(SourceType::Page),
            "feature" => Ok(SourceType::Feature),
            "entity" => Ok(SourceType::Entity),
            other => Err(format!(
                "unknown source type '{other}'; expected: page, feature, entity"
            )),
        }
    }
}

/// Relationship of a working copy to its template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Outdated,
    Orphaned,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Synced => write!(f, "synced"),
            SyncStatus::Outdated => write!(f, "outdated"),
            SyncStatus::Orphaned => write!(f, "orphaned"),
        }
    }
}

/// How a working copy came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    #[default]
    Library,
    Adhoc,
}

/// Confidence in a test artifact's correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Pending,
    Verified,
    Stale,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestStatus::Pending => write!(f, "pending"),
            TestStatus::Verified => write!(f, "verified"),
            TestStatus::Stale => write!(f, "stale"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMethod {
    #[default]
    AiGenerated,
    Manual,
}

// ---------------------------------------------------------------------------
// Stable key
// ---------------------------------------------------------------------------

/// The `(source_type, source_id)` pair that binds working copies and test
/// artifacts to a library template.
///
/// Test artifacts are looked up by this key and never by working copy id, so
/// they survive the playground being cleared and re-synced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceKey {
    pub source_type: SourceType,
    pub source_id: TemplateId,
}

impl SourceKey {
    pub fn new(source_type: SourceType, source_id: impl Into<TemplateId>) -> Self {
        Self {
            source_type,
            source_id: source_id.into(),
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source_type, self.source_id)
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// A library template: the authoritative definition of a page, feature or
/// entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    #[serde(rename = "type")]
    pub template_type: SourceType,
    pub name: String,
    #[serde(default)]
    pub entities_used: Vec<String>,
    /// JSON schema of the entity, for entity templates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Free-form template body (layout, feature config, ...).
    #[serde(default)]
    pub content: Value,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(self.template_type, self.id.clone())
    }
}

/// Partial update for a [`Template`].
#[derive(Debug, Clone, Default)]
pub struct TemplatePatch {
    pub name: Option<String>,
    pub entities_used: Option<Vec<String>>,
    pub schema: Option<Option<Value>>,
    pub description: Option<Option<String>>,
    pub content: Option<Value>,
}

// ---------------------------------------------------------------------------
// Working copies
// ---------------------------------------------------------------------------

/// Denormalized copy of the template data a working copy was synced from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WorkingSnapshot {
    pub name: String,
    /// `None` when the snapshot predates the template listing its entities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities_used: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Value,
    /// SHA-256 fingerprint of the template content at sync time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

/// A disposable playground instance of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingCopy {
    pub id: WorkingCopyId,
    pub source_type: SourceType,
    pub source_id: TemplateId,
    pub source_name: String,
    #[serde(default)]
    pub working_data: WorkingSnapshot,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub origin: Origin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkingCopy {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(self.source_type, self.source_id.clone())
    }
}

/// Partial update for a [`WorkingCopy`].
#[derive(Debug, Clone, Default)]
pub struct WorkingCopyPatch {
    pub source_name: Option<String>,
    pub working_data: Option<WorkingSnapshot>,
    pub sync_status: Option<SyncStatus>,
    pub last_sync_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Test artifacts
// ---------------------------------------------------------------------------

/// A prior content version kept for rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub version: u32,
    #[serde(default)]
    pub entity_data: EntityData,
    pub timestamp: DateTime<Utc>,
}

/// Generated mock data bound to a template through its [`SourceKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestArtifact {
    pub id: ArtifactId,
    pub source_type: SourceType,
    pub source_id: TemplateId,
    pub source_name: String,
    #[serde(default)]
    pub entity_data: EntityData,
    #[serde(default)]
    pub test_status: TestStatus,
    pub version: u32,
    /// Oldest first.
    #[serde(default)]
    pub previous_versions: Vec<VersionSnapshot>,
    #[serde(default)]
    pub generation_method: GenerationMethod,
    /// Working copy this artifact was last generated from. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_copy_id: Option<WorkingCopyId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TestArtifact {
    pub fn key(&self) -> SourceKey {
        SourceKey::new(self.source_type, self.source_id.clone())
    }

    pub fn record_count(&self) -> usize {
        record_count(&self.entity_data)
    }

    pub fn can_rollback(&self) -> bool {
        !self.previous_versions.is_empty()
    }
}

/// Partial update for a [`TestArtifact`].
#[derive(Debug, Clone, Default)]
pub struct TestArtifactPatch {
    pub source_name: Option<String>,
    pub entity_data: Option<EntityData>,
    pub test_status: Option<TestStatus>,
    pub version: Option<u32>,
    pub previous_versions: Option<Vec<VersionSnapshot>>,
    pub generation_method: Option<GenerationMethod>,
    pub working_copy_id: Option<WorkingCopyId>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn newtype_display() {
        assert_eq!(TemplateId::from("tpl-1").to_string(), "tpl-1");
        assert_eq!(WorkingCopyId::from("wc-1").to_string(), "wc-1");
        assert_eq!(ArtifactId::from("ta-1").to_string(), "ta-1");
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(ArtifactId::generate(), ArtifactId::generate());
    }

    #[test]
    fn source_key_equality_ignores_construction_path() {
        let a = SourceKey::new(SourceType::Page, "T1");
        let b = SourceKey::new(SourceType::Page, TemplateId::from(String::from("T1")));
        assert_eq!(a, b);
        assert_ne!(a, SourceKey::new(SourceType::Feature, "T1"));
        assert_eq!(a.to_string(), "page:T1");
    }

    #[test]
    fn source_type_parses_case_insensitively() {
        assert_eq!("Page".parse::<SourceType>(), Ok(SourceType::Page));
        assert!("widget".parse::<SourceType>().is_err());
        assert!(SourceType::Feature.is_testable());
        assert!(!SourceType::Entity.is_testable());
    }

    #[test]
    fn record_count_sums_all_entities() {
        let mut data = EntityData::new();
        data.insert("Invoice".into(), vec![json!({}), json!({}), json!({})]);
        data.insert("Customer".into(), vec![json!({})]);
        data.insert("Empty".into(), vec![]);
        assert_eq!(record_count(&data), 4);
    }

    #[test]
    fn template_type_serializes_as_type_field() {
        let t = Template {
            id: TemplateId::from("T1"),
            template_type: SourceType::Page,
            name: "Invoices".into(),
            entities_used: vec!["Invoice".into()],
            schema: None,
            description: None,
            content: Value::Null,
            updated_at: Utc::now(),
        };
        let yaml = serde_yaml::to_string(&t).expect("serialize");
        assert!(yaml.contains("type: page"));
        let back: Template = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(back.key(), t.key());
    }

    #[test]
    fn generation_method_is_snake_case() {
        let s = serde_json::to_string(&GenerationMethod::AiGenerated).expect("json");
        assert_eq!(s, "\"ai_generated\"");
    }
}
