use serde::Serialize;
use std::collections::BTreeSet;
use tome_core::{DetailKey, MaterialKind, SessionId, Timestamp};
use uuid::Uuid;

/// Documentation accumulated by one session.
///
/// Grows monotonically: bundles are activated and detail documents loaded, but
/// nothing is ever evicted. Owned by exactly one session; the [`Selector`]
/// mutates it through `&mut`.
///
/// [`Selector`]: crate::Selector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedContext {
    session_id: SessionId,
    created_at: Timestamp,
    /// Activation order. Later bundles may override earlier guidance.
    active_bundles: Vec<String>,
    loaded_detail_keys: BTreeSet<DetailKey>,
    material: Vec<MaterialEntry>,
}

/// One document made visible to the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialEntry {
    pub kind: MaterialKind,
    pub bundle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    pub content: String,
}

impl LoadedContext {
    pub fn new() -> Self {
        Self::with_session_id(Uuid::new_v4())
    }

    pub fn with_session_id(session_id: SessionId) -> Self {
        Self {
            session_id,
            created_at: chrono::Utc::now(),
            active_bundles: Vec::new(),
            loaded_detail_keys: BTreeSet::new(),
            material: Vec::new(),
        }
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn active_bundles(&self) -> &[String] {
        &self.active_bundles
    }

    pub fn is_active(&self, bundle: &str) -> bool {
        self.active_bundles.iter().any(|b| b == bundle)
    }

    pub fn loaded_detail_keys(&self) -> &BTreeSet<DetailKey> {
        &self.loaded_detail_keys
    }

    pub fn is_loaded(&self, bundle: &str, topic: &str) -> bool {
        self.loaded_detail_keys
            .iter()
            .any(|k| k.bundle == bundle && k.topic == topic)
    }

    /// Everything loaded so far, in load order.
    pub fn material(&self) -> &[MaterialEntry] {
        &self.material
    }

    pub fn is_empty(&self) -> bool {
        self.material.is_empty()
    }

    /// All loaded material as one block for injection into a model's context.
    pub fn render(&self) -> String {
        self.material
            .iter()
            .map(|m| match &m.topic {
                None => format!("<skill name=\"{}\">\n{}\n</skill>", m.bundle, m.content),
                Some(topic) => format!(
                    "<skill_detail skill=\"{}\" topic=\"{}\">\n{}\n</skill_detail>",
                    m.bundle, topic, m.content
                ),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub(crate) fn record_activation(&mut self, bundle: &str, summary: &str) {
        self.active_bundles.push(bundle.to_string());
        self.material.push(MaterialEntry {
            kind: MaterialKind::Summary,
            bundle: bundle.to_string(),
            topic: None,
            content: summary.to_string(),
        });
    }

    pub(crate) fn record_detail(&mut self, key: DetailKey, content: &str) {
        self.material.push(MaterialEntry {
            kind: MaterialKind::Detail,
            bundle: key.bundle.clone(),
            topic: Some(key.topic.clone()),
            content: content.to_string(),
        });
        self.loaded_detail_keys.insert(key);
    }
}

impl Default for LoadedContext {
    fn default() -> Self {
        Self::new()
    }
}
