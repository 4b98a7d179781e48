use serde::Serialize;
use std::sync::Arc;
use tome_config::SelectorConfig;
use tome_core::{DetailKey, Result, TomeError};
use tracing::{debug, info, warn};

use crate::context::LoadedContext;
use crate::registry::SkillRegistry;
use crate::scoring::{self, LexicalScorer, Scorer};

/// A bundle that scored at or above the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BundleMatch {
    pub name: String,
    pub score: f32,
}

/// A detail topic that scored at or above the threshold.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailMatch {
    pub topic: String,
    pub score: f32,
}

/// Outcome of [`Selector::activate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Activated,
    AlreadyActive,
}

/// Outcome of [`Selector::load_detail`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLoad {
    Loaded,
    AlreadyLoaded,
}

/// What one end-to-end [`Selector::select`] call did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SelectionReport {
    /// Every candidate, best first.
    pub matches: Vec<BundleMatch>,
    /// Bundles newly activated by this call.
    pub activated: Vec<String>,
    /// Detail documents newly loaded by this call.
    pub loaded_details: Vec<DetailKey>,
}

impl SelectionReport {
    /// True when nothing cleared the threshold.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Matches task text against a registry and discloses bundles into a
/// session's [`LoadedContext`].
///
/// The registry and scorer are shared; the selector holds no session state, so
/// one selector can serve many sessions.
#[derive(Clone)]
pub struct Selector {
    registry: Arc<SkillRegistry>,
    scorer: Arc<dyn Scorer>,
    threshold: f32,
    max_active: usize,
}

impl Selector {
    /// A lexical selector with the default threshold.
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self::with_scorer(registry, Arc::new(LexicalScorer))
    }

    pub fn with_scorer(registry: Arc<SkillRegistry>, scorer: Arc<dyn Scorer>) -> Self {
        let defaults = SelectorConfig::default();
        Self {
            registry,
            scorer,
            threshold: defaults.threshold,
            max_active: defaults.max_active,
        }
    }

    pub fn from_config(registry: Arc<SkillRegistry>, config: &SelectorConfig) -> Self {
        Self::with_scorer(registry, scoring::scorer_for(config))
            .with_threshold(config.threshold)
            .with_max_active(config.max_active)
    }

    /// Set the relevance threshold, clamped into `(0, 1]`. NaN is ignored.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        if threshold.is_nan() {
            warn!(threshold = self.threshold, "ignoring NaN selector threshold");
            return self;
        }
        let clamped = threshold.clamp(f32::EPSILON, 1.0);
        if clamped != threshold {
            warn!(requested = threshold, threshold = clamped, "selector threshold clamped into (0, 1]");
        }
        self.threshold = clamped;
        self
    }

    pub fn with_max_active(mut self, max_active: usize) -> Self {
        self.max_active = max_active;
        self
    }

    pub fn registry(&self) -> &SkillRegistry {
        &self.registry
    }

    pub fn scorer(&self) -> &dyn Scorer {
        self.scorer.as_ref()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Score every bundle against `task` and return those at or above the
    /// threshold, best first. Ties keep registration order.
    ///
    /// Text with no meaningful words (empty, whitespace, only stopwords)
    /// matches nothing.
    pub fn match_bundles(&self, task: &str) -> Vec<BundleMatch> {
        if scoring::tokenize(task).is_empty() {
            debug!("task text has no scorable words, no candidates");
            return Vec::new();
        }

        let mut matches: Vec<BundleMatch> = self
            .registry
            .list()
            .iter()
            .filter_map(|bundle| {
                let score = self.scorer.score(task, &bundle.trigger_text());
                debug!(skill = %bundle.name, score, scorer = self.scorer.name(), "scored skill");
                (score >= self.threshold).then(|| BundleMatch {
                    name: bundle.name.clone(),
                    score,
                })
            })
            .collect();

        // Stable: equal scores stay in registration order.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches
    }

    /// Candidate names only, best first.
    pub fn matched_names(&self, task: &str) -> Vec<String> {
        self.match_bundles(task).into_iter().map(|m| m.name).collect()
    }

    /// Make a bundle's summary visible to the session.
    ///
    /// Unknown names fail with [`TomeError::BundleNotFound`] and leave `ctx`
    /// untouched. Activating an active bundle changes nothing.
    pub fn activate(&self, ctx: &mut LoadedContext, name: &str) -> Result<Activation> {
        let bundle = self
            .registry
            .get(name)
            .ok_or_else(|| TomeError::BundleNotFound(name.to_string()))?;

        if ctx.is_active(name) {
            debug!(skill = %name, session = %ctx.session_id(), "skill already active");
            return Ok(Activation::AlreadyActive);
        }

        ctx.record_activation(&bundle.name, &bundle.summary);
        info!(skill = %name, session = %ctx.session_id(), "activated skill");
        Ok(Activation::Activated)
    }

    /// Make one detail document of an active bundle visible to the session.
    ///
    /// Fails with a not-found error when the bundle is unknown, not active in
    /// `ctx`, or has no such topic; `ctx` is untouched on failure. Loading a
    /// loaded topic changes nothing.
    pub fn load_detail(&self, ctx: &mut LoadedContext, bundle: &str, topic: &str) -> Result<DetailLoad> {
        let def = self
            .registry
            .get(bundle)
            .ok_or_else(|| TomeError::BundleNotFound(bundle.to_string()))?;
        if !ctx.is_active(bundle) {
            return Err(TomeError::BundleNotActive(bundle.to_string()));
        }
        let doc = def.detail(topic).ok_or_else(|| TomeError::TopicNotFound {
            bundle: bundle.to_string(),
            topic: topic.to_string(),
        })?;

        if ctx.is_loaded(bundle, topic) {
            debug!(skill = %bundle, topic, "detail already loaded");
            return Ok(DetailLoad::AlreadyLoaded);
        }

        ctx.record_detail(DetailKey::new(bundle, topic), &doc.content);
        info!(skill = %bundle, topic, session = %ctx.session_id(), "loaded skill detail");
        Ok(DetailLoad::Loaded)
    }

    /// Detail topics of `bundle` that `task` appears to need, best first.
    ///
    /// Each topic is scored on its label and load hint with the same scorer
    /// and threshold as [`Selector::match_bundles`]. Pure; does not require the
    /// bundle to be active.
    pub fn suggest_details(&self, bundle: &str, task: &str) -> Result<Vec<DetailMatch>> {
        let def = self
            .registry
            .get(bundle)
            .ok_or_else(|| TomeError::BundleNotFound(bundle.to_string()))?;
        if scoring::tokenize(task).is_empty() {
            return Ok(Vec::new());
        }

        let mut matches: Vec<DetailMatch> = def
            .details
            .iter()
            .filter(|d| def.references(&d.topic))
            .filter_map(|d| {
                let text = format!("{} {}", d.topic.replace(['-', '_'], " "), d.hint);
                let score = self.scorer.score(task, &text);
                (score >= self.threshold).then(|| DetailMatch {
                    topic: d.topic.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(matches)
    }

    /// Match, activate up to `max_active` candidates, and load the detail
    /// documents each chosen candidate's summary points the task at. A
    /// candidate that was already active still gets the details suggested for
    /// this task.
    ///
    /// An empty match is a valid outcome: the report is empty and `ctx` is
    /// unchanged.
    pub fn select(&self, ctx: &mut LoadedContext, task: &str) -> Result<SelectionReport> {
        let mut report = SelectionReport {
            matches: self.match_bundles(task),
            ..Default::default()
        };
        if report.is_empty() {
            debug!(session = %ctx.session_id(), "no skill cleared the threshold");
            return Ok(report);
        }

        let chosen: Vec<String> = report
            .matches
            .iter()
            .take(self.max_active)
            .map(|m| m.name.clone())
            .collect();

        for name in &chosen {
            if self.activate(ctx, name)? == Activation::Activated {
                report.activated.push(name.clone());
            }
            for suggestion in self.suggest_details(name, task)? {
                if self.load_detail(ctx, name, &suggestion.topic)? == DetailLoad::Loaded {
                    report.loaded_details.push(DetailKey::new(name.as_str(), suggestion.topic));
                }
            }
        }

        Ok(report)
    }
}
