use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tome_core::{Result, TomeError};

/// Directory (relative to the bundle) holding detail documents.
pub const REFERENCES_DIR: &str = "references";

/// File name of a bundle's summary document.
pub const SKILL_FILE: &str = "SKILL.md";

/// Markdown links whose target is this bundle's `references/<topic>.md`,
/// optionally `./`-prefixed and with a `#fragment`. Link text may contain one
/// level of nested brackets.
static CROSS_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\[((?:[^\[\]]|\[[^\[\]]*\])*)\]\(\s*(?:\./)?references/([A-Za-z0-9._-]+?)\.md(?:#[^)\s]*)?\s*\)",
    )
    .expect("cross-reference pattern is valid")
});

/// A skill bundle: a summary that is always loaded on activation, plus detail
/// documents that are loaded only on demand.
#[derive(Debug, Clone, Serialize)]
pub struct SkillBundle {
    /// Bundle name (from frontmatter). Unique within a registry.
    pub name: String,
    /// Trigger description: when this bundle applies.
    pub description: String,
    /// Semantic version.
    pub version: String,
    /// Tags; appended to the trigger text when scoring.
    pub tags: Vec<String>,
    pub author: Option<String>,
    /// The summary document (Markdown body of SKILL.md).
    pub summary: String,
    /// Detail documents, in file-name order.
    pub details: Vec<DetailDocument>,
    /// Cross-references found in the summary, in order of first appearance.
    pub cross_references: Vec<CrossReference>,
    /// Absolute path to the SKILL.md file (empty for programmatic bundles).
    #[serde(skip)]
    pub source_path: PathBuf,
    /// Base directory of the bundle (parent of SKILL.md).
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// A secondary document within a bundle.
#[derive(Debug, Clone, Serialize)]
pub struct DetailDocument {
    /// Topic label, e.g. `nix-expressions`.
    pub topic: String,
    pub content: String,
    /// When this document is needed.
    pub hint: String,
    #[serde(skip)]
    pub source_path: PathBuf,
}

/// A link from the summary to a detail document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    pub topic: String,
    /// Link text of the first link to this topic.
    pub text: String,
}

fn default_version() -> String {
    "1.0.0".into()
}

impl SkillBundle {
    /// Build a bundle in memory. Cross-references are extracted from `summary`.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        let summary = summary.into();
        let cross_references = extract_cross_references(&summary);
        Self {
            name: name.into(),
            description: description.into(),
            version: default_version(),
            tags: Vec::new(),
            author: None,
            summary,
            details: Vec::new(),
            cross_references,
            source_path: PathBuf::new(),
            base_dir: PathBuf::new(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Add a detail document whose hint is the summary's link text for it.
    pub fn with_detail(self, topic: impl Into<String>, content: impl Into<String>) -> Self {
        let topic = topic.into();
        let hint = self.link_text_for(&topic).unwrap_or_default();
        self.with_detail_hint(topic, content, hint)
    }

    /// Add a detail document with an explicit load hint.
    pub fn with_detail_hint(
        mut self,
        topic: impl Into<String>,
        content: impl Into<String>,
        hint: impl Into<String>,
    ) -> Self {
        self.details.push(DetailDocument {
            topic: topic.into(),
            content: content.into(),
            hint: hint.into(),
            source_path: PathBuf::new(),
        });
        self
    }

    /// Load a bundle from its SKILL.md file, reading every detail document in
    /// the sibling `references/` directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TomeError::definition(path, format!("failed to read: {}", e)))?;

        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        let mut bundle = Self::parse(&content, path.to_path_buf(), base_dir)?;
        bundle.details = read_details(&bundle.base_dir.join(REFERENCES_DIR), &bundle)?;
        Ok(bundle)
    }

    /// Parse SKILL.md content with known path info. Detail documents are not
    /// read; see [`SkillBundle::from_file`].
    ///
    /// ```text
    /// ---
    /// name: build
    /// description: packaging and build steps
    /// tags: [nix, containers]
    /// ---
    ///
    /// # Building
    ///
    /// For expression syntax see [writing Nix expressions](references/nix-expressions.md).
    /// ```
    pub fn parse(content: &str, source_path: PathBuf, base_dir: PathBuf) -> Result<Self> {
        let (frontmatter, body) = split_frontmatter(content)
            .ok_or_else(|| TomeError::definition(&source_path, "must start with YAML frontmatter (---)"))?
            .map_err(|reason| TomeError::definition(&source_path, reason))?;

        let fm = Frontmatter::parse(&frontmatter);

        // Resolve {baseDir} in body
        let base_dir_str = base_dir.to_string_lossy().to_string();
        let summary = body.replace("{baseDir}", &base_dir_str);

        let name = fm.name.unwrap_or_default();
        if name.is_empty() {
            return Err(TomeError::definition(&source_path, "skill name is empty"));
        }
        let description = fm.description.unwrap_or_default();
        if description.is_empty() {
            return Err(TomeError::definition(
                &source_path,
                format!("skill '{}' has no description", name),
            ));
        }

        let mut bundle = SkillBundle::new(name, description, summary);
        bundle.version = fm.version.unwrap_or_else(default_version);
        bundle.tags = fm.tags;
        bundle.author = fm.author;
        bundle.source_path = source_path;
        bundle.base_dir = base_dir;
        Ok(bundle)
    }

    /// Text compared against task descriptions: description plus tags.
    pub fn trigger_text(&self) -> String {
        if self.tags.is_empty() {
            self.description.clone()
        } else {
            format!("{} {}", self.description, self.tags.join(" "))
        }
    }

    pub fn detail(&self, topic: &str) -> Option<&DetailDocument> {
        self.details.iter().find(|d| d.topic == topic)
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.details.iter().map(|d| d.topic.as_str())
    }

    /// Whether the summary links to `topic`.
    pub fn references(&self, topic: &str) -> bool {
        self.cross_references.iter().any(|r| r.topic == topic)
    }

    /// Detail documents the summary never links to.
    pub fn orphan_topics(&self) -> Vec<&str> {
        self.topics().filter(|t| !self.references(t)).collect()
    }

    /// Cross-references with no matching detail document.
    pub fn dangling_references(&self) -> Vec<&str> {
        self.cross_references
            .iter()
            .map(|r| r.topic.as_str())
            .filter(|t| self.detail(t).is_none())
            .collect()
    }

    fn link_text_for(&self, topic: &str) -> Option<String> {
        self.cross_references
            .iter()
            .find(|r| r.topic == topic)
            .map(|r| r.text.clone())
    }
}

/// Find every `references/<topic>.md` link in a Markdown document, keeping the
/// first link text for each topic. Links inside fenced code blocks are not
/// cross-references.
pub fn extract_cross_references(markdown: &str) -> Vec<CrossReference> {
    let prose = strip_fenced_blocks(markdown);
    let mut seen = HashSet::new();
    let mut refs = Vec::new();
    for cap in CROSS_REF.captures_iter(&prose) {
        let topic = cap[2].to_string();
        if seen.insert(topic.clone()) {
            refs.push(CrossReference {
                topic,
                text: cap[1].trim().to_string(),
            });
        }
    }
    refs
}

/// Drop fenced code blocks (```` ``` ```` or `~~~`). An unclosed fence runs to
/// the end of the document.
fn strip_fenced_blocks(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    let mut fence: Option<(char, usize)> = None;
    for line in markdown.lines() {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let run = marker.map_or(0, |c| trimmed.chars().take_while(|x| *x == c).count());
        match (fence, marker) {
            (None, Some(c)) if run >= 3 => fence = Some((c, run)),
            (Some((open, len)), Some(c))
                if c == open && run >= len && trimmed[run..].trim().is_empty() =>
            {
                fence = None
            }
            (None, _) => {
                out.push_str(line);
                out.push('\n');
            }
            (Some(_), _) => {}
        }
    }
    out
}

fn read_details(dir: &Path, bundle: &SkillBundle) -> Result<Vec<DetailDocument>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| TomeError::definition(dir, format!("failed to read references: {}", e)))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "md"))
        .collect();
    paths.sort();

    let mut details = Vec::with_capacity(paths.len());
    for path in paths {
        let Some(topic) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            continue;
        };
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| TomeError::definition(&path, format!("failed to read: {}", e)))?;

        let (hint, content) = match split_frontmatter(&raw) {
            Some(Ok((fm, body))) => (Frontmatter::parse(&fm).hint, body),
            Some(Err(reason)) => return Err(TomeError::definition(&path, reason)),
            None => (None, raw.trim().to_string()),
        };
        let hint = hint
            .or_else(|| bundle.link_text_for(&topic))
            .unwrap_or_default();

        details.push(DetailDocument {
            topic,
            content: content.replace("{baseDir}", &bundle.base_dir.to_string_lossy()),
            hint,
            source_path: path,
        });
    }
    Ok(details)
}

/// Split a document into YAML frontmatter and Markdown body.
///
/// `None` when the document has no frontmatter at all; `Some(Err)` when the
/// opening `---` is never closed.
fn split_frontmatter(content: &str) -> Option<std::result::Result<(String, String), String>> {
    let trimmed = content.trim();
    let after_first = trimmed.strip_prefix("---")?;

    let Some(end_pos) = after_first.find("\n---") else {
        return Some(Err("missing closing --- for frontmatter".into()));
    };

    let frontmatter = after_first[..end_pos].trim().to_string();
    let body = after_first[end_pos + 4..].trim().to_string();
    Some(Ok((frontmatter, body)))
}

/// The frontmatter keys Tome understands. Unknown keys are ignored.
#[derive(Default)]
struct Frontmatter {
    name: Option<String>,
    description: Option<String>,
    version: Option<String>,
    author: Option<String>,
    hint: Option<String>,
    tags: Vec<String>,
}

impl Frontmatter {
    /// Simple `key: value` parsing; no nested YAML.
    fn parse(yaml: &str) -> Self {
        let mut fm = Frontmatter::default();

        for line in yaml.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((key, value)) = line.split_once(':') {
                let value = value.trim();
                match key.trim() {
                    "name" => fm.name = Some(unquote(value)),
                    "description" => fm.description = Some(unquote(value)),
                    "version" => fm.version = Some(unquote(value)),
                    "author" => fm.author = Some(unquote(value)),
                    "hint" => fm.hint = Some(unquote(value)),
                    "tags" => {
                        // [tag1, tag2] or tag1, tag2
                        let inner = value.trim_start_matches('[').trim_end_matches(']');
                        fm.tags = inner
                            .split(',')
                            .map(|t| unquote(t.trim()))
                            .filter(|t| !t.is_empty())
                            .collect();
                    }
                    _ => {}
                }
            }
        }

        fm
    }
}

/// Remove surrounding quotes from a YAML value.
fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}
