use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tome_core::{Result, TomeError};
use tracing::{debug, info, warn};

use crate::definition::{SKILL_FILE, SkillBundle};

/// Collects bundle definitions and validates them into a [`SkillRegistry`].
///
/// Skill directories are listed in precedence order: when the same bundle
/// name appears in more than one directory, the first directory wins.
/// Programmatically registered bundles take precedence over discovered ones.
pub struct RegistryBuilder {
    dirs: Vec<PathBuf>,
    bundles: Vec<SkillBundle>,
    index: HashMap<String, usize>,
}

impl RegistryBuilder {
    /// Create a builder with the given skill directories.
    /// Directories are listed in precedence order (first = highest priority).
    pub fn new(dirs: &[&Path]) -> Self {
        Self::with_dirs(dirs.iter().map(|d| d.to_path_buf()).collect())
    }

    pub fn with_dirs(dirs: Vec<PathBuf>) -> Self {
        Self {
            dirs,
            bundles: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// A builder with no directories, for programmatic registries.
    pub fn empty() -> Self {
        Self::with_dirs(Vec::new())
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Discover bundles from all skill directories, returning the names loaded.
    ///
    /// A bundle is either `<dir>/<bundle>/SKILL.md` or a `SKILL.md` directly in
    /// `<dir>`. Entries are visited in file-name order so registration order is
    /// reproducible. Malformed bundles are skipped with a warning.
    pub fn discover(&mut self) -> Result<Vec<String>> {
        let mut loaded = Vec::new();

        for dir in self.dirs.clone() {
            if !dir.exists() {
                debug!(?dir, "skills directory does not exist, skipping");
                continue;
            }

            let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)
                .map_err(|e| {
                    TomeError::Config(format!(
                        "failed to read skills dir {}: {}",
                        dir.display(),
                        e
                    ))
                })?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .collect();
            paths.sort();

            for path in paths {
                let skill_md = if path.is_dir() {
                    path.join(SKILL_FILE)
                } else if path.file_name().is_some_and(|n| n == SKILL_FILE) {
                    path
                } else {
                    continue;
                };
                if !skill_md.exists() {
                    continue;
                }

                match SkillBundle::from_file(&skill_md) {
                    Ok(bundle) => {
                        if self.index.contains_key(&bundle.name) {
                            debug!(
                                skill = %bundle.name,
                                path = ?skill_md,
                                "skill already loaded from higher-priority source, skipping"
                            );
                            continue;
                        }
                        info!(
                            skill = %bundle.name,
                            details = bundle.details.len(),
                            path = ?skill_md,
                            "loaded skill"
                        );
                        loaded.push(bundle.name.clone());
                        self.insert(bundle);
                    }
                    Err(e) => {
                        warn!(path = ?skill_md, error = %e, "failed to load skill");
                    }
                }
            }
        }

        Ok(loaded)
    }

    /// Register a bundle programmatically. Names must be unique.
    pub fn register(&mut self, bundle: SkillBundle) -> Result<()> {
        if self.index.contains_key(&bundle.name) {
            return Err(TomeError::DuplicateBundle(bundle.name));
        }
        self.insert(bundle);
        Ok(())
    }

    /// Chaining form of [`RegistryBuilder::register`].
    pub fn with_bundle(mut self, bundle: SkillBundle) -> Result<Self> {
        self.register(bundle)?;
        Ok(self)
    }

    fn insert(&mut self, bundle: SkillBundle) {
        self.index.insert(bundle.name.clone(), self.bundles.len());
        self.bundles.push(bundle);
    }

    /// Validate every bundle and freeze the registry.
    ///
    /// Fails on the first bundle with an empty name or description, a repeated
    /// topic, or a detail document the summary never links to. Links with no
    /// matching document are only warned about.
    pub fn build(self) -> Result<SkillRegistry> {
        for bundle in &self.bundles {
            validate(bundle)?;
        }
        info!(count = self.bundles.len(), "skill registry ready");
        Ok(SkillRegistry {
            bundles: self.bundles,
            index: self.index,
        })
    }
}

fn validate(bundle: &SkillBundle) -> Result<()> {
    if bundle.name.trim().is_empty() {
        return Err(TomeError::definition(&bundle.source_path, "skill name is empty"));
    }
    if bundle.description.trim().is_empty() {
        return Err(TomeError::definition(
            &bundle.source_path,
            format!("skill '{}' has no description", bundle.name),
        ));
    }

    let mut topics: Vec<&str> = bundle.topics().collect();
    topics.sort_unstable();
    if let Some(w) = topics.windows(2).find(|w| w[0] == w[1]) {
        return Err(TomeError::definition(
            &bundle.source_path,
            format!("skill '{}' has duplicate topic '{}'", bundle.name, w[0]),
        ));
    }

    if let Some(orphan) = bundle.orphan_topics().first() {
        return Err(TomeError::OrphanDetail {
            bundle: bundle.name.clone(),
            topic: orphan.to_string(),
        });
    }

    for topic in bundle.dangling_references() {
        warn!(skill = %bundle.name, topic, "summary links to a missing detail document");
    }
    Ok(())
}

/// Immutable catalog of skill bundles, in registration order.
///
/// Built once by [`RegistryBuilder`] and shared read-only (typically behind an
/// `Arc`) by every session's selector.
#[derive(Debug)]
pub struct SkillRegistry {
    bundles: Vec<SkillBundle>,
    index: HashMap<String, usize>,
}

impl SkillRegistry {
    /// Get a bundle by name.
    pub fn get(&self, name: &str) -> Option<&SkillBundle> {
        self.index.get(name).map(|&i| &self.bundles[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All bundles in registration order.
    pub fn list(&self) -> &[SkillBundle] {
        &self.bundles
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bundles.iter().map(|b| b.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }

    /// Generate the `<available_skills>` block for a system prompt.
    /// Lists name, description and detail topics; the host activates a bundle
    /// to load its summary.
    pub fn system_prompt_block(&self) -> Option<String> {
        if self.bundles.is_empty() {
            return None;
        }

        let mut block = String::from("\n\n<available_skills>\n");
        for bundle in &self.bundles {
            block.push_str(&format!(
                "<skill>\n  <name>{}</name>\n  <description>{}</description>\n",
                bundle.name, bundle.description,
            ));
            if !bundle.details.is_empty() {
                let topics: Vec<&str> = bundle.topics().collect();
                block.push_str(&format!("  <topics>{}</topics>\n", topics.join(", ")));
            }
            block.push_str("</skill>\n");
        }
        block.push_str("</available_skills>");

        Some(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::REFERENCES_DIR;

    fn write_bundle(root: &Path, dir: &str, name: &str, description: &str) -> PathBuf {
        let bundle_dir = root.join(dir);
        std::fs::create_dir_all(&bundle_dir).unwrap();
        std::fs::write(
            bundle_dir.join(SKILL_FILE),
            format!("---\nname: {name}\ndescription: {description}\n---\n\n# {name}\n"),
        )
        .unwrap();
        bundle_dir
    }

    #[test]
    fn register_and_lookup() {
        let reg = RegistryBuilder::empty()
            .with_bundle(SkillBundle::new("build", "packaging and build steps", "Build."))
            .unwrap()
            .with_bundle(SkillBundle::new("sharing", "publishing environments", "Share."))
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(reg.len(), 2);
        assert!(reg.get("build").is_some());
        assert!(reg.get("nonexistent").is_none());
        assert!(reg.contains("sharing"));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["build", "sharing"]);
    }

    #[test]
    fn duplicate_registration_errors() {
        let mut builder = RegistryBuilder::empty();
        builder.register(SkillBundle::new("build", "d", "s")).unwrap();
        let err = builder.register(SkillBundle::new("build", "other", "s")).unwrap_err();
        assert!(matches!(err, TomeError::DuplicateBundle(n) if n == "build"));
    }

    #[test]
    fn orphan_detail_fails_build() {
        let bundle = SkillBundle::new("build", "packaging", "No links here.")
            .with_detail_hint("nix-expressions", "Body.", "expressions");
        let err = RegistryBuilder::empty()
            .with_bundle(bundle)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TomeError::OrphanDetail { ref bundle, ref topic } if bundle == "build" && topic == "nix-expressions"
        ));
    }

    #[test]
    fn foreign_links_do_not_satisfy_orphan_check() {
        let bundle = SkillBundle::new(
            "build",
            "packaging",
            "See [composition](../sharing/references/composition.md) and \
             [layers](https://example.com/docs/references/layers.md).",
        )
        .with_detail_hint("composition", "Body.", "composing");
        assert!(bundle.cross_references.is_empty());
        let err = RegistryBuilder::empty()
            .with_bundle(bundle)
            .unwrap()
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            TomeError::OrphanDetail { ref topic, .. } if topic == "composition"
        ));
    }

    #[test]
    fn link_in_code_block_does_not_satisfy_orphan_check() {
        let bundle = SkillBundle::new(
            "build",
            "packaging",
            "Example:\n\n```\n[expressions](references/nix-expressions.md)\n```\n",
        )
        .with_detail_hint("nix-expressions", "Body.", "expressions");
        let result = RegistryBuilder::empty().with_bundle(bundle).unwrap().build();
        assert!(matches!(result, Err(TomeError::OrphanDetail { .. })));
    }

    #[test]
    fn dangling_reference_is_tolerated() {
        let bundle = SkillBundle::new("build", "packaging", "See [later](references/later.md).");
        assert!(RegistryBuilder::empty().with_bundle(bundle).unwrap().build().is_ok());
    }

    #[test]
    fn duplicate_topic_fails_build() {
        let bundle = SkillBundle::new("build", "packaging", "[a](references/a.md)")
            .with_detail("a", "one")
            .with_detail("a", "two");
        let err = RegistryBuilder::empty().with_bundle(bundle).unwrap().build().unwrap_err();
        assert!(err.to_string().contains("duplicate topic 'a'"));
    }

    #[test]
    fn empty_description_fails_build() {
        let bundle = SkillBundle::new("build", "  ", "Summary.");
        assert!(RegistryBuilder::empty().with_bundle(bundle).unwrap().build().is_err());
    }

    #[test]
    fn system_prompt_block_format() {
        let reg = RegistryBuilder::empty()
            .with_bundle(
                SkillBundle::new("build", "Packaging and build steps", "[x](references/layers.md)")
                    .with_detail("layers", "Layers."),
            )
            .unwrap()
            .with_bundle(SkillBundle::new("sharing", "Publishing environments", "Share."))
            .unwrap()
            .build()
            .unwrap();

        let block = reg.system_prompt_block().unwrap();
        assert!(block.contains("<available_skills>"));
        assert!(block.contains("</available_skills>"));
        assert!(block.contains("<name>build</name>"));
        assert!(block.contains("<description>Publishing environments</description>"));
        assert!(block.contains("<topics>layers</topics>"));
        assert!(block.find("build").unwrap() < block.find("sharing").unwrap());
    }

    #[test]
    fn system_prompt_empty_when_no_skills() {
        let reg = RegistryBuilder::empty().build().unwrap();
        assert!(reg.is_empty());
        assert!(reg.system_prompt_block().is_none());
    }

    #[test]
    fn discover_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "zeta", "zeta", "Last alphabetically");
        let alpha = write_bundle(dir.path(), "alpha", "alpha", "First alphabetically");
        let refs = alpha.join(REFERENCES_DIR);
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(
            alpha.join(SKILL_FILE),
            "---\nname: alpha\ndescription: First\n---\n\nSee [topic](references/topic.md).",
        )
        .unwrap();
        std::fs::write(refs.join("topic.md"), "Topic body.").unwrap();

        // Not a skill: no SKILL.md
        let noise = dir.path().join("not-a-skill");
        std::fs::create_dir_all(&noise).unwrap();
        std::fs::write(noise.join("README.md"), "Just a readme.").unwrap();

        // Malformed: skipped, not fatal
        let broken = dir.path().join("broken");
        std::fs::create_dir_all(&broken).unwrap();
        std::fs::write(broken.join(SKILL_FILE), "no frontmatter").unwrap();

        let mut builder = RegistryBuilder::new(&[dir.path()]);
        let loaded = builder.discover().unwrap();
        assert_eq!(loaded, vec!["alpha", "zeta"]);

        let reg = builder.build().unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("alpha").unwrap().details.len(), 1);
        assert!(reg.get("not-a-skill").is_none());
    }

    #[test]
    fn skill_md_directly_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SKILL_FILE),
            "---\nname: flat\ndescription: Flat layout\n---\n\nBody.",
        )
        .unwrap();
        let mut builder = RegistryBuilder::new(&[dir.path()]);
        assert_eq!(builder.discover().unwrap(), vec!["flat"]);
    }

    #[test]
    fn precedence_higher_dir_wins() {
        let high = tempfile::tempdir().unwrap();
        let low = tempfile::tempdir().unwrap();
        write_bundle(high.path(), "dup", "dup", "High priority version");
        write_bundle(low.path(), "dup", "dup", "Low priority version");

        let mut builder = RegistryBuilder::new(&[high.path(), low.path()]);
        builder.discover().unwrap();
        let reg = builder.build().unwrap();
        assert_eq!(reg.get("dup").unwrap().description, "High priority version");
    }

    #[test]
    fn registered_bundle_beats_discovered() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(dir.path(), "dup", "dup", "From disk");

        let mut builder = RegistryBuilder::new(&[dir.path()]);
        builder.register(SkillBundle::new("dup", "In memory", "Body.")).unwrap();
        assert!(builder.discover().unwrap().is_empty());
        assert_eq!(builder.build().unwrap().get("dup").unwrap().description, "In memory");
    }

    #[test]
    fn discovered_orphan_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = write_bundle(dir.path(), "build", "build", "packaging");
        let refs = bundle.join(REFERENCES_DIR);
        std::fs::create_dir_all(&refs).unwrap();
        std::fs::write(refs.join("unlinked.md"), "Nobody links here.").unwrap();

        let mut builder = RegistryBuilder::new(&[dir.path()]);
        builder.discover().unwrap();
        assert!(matches!(builder.build(), Err(TomeError::OrphanDetail { .. })));
    }

    #[test]
    fn nonexistent_dir_is_fine() {
        let mut builder = RegistryBuilder::new(&[Path::new("/nonexistent/path/to/skills")]);
        assert!(builder.discover().unwrap().is_empty());
    }
}
