use console::style;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tome_config::ConfigLoader;
use tome_core::TomeError;
use tome_skills::definition::{REFERENCES_DIR, SKILL_FILE};
use tome_skills::{LoadedContext, RegistryBuilder, SelectionReport, Selector, SkillRegistry};
use tracing::debug;

/// Discover every bundle in the configured skill directories.
fn load_registry(loader: &ConfigLoader) -> tome_core::Result<SkillRegistry> {
    let mut builder = RegistryBuilder::with_dirs(loader.skill_dirs());
    let loaded = builder.discover()?;
    debug!(dirs = ?builder.dirs(), count = loaded.len(), "discovered skills");
    builder.build()
}

fn selector(loader: &ConfigLoader) -> tome_core::Result<Selector> {
    let registry = Arc::new(load_registry(loader)?);
    Ok(Selector::from_config(registry, &loader.get().selector))
}

fn dirs_hint(loader: &ConfigLoader) -> String {
    loader
        .skill_dirs()
        .iter()
        .map(|d| d.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub(super) fn cmd_list(loader: &ConfigLoader, json: bool) -> tome_core::Result<()> {
    let registry = load_registry(loader)?;

    if json {
        println!("{}", serde_json::to_string_pretty(registry.list())?);
        return Ok(());
    }

    if registry.is_empty() {
        println!("No skills found in {}", dirs_hint(loader));
        println!("  Create one with: tome create <name>");
        return Ok(());
    }

    println!("{}\n", style(format!("Available Skills ({}):", registry.len())).bold());
    for b in registry.list() {
        let tags = if b.tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", b.tags.join(", "))
        };
        println!("  {} v{}{}", style(&b.name).cyan(), b.version, tags);
        println!("    {}", b.description);
        if !b.details.is_empty() {
            let topics: Vec<&str> = b.topics().collect();
            println!("    Topics: {}", topics.join(", "));
        }
        if !b.source_path.as_os_str().is_empty() {
            println!("    File: {}", b.source_path.display());
        }
        println!();
    }
    Ok(())
}

pub(super) fn cmd_show(loader: &ConfigLoader, name: &str, details: bool) -> tome_core::Result<()> {
    let registry = load_registry(loader)?;
    let Some(bundle) = registry.get(name) else {
        println!("Skill '{name}' not found.");
        return Ok(());
    };

    println!("{} v{}", style(&bundle.name).bold(), bundle.version);
    println!("  {}", bundle.description);
    if let Some(ref author) = bundle.author {
        println!("  Author: {author}");
    }
    if !bundle.tags.is_empty() {
        println!("  Tags: {}", bundle.tags.join(", "));
    }
    println!("  File: {}", bundle.source_path.display());

    println!("\n  {}", style("Summary:").bold());
    for line in bundle.summary.lines() {
        println!("    {line}");
    }

    if !bundle.details.is_empty() {
        println!("\n  {}", style("Detail topics:").bold());
        for doc in &bundle.details {
            println!("    {} — {}", style(&doc.topic).cyan(), doc.hint);
            if details {
                for line in doc.content.lines() {
                    println!("      {line}");
                }
                println!();
            }
        }
    }
    Ok(())
}

pub(super) fn cmd_match(loader: &ConfigLoader, task: &str, json: bool) -> tome_core::Result<()> {
    let selector = selector(loader)?;
    let matches = selector.match_bundles(task);

    if json {
        println!("{}", serde_json::to_string_pretty(&matches)?);
        return Ok(());
    }

    if matches.is_empty() {
        println!(
            "No skill cleared the threshold ({:.2}, {} scoring).",
            selector.threshold(),
            selector.scorer().name()
        );
        return Ok(());
    }
    for (rank, m) in matches.iter().enumerate() {
        println!("  {}. {} {}", rank + 1, style(&m.name).cyan(), style(format!("{:.3}", m.score)).dim());
    }
    Ok(())
}

#[derive(Serialize)]
struct LoadOutput<'a> {
    report: &'a SelectionReport,
    context: &'a LoadedContext,
}

pub(super) fn cmd_load(
    loader: &ConfigLoader,
    task: &str,
    extra: &[(String, String)],
    json: bool,
) -> tome_core::Result<()> {
    let selector = selector(loader)?;
    let mut ctx = LoadedContext::new();
    let report = selector.select(&mut ctx, task)?;

    for (bundle, topic) in extra {
        match selector.load_detail(&mut ctx, bundle, topic) {
            Ok(_) => {}
            Err(e) if e.is_not_found() => {
                eprintln!(
                    "{} {bundle}/{topic}: {e}; no specialized guidance available",
                    style("⚠️ ").yellow()
                );
            }
            Err(e) => return Err(e),
        }
    }

    if json {
        let out = LoadOutput {
            report: &report,
            context: &ctx,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if ctx.is_empty() {
        println!("No specialized guidance for this task.");
        return Ok(());
    }
    println!("{}", ctx.render());
    Ok(())
}

pub(super) fn cmd_validate(loader: &ConfigLoader) -> tome_core::Result<()> {
    println!("🔎 Validating skills in {}", dirs_hint(loader));

    let registry = match load_registry(loader) {
        Ok(r) => r,
        Err(e) => {
            println!("  {} {e}", style("❌").red());
            return Err(e);
        }
    };

    let mut dangling = 0;
    for bundle in registry.list() {
        for topic in bundle.dangling_references() {
            dangling += 1;
            println!(
                "  {} {}: summary links to missing {}/{}.md",
                style("⚠️ ").yellow(),
                bundle.name,
                REFERENCES_DIR,
                topic
            );
        }
    }

    let details: usize = registry.list().iter().map(|b| b.details.len()).sum();
    println!(
        "  {} {} skills, {} detail documents, {} broken links",
        style("✅").green(),
        registry.len(),
        details,
        dangling
    );
    Ok(())
}

pub(super) fn cmd_create(loader: &ConfigLoader, name: &str) -> tome_core::Result<()> {
    let skills_dir = loader
        .skill_dirs()
        .into_iter()
        .next()
        .ok_or_else(|| TomeError::Config("no skill directories configured".into()))?;
    let bundle_dir = create_bundle(&skills_dir, name)?;
    println!("✅ Created skill template at {}", bundle_dir.join(SKILL_FILE).display());
    println!("   Edit SKILL.md and references/overview.md, then run 'tome validate'.");
    Ok(())
}

/// Bundle names become a single directory under the skills dir.
fn validate_bundle_name(name: &str) -> tome_core::Result<()> {
    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.contains(['/', '\\']) || name.trim() != name {
        return Err(TomeError::ConfigValidation {
            field: "name".into(),
            reason: format!("'{name}' is not a valid skill name (use a single directory name)"),
        });
    }
    Ok(())
}

/// Write a SKILL.md and one linked detail document under `skills_dir/name`.
fn create_bundle(skills_dir: &Path, name: &str) -> tome_core::Result<PathBuf> {
    validate_bundle_name(name)?;
    let bundle_dir = skills_dir.join(name);
    if bundle_dir.exists() {
        return Err(TomeError::Config(format!(
            "Skill '{}' already exists at {}",
            name,
            bundle_dir.display()
        )));
    }

    let refs = bundle_dir.join(REFERENCES_DIR);
    std::fs::create_dir_all(&refs)?;

    let template = format!(
        r#"---
name: {name}
description: Describe when this skill applies
version: 1.0.0
tags: []
---

# {name}

## When to use this skill

Describe the requests this skill should handle.

## Instructions

1. First, do this
2. Then check the result

## Further reading

- [Overview of {name}](references/overview.md)
"#
    );
    std::fs::write(bundle_dir.join(SKILL_FILE), template)?;
    std::fs::write(
        refs.join("overview.md"),
        format!("---\nhint: background on {name}\n---\n\n# {name} overview\n"),
    )?;
    Ok(bundle_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn created_bundle_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        create_bundle(dir.path(), "demo").unwrap();

        let mut builder = RegistryBuilder::new(&[dir.path()]);
        assert_eq!(builder.discover().unwrap(), vec!["demo"]);
        let registry = builder.build().unwrap();
        let bundle = registry.get("demo").unwrap();
        assert_eq!(bundle.topics().collect::<Vec<_>>(), vec!["overview"]);
        assert_eq!(bundle.detail("overview").unwrap().hint, "background on demo");
    }

    #[test]
    fn create_rejects_names_that_escape_skills_dir() {
        let root = tempfile::tempdir().unwrap();
        let skills = root.path().join("skills");
        std::fs::create_dir_all(&skills).unwrap();

        for name in ["../x", "..", ".", "", "a/b", "a\\b", "/abs", " padded"] {
            let err = create_bundle(&skills, name).unwrap_err();
            assert!(matches!(err, TomeError::ConfigValidation { .. }), "{name:?}");
        }
        assert!(!root.path().join("x").exists());
        assert_eq!(std::fs::read_dir(&skills).unwrap().count(), 0);
    }

    #[test]
    fn create_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        create_bundle(dir.path(), "demo").unwrap();
        assert!(create_bundle(dir.path(), "demo").is_err());
    }
}
