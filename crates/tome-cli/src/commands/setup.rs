use std::path::{Path, PathBuf};

const STARTER_CONFIG: &str = r#"# 📚 Tome Configuration

[skills]
# Skill directories in precedence order; relative paths resolve against this file.
dirs = ["skills"]

[selector]
strategy = "lexical"   # "lexical" or "hashed"
threshold = 0.25       # minimum relevance score (0.0 - 1.0]
# max_active = 2       # bundles activated per selection
# embedding_dims = 256 # hashed strategy only

[logging]
level = "info"
format = "pretty"      # pretty, json, compact
"#;

pub(super) fn cmd_init(local: bool) -> tome_core::Result<()> {
    let dir = if local {
        std::env::current_dir()?
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".tome")
    };

    match write_starter(&dir)? {
        Some(config_path) => {
            println!("✅ Created {}", config_path.display());
            println!("   Add bundles under {}", dir.join("skills").display());
            println!("   or scaffold one with 'tome create <name>'.");
        }
        None => {
            println!("⚠️  {} already exists", dir.join("tome.toml").display());
        }
    }
    Ok(())
}

/// Write `tome.toml` and an empty `skills/` into `dir`. `None` if a config
/// already exists there.
fn write_starter(dir: &Path) -> tome_core::Result<Option<PathBuf>> {
    std::fs::create_dir_all(dir.join("skills"))?;
    let config_path = dir.join("tome.toml");
    if config_path.exists() {
        return Ok(None);
    }
    std::fs::write(&config_path, STARTER_CONFIG)?;
    Ok(Some(config_path))
}
