#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use tome_core::*;

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_not_found_grouping() {
        assert!(TomeError::BundleNotFound("x".into()).is_not_found());
        assert!(TomeError::BundleNotActive("x".into()).is_not_found());
        assert!(
            TomeError::TopicNotFound {
                bundle: "build".into(),
                topic: "nix".into()
            }
            .is_not_found()
        );
        assert!(!TomeError::DuplicateBundle("x".into()).is_not_found());
        assert!(!TomeError::Config("bad".into()).is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = TomeError::TopicNotFound {
            bundle: "build".into(),
            topic: "nix-expressions".into(),
        };
        assert_eq!(err.to_string(), "topic not found: build/nix-expressions");

        let err = TomeError::definition("/skills/a/SKILL.md", "missing name");
        assert_eq!(
            err.to_string(),
            "invalid skill definition /skills/a/SKILL.md: missing name"
        );

        let err = TomeError::OrphanDetail {
            bundle: "build".into(),
            topic: "layers".into(),
        };
        assert!(err.to_string().contains("build/layers"));
    }

    #[test]
    fn test_io_error_converts() {
        fn read() -> Result<String> {
            Ok(std::fs::read_to_string("/definitely/not/here/tome.toml")?)
        }
        assert!(matches!(read(), Err(TomeError::Io(_))));
    }

    // ── Type tests ─────────────────────────────────────────────

    #[test]
    fn test_detail_key_ordering() {
        let mut keys = BTreeSet::new();
        keys.insert(DetailKey::new("sharing", "publish"));
        keys.insert(DetailKey::new("build", "layers"));
        keys.insert(DetailKey::new("build", "flakes"));
        let ordered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(ordered, vec!["build/flakes", "build/layers", "sharing/publish"]);
    }

    #[test]
    fn test_material_kind_serde() {
        let json = serde_json::to_string(&MaterialKind::Summary).unwrap();
        assert_eq!(json, "\"summary\"");
        let restored: MaterialKind = serde_json::from_str("\"detail\"").unwrap();
        assert_eq!(restored, MaterialKind::Detail);
    }
}
