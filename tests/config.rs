use std::path::Path;

use figment::Jail;
use sentiment_service::config_loader::{load_config, ServiceConfig};

#[test]
fn defaults_apply_without_a_config_file() {
    Jail::expect_with(|_jail| {
        let config = load_config(None)?;
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.artifact_paths().vectorizer, "artifacts/tfidf_vectorizer.json");
        assert_eq!(config.artifact_paths().classifier, "artifacts/sentiment_model.json");
        Ok(())
    });
}

#[test]
fn toml_file_overrides_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "sentiment.toml",
            r#"
                port = 8080
                model_path = "models/clf.json"
                log_filter = "debug"
            "#,
        )?;

        let config = load_config(None)?;
        assert_eq!(config.port, 8080);
        assert_eq!(config.model_path, "models/clf.json");
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.host, "0.0.0.0");
        Ok(())
    });
}

#[test]
fn explicit_config_path_is_used() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "host = \"127.0.0.1\"\nport = 9000")?;

        let config = load_config(Some(Path::new("custom.toml")))?;
        assert_eq!(config.bind_addr(), "127.0.0.1:9000");
        Ok(())
    });
}

#[test]
fn environment_wins_over_file() {
    Jail::expect_with(|jail| {
        jail.create_file("sentiment.toml", "port = 8080")?;
        jail.set_env("SENTIMENT_PORT", "7070");
        jail.set_env("SENTIMENT_VECTORIZER_PATH", "/srv/vec.json");

        let config = load_config(None)?;
        assert_eq!(config.port, 7070);
        assert_eq!(config.vectorizer_path, "/srv/vec.json");
        Ok(())
    });
}

#[test]
fn digests_flow_into_artifact_paths() {
    Jail::expect_with(|jail| {
        let digest = "ab".repeat(32);
        jail.set_env("SENTIMENT_MODEL_SHA256", &digest);

        let paths = load_config(None)?.artifact_paths();
        assert_eq!(paths.classifier_sha256.as_deref(), Some(digest.as_str()));
        assert_eq!(paths.vectorizer_sha256, None);
        Ok(())
    });
}

#[test]
fn invalid_values_are_rejected() {
    Jail::expect_with(|jail| {
        jail.create_file("sentiment.toml", "port = 0")?;
        assert!(load_config(None).is_err());

        jail.create_file("sentiment.toml", "vectorizer_sha256 = \"not-a-digest\"")?;
        assert!(load_config(None).is_err());

        jail.create_file("sentiment.toml", "max_body_bytes = 0")?;
        assert!(load_config(None).is_err());

        jail.create_file("sentiment.toml", "port = \"eighty\"")?;
        assert!(load_config(None).is_err());
        Ok(())
    });
}
