//! Tests for relay configuration / 中继配置测试

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::tempdir;

    const ENV_KEYS: [&str; 6] = [
        "OLLAMA_HOST",
        "OLLAMA_MODEL",
        "ALLOW_ORIGINS",
        "MAPDESC_RELAY__OLLAMA__TIMEOUT_MS",
        "MAPDESC_RELAY__OLLAMA__MODEL",
        "MAPDESC_RELAY__IMAGE__STRICT_BASE64",
    ];

    fn clear_env() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_relay_config_default() {
        // Test default RelayConfig / 测试默认RelayConfig
        let config = RelayConfig::default();

        assert_eq!(config.ollama.host, "http://127.0.0.1:11434");
        assert_eq!(config.ollama.model, "qwen3-vl:4b");
        assert_eq!(config.ollama.timeout_ms, 120_000);
        assert_eq!(config.http.allow_origins, "*");
        assert_eq!(config.http.server.addr.port(), 8000);
        assert!(!config.image.strict_base64);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_load_defaults_without_sources() {
        clear_env();
        let config = AppConfig::load_with_cli(&CliArgs::default()).unwrap();
        assert_eq!(config.relay.ollama.model, DEFAULT_OLLAMA_MODEL);
        assert_eq!(config.relay.ollama.host, DEFAULT_OLLAMA_HOST);
    }

    #[test]
    #[serial]
    fn test_legacy_env_names() {
        // Unprefixed names override defaults / 无前缀变量覆盖默认值
        clear_env();
        std::env::set_var("OLLAMA_HOST", "http://gpu-box:11434");
        std::env::set_var("OLLAMA_MODEL", "qwen2.5vl:7b");
        std::env::set_var("ALLOW_ORIGINS", "https://maps.example.org,https://a.example.org");

        let config = AppConfig::load_with_cli(&CliArgs::default()).unwrap();
        clear_env();

        assert_eq!(config.relay.ollama.host, "http://gpu-box:11434");
        assert_eq!(config.relay.ollama.model, "qwen2.5vl:7b");
        assert_eq!(
            config.relay.http.allow_origins,
            "https://maps.example.org,https://a.example.org"
        );
    }

    #[test]
    #[serial]
    fn test_prefixed_env_nested_keys() {
        clear_env();
        std::env::set_var("MAPDESC_RELAY__OLLAMA__TIMEOUT_MS", "5000");
        std::env::set_var("MAPDESC_RELAY__IMAGE__STRICT_BASE64", "true");

        let config = AppConfig::load_with_cli(&CliArgs::default()).unwrap();
        clear_env();

        assert_eq!(config.relay.ollama.timeout_ms, 5000);
        assert!(config.relay.image.strict_base64);
    }

    #[test]
    #[serial]
    fn test_legacy_env_beats_prefixed_env() {
        clear_env();
        std::env::set_var("MAPDESC_RELAY__OLLAMA__MODEL", "from-prefixed");
        std::env::set_var("OLLAMA_MODEL", "from-legacy");

        let config = AppConfig::load_with_cli(&CliArgs::default()).unwrap();
        clear_env();

        assert_eq!(config.relay.ollama.model, "from-legacy");
    }

    #[test]
    #[serial]
    fn test_file_then_cli_precedence() {
        // CLI overrides file / CLI覆盖文件
        clear_env();
        let dir = tempdir().unwrap();
        let path = dir.path().join("relay.toml");
        fs::write(
            &path,
            r#"
[relay.http]
allow_origins = "https://file.example.org"

[relay.http.server]
addr = "0.0.0.0:9100"

[relay.ollama]
model = "from-file"
timeout_ms = 30000
"#,
        )
        .unwrap();

        let args = CliArgs {
            config: Some(path.to_string_lossy().to_string()),
            ollama_model: Some("from-cli".to_string()),
            log_level: Some("debug".to_string()),
            ..Default::default()
        };
        let config = AppConfig::load_with_cli(&args).unwrap();

        assert_eq!(config.relay.http.server.addr.port(), 9100);
        assert_eq!(config.relay.http.allow_origins, "https://file.example.org");
        assert_eq!(config.relay.ollama.model, "from-cli");
        assert_eq!(config.relay.ollama.timeout_ms, 30000);
        assert_eq!(config.relay.logging.level, "debug");
    }

    #[test]
    #[serial]
    fn test_missing_config_file_is_error() {
        clear_env();
        let args = CliArgs {
            config: Some("/nonexistent/mapdesc/relay.toml".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::load_with_cli(&args).is_err());
    }

    #[test]
    #[serial]
    fn test_invalid_cli_addr_is_error() {
        clear_env();
        let args = CliArgs {
            http_addr: Some("nowhere".to_string()),
            ..Default::default()
        };
        assert!(AppConfig::load_with_cli(&args).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = RelayConfig::default();
        config.ollama.host = "ftp://127.0.0.1".to_string();
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.ollama.model = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.ollama.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.http.max_body_bytes = 0;
        assert!(config.validate().is_err());
    }
}
