use query_repository::config::Config;
use query_repository::DbContext;
use std::path::PathBuf;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.database.url, "sqlite::memory:");
    assert!(!config.database.sql_logging);
    assert!(!config.query.strict_direction);
    assert!(!config.logging.enabled);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();

    // Valid config should pass
    assert!(config.validate().is_ok());

    // Empty database URL
    config.database.url = "  ".to_string();
    assert!(config.validate().is_err());

    // Unknown log level
    config.database.url = "sqlite::memory:".to_string();
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());

    config.logging.level = "DEBUG".to_string();
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_config_deserialization() {
    // Test that partial TOML configs merge with defaults
    let partial_toml = r#"
        [query]
        strict_direction = true

        [logging]
        enabled = true
        file = "/tmp/query-repository-test.log"
    "#;

    let config: Config = toml::from_str(partial_toml).unwrap();

    assert!(config.query.strict_direction);
    assert!(config.logging.enabled);
    assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/query-repository-test.log")));

    assert_eq!(config.database.url, "sqlite::memory:"); // default value
    assert_eq!(config.logging.level, "info"); // default value
}

#[test]
fn test_empty_config_deserialization() {
    let config: Config = toml::from_str("").unwrap();
    let default_config = Config::default();

    assert_eq!(config.database.url, default_config.database.url);
    assert_eq!(config.query.strict_direction, default_config.query.strict_direction);
    assert_eq!(config.logging.enabled, default_config.logging.enabled);
    assert_eq!(config.logging.level, default_config.logging.level);
}

#[test]
fn test_load_from_file_rejects_invalid_values() {
    let dir = std::env::temp_dir().join("query_repository_test_invalid_config");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("config.toml");
    std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

    assert!(Config::load_from_file(&path).is_err());
    assert!(Config::load_from_file(dir.join("missing.toml")).is_err());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_generate_config_creates_directory() {
    use std::fs;

    // Create a temporary path that doesn't exist
    let temp_dir = std::env::temp_dir().join("query_repository_test_config");
    let config_path = temp_dir.join("nested").join("config.toml");

    if temp_dir.exists() {
        let _ = fs::remove_dir_all(&temp_dir);
    }
    assert!(!temp_dir.exists());

    // Generate config should create the directory structure
    let result = Config::generate_default_config(&config_path);
    assert!(result.is_ok());
    assert!(config_path.exists());

    // Verify the file contains expected content
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("# query-repository Configuration File"));
    assert!(content.contains("url = \"sqlite::memory:\""));

    // The generated file loads back to the defaults
    let loaded = Config::load_from_file(&config_path).unwrap();
    assert_eq!(loaded.database.url, Config::default().database.url);

    // Clean up
    let _ = fs::remove_dir_all(&temp_dir);
}

#[test]
fn test_default_config_path() {
    if let Ok(path) = Config::get_default_config_path() {
        assert!(path.ends_with("query-repository/config.toml"));
    }
}

#[tokio::test]
async fn test_context_from_config() {
    let mut config = Config::default();
    config.query.strict_direction = true;

    let context = DbContext::from_config(&config).await.unwrap();
    assert!(context.strict_direction());
    context.close().await.unwrap();
}
