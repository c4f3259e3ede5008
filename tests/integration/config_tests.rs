use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use hashdupe::config::{Config, ConfigError};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();

    assert_eq!(config.io_threads, 4);
    assert_eq!(config.batch_size, 256);
    assert!(!config.skip_hidden);
    assert!(config.progress);
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("HASHDUPE_TEST_ENV_BATCH_SIZE", "64");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("HASHDUPE_TEST_ENV_"))
        .extract()
        .unwrap();

    assert_eq!(config.batch_size, 64);
    assert_eq!(config.io_threads, 4);

    std::env::remove_var("HASHDUPE_TEST_ENV_BATCH_SIZE");
}

#[test]
fn test_config_load_from_toml() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
io_threads = 1
chunk_size = 1048576
skip_hidden = true
ignore_patterns = ["node_modules/", "*.o"]
strict = true
progress = false
"#,
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .extract()
        .unwrap();

    assert_eq!(config.io_threads, 1);
    assert_eq!(config.chunk_size, 1_048_576);
    assert!(config.skip_hidden);
    assert_eq!(config.ignore_patterns, vec!["node_modules/", "*.o"]);
    assert!(config.strict);
    assert!(!config.progress);
    assert_eq!(config.max_depth, None);
}

#[test]
fn test_try_load_from_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("hashdupe.toml");
    fs::write(&path, "max_depth = 3\n").unwrap();

    let config = Config::try_load_from_path(&path).unwrap();
    assert_eq!(config.max_depth, Some(3));
}

#[test]
fn test_try_load_from_path_errors() {
    let dir = tempdir().unwrap();

    let missing = Config::try_load_from_path(&dir.path().join("absent.toml"));
    assert!(matches!(missing, Err(ConfigError::NotFound(_))));

    let path = dir.path().join("broken.toml");
    fs::write(&path, "io_threads = [").unwrap();
    let broken = Config::try_load_from_path(&path);
    assert!(matches!(broken, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_default_path_is_config_toml() {
    if let Some(path) = Config::default_path() {
        assert_eq!(path.file_name().unwrap(), "config.toml");
    }
}
