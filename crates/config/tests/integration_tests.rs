use bookstudio_config::{
    AppConfig, Config, ConfigManager, ConfigSection, LogLevel, ProviderConfig, StorageConfig,
    CONFIG_VERSION,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn setup_test_manager() -> Result<(TempDir, ConfigManager), Box<dyn std::error::Error>> {
    let temp_dir = TempDir::new()?;
    let manager = ConfigManager::with_directory(temp_dir.path().to_path_buf())?;
    Ok((temp_dir, manager))
}

#[test]
fn test_full_lifecycle() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    let created = manager.initialize()?;
    assert!(created);

    let config = manager.load()?;
    assert_eq!(config.version, CONFIG_VERSION);

    let mut modified = config.clone();
    modified.provider.chapter_model = "gemini-2.5-flash".to_string();
    modified.storage.data_dir = PathBuf::from("/var/lib/bookstudio");
    manager.save(&modified)?;

    let reloaded = manager.load()?;
    assert_eq!(reloaded.provider.chapter_model, "gemini-2.5-flash");
    assert_eq!(
        ConfigManager::resolve_data_dir(&reloaded)?,
        PathBuf::from("/var/lib/bookstudio")
    );

    manager.reset()?;
    let after_reset = manager.load()?;
    assert_eq!(after_reset, Config::default());

    Ok(())
}

#[test]
fn test_config_validation_integration() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;

    manager.save(&Config::default())?;
    assert!(manager.validate()?.is_empty());

    let mut invalid = Config::default();
    invalid.provider.api_base_url = "generativelanguage.googleapis.com".to_string();
    assert!(manager.save(&invalid).is_err());

    Ok(())
}

#[test]
fn test_hand_edited_invalid_file_still_loads() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    fs::write(
        manager.config_path(),
        "[provider]\nrequest_timeout_secs = 0\n",
    )?;

    let config = manager.load()?;
    assert_eq!(config.provider.request_timeout_secs, 0);

    let errors = manager.validate()?;
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("provider.request_timeout_secs"));

    Ok(())
}

#[test]
fn test_corrupted_file_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    fs::write(manager.config_path(), "[provider\nbroken")?;

    let err = manager.load().unwrap_err();
    assert!(err.to_string().contains("Invalid TOML"));
    assert!(manager.validate().is_err());
    assert!(manager.load_with_env_overrides().is_err());

    Ok(())
}

#[test]
fn test_saved_file_is_readable_toml() -> Result<(), Box<dyn std::error::Error>> {
    let (_temp_dir, manager) = setup_test_manager()?;
    manager.initialize()?;

    let contents = fs::read_to_string(manager.config_path())?;
    assert!(contents.contains("[provider]"));
    assert!(contents.contains("chapter_model = \"gemini-2.5-pro\""));
    assert!(contents.contains("log_level = \"info\""));

    Ok(())
}

#[test]
fn test_section_names() {
    assert_eq!(AppConfig::default().section_name(), "app");
    assert_eq!(ProviderConfig::default().section_name(), "provider");
    assert_eq!(StorageConfig::default().section_name(), "storage");
}

#[test]
fn test_merge_sections() {
    let mut base = Config::default();
    let mut other = Config::default();
    other.app.log_level = LogLevel::Trace;
    other.provider.step_timeout_secs = 120;

    base.merge(other);
    assert_eq!(base.app.log_level, LogLevel::Trace);
    assert_eq!(base.provider.step_timeout(), Some(std::time::Duration::from_secs(120)));
}
