use super::load::{default_config_path, default_data_dir, resolve_config_path};
use super::schema::*;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_explicit_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("AUDIOFOLIO_CONFIG_PATH", "/tmp/audiofolio-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/audiofolio-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("audiofolio")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("audiofolio")
            .join("config.toml")
    );
}

#[test]
fn default_data_dir_follows_xdg_data_home_then_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");
    assert_eq!(
        default_data_dir().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-data/audiofolio")
    );

    let _g2 = EnvGuard::remove("XDG_DATA_HOME");
    let _g3 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_data_dir().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir/.local/share/audiofolio")
    );
}

#[test]
fn settings_load_from_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[storage]
data_dir = "/tmp/audiofolio-data"

[playback]
tick_interval_ms = 250
finish_poll_ms = 50
auto_advance = false
resume_from_saved_position = false

[import]
extensions = ["mp3"]
recursive = false
include_hidden = true
follow_links = false
max_depth = 3
metadata_timeout_ms = 100

[logging]
filter = "audiofolio=debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("AUDIOFOLIO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("AUDIOFOLIO__PLAYBACK__TICK_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert_eq!(
        s.storage.data_dir,
        Some(std::path::PathBuf::from("/tmp/audiofolio-data"))
    );
    assert_eq!(s.playback.tick_interval_ms, 250);
    assert_eq!(s.playback.finish_poll_ms, 50);
    assert!(!s.playback.auto_advance);
    assert!(!s.playback.resume_from_saved_position);
    assert_eq!(s.import.extensions, vec!["mp3".to_string()]);
    assert!(!s.import.recursive);
    assert!(s.import.include_hidden);
    assert!(!s.import.follow_links);
    assert_eq!(s.import.max_depth, Some(3));
    assert_eq!(s.import.metadata_timeout_ms, 100);
    assert_eq!(s.logging.filter, "audiofolio=debug");
    assert_eq!(s.data_dir(), Some(std::path::PathBuf::from("/tmp/audiofolio-data")));
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
tick_interval_ms = 1000
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("AUDIOFOLIO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("AUDIOFOLIO__PLAYBACK__TICK_INTERVAL_MS", "40");

    let s = Settings::load().unwrap();
    assert_eq!(s.playback.tick_interval_ms, 40);
}

#[test]
fn validate_rejects_zero_intervals_and_empty_extensions() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.playback.tick_interval_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.finish_poll_ms = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.import.extensions = vec![" ".to_string()];
    assert!(s.validate().is_err());
}

#[test]
fn settings_serialize_to_toml_and_back() {
    let s = Settings::default();
    let text = toml::to_string_pretty(&s).unwrap();
    assert!(text.contains("[playback]"));
    let parsed: Settings = toml::from_str(&text).unwrap();
    assert_eq!(parsed.playback.tick_interval_ms, s.playback.tick_interval_ms);
    assert_eq!(parsed.import.extensions, s.import.extensions);
}
