// tests/config_loading.rs
use hn_stories_dashboard::config::{
    DashboardConfig, ENV_BIND, ENV_CONFIG_PATH, ENV_DATABASE_URL, ENV_WORDCLOUD,
};
use std::{env, fs};

fn clear_env() {
    for k in [ENV_CONFIG_PATH, ENV_DATABASE_URL, ENV_BIND, ENV_WORDCLOUD] {
        env::remove_var(k);
    }
}

#[serial_test::serial]
#[test]
fn explicit_file_is_parsed() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("dashboard.toml");
    fs::write(
        &p,
        r#"
bind = "0.0.0.0:8080"

[database]
url = "postgresql://u:p@db:5432/news"
table = "stories"

[wordcloud]
enabled = false
max_words = 50
"#,
    )
    .unwrap();

    let cfg = DashboardConfig::load_from(&p).unwrap();
    assert_eq!(cfg.bind.port(), 8080);
    assert_eq!(cfg.database.url, "postgresql://u:p@db:5432/news");
    assert_eq!(cfg.database.table, "stories");
    assert_eq!(cfg.database.pool_size, 4);
    assert!(!cfg.wordcloud.enabled);
    assert_eq!(cfg.wordcloud.max_words, 50);
    assert_eq!(cfg.wordcloud.height, 400);
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    // 1) Nothing on disk → built-in defaults
    let d = DashboardConfig::load_default().unwrap();
    assert_eq!(d, DashboardConfig::default());
    assert_eq!(d.bind.port(), 8050);
    assert_eq!(d.database.table, "public.hacker_news_stories");

    // 2) Fallback TOML in ./config/
    fs::create_dir_all(tmp.path().join("config")).unwrap();
    fs::write(
        tmp.path().join("config/dashboard.toml"),
        "[wordcloud]\nwidth = 640\n",
    )
    .unwrap();
    assert_eq!(DashboardConfig::load_default().unwrap().wordcloud.width, 640);

    // 3) Env path wins
    let p_env = tmp.path().join("other.toml");
    fs::write(&p_env, "[wordcloud]\nwidth = 320\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(DashboardConfig::load_default().unwrap().wordcloud.width, 320);

    // 4) Env path to nowhere is an error
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(DashboardConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn env_overrides_apply_on_top_of_file() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    clear_env();

    env::set_var(ENV_DATABASE_URL, "postgresql://x:y@remote:5432/hn");
    env::set_var(ENV_BIND, "127.0.0.1:9999");
    env::set_var(ENV_WORDCLOUD, "0");
    let cfg = DashboardConfig::load_default().unwrap();
    assert_eq!(cfg.database.url, "postgresql://x:y@remote:5432/hn");
    assert_eq!(cfg.bind.port(), 9999);
    assert!(!cfg.wordcloud.enabled);

    env::set_var(ENV_BIND, "not an address");
    assert!(DashboardConfig::load_default().is_err());

    clear_env();
    env::set_current_dir(&old).unwrap();
}
