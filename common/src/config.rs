use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::{env, fs};

/// Process-wide configuration, loaded once from an env file.
#[derive(Debug, Deserialize)]
pub struct Config {
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    /// SQLite file path or a full `sqlite:`/`postgres://` DSN.
    pub database_url: String,
    /// Name this node reports in action locations and relay frames.
    pub server_name: String,
    /// When true, notification intents are relayed to the other nodes.
    pub proxy_enabled: bool,
    pub cooldown_enabled: bool,
    pub cooldown_seconds: u64,
    pub search_page_size: usize,
    /// How long `reload` waits for in-flight commands to drain.
    pub reload_timeout_seconds: u64,
    /// Enables the creator unread-update marker on tickets.
    pub unread_updates_enabled: bool,
}

static CONFIG: OnceCell<Config> = OnceCell::new();

impl Config {
    pub fn init(env_path: &str) -> &'static Self {
        dotenvy::from_filename(env_path).ok();

        CONFIG.get_or_init(|| {
            let project_name = env::var("PROJECT_NAME").unwrap_or_else(|_| "tickets".into());
            let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
            let log_file = env::var("LOG_FILE").unwrap_or_else(|_| "logs/tickets.log".into());
            let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
            let server_name = env::var("SERVER_NAME").unwrap_or_else(|_| "server".into());
            let proxy_enabled = env_bool("PROXY_ENABLED", false);
            let cooldown_enabled = env_bool("COOLDOWN_ENABLED", false);
            let cooldown_seconds = env_parse("COOLDOWN_SECONDS", 300);
            let search_page_size = env_parse("SEARCH_PAGE_SIZE", 8);
            let reload_timeout_seconds = env_parse("RELOAD_TIMEOUT_SECONDS", 30);
            let unread_updates_enabled = env_bool("UNREAD_UPDATES_ENABLED", true);

            if let Some(parent) = std::path::Path::new(&log_file).parent() {
                fs::create_dir_all(parent).expect("Failed to create log directory");
            }

            Config {
                project_name,
                log_level,
                log_file,
                database_url,
                server_name,
                proxy_enabled,
                cooldown_enabled,
                cooldown_seconds,
                search_page_size,
                reload_timeout_seconds,
                unread_updates_enabled,
            }
        })
    }

    pub fn get() -> &'static Self {
        CONFIG.get().expect("Config not initialized")
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
