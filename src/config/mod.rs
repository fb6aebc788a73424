use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

/// Which identity provider backs the session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// In-process accounts, for local development and tests
    Memory,
    /// Firebase Identity Toolkit REST API
    Firebase,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(ProviderKind::Memory),
            "firebase" => Some(ProviderKind::Firebase),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Memory => "memory",
            ProviderKind::Firebase => "firebase",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    // App Settings
    pub app_name: String,
    pub version: String,

    // Server Settings
    pub host: String,
    pub port: u16,

    // Identity Provider Settings
    pub identity_provider: ProviderKind,
    pub firebase_api_key: String,
    pub identity_toolkit_url: String,
    pub secure_token_url: String,
    pub provider_timeout_secs: u64,

    // Session Settings
    pub session_resolve_timeout_ms: u64,
    pub token_refresh_skew_secs: u64,
    pub client_cookie: String,
    pub refresh_cookie: String,
    pub cookie_secure: bool,
    pub client_idle_ttl_secs: u64,
    pub client_anonymous_ttl_secs: u64,
    pub client_sweep_interval_secs: u64,

    // Simulated Page Operations
    pub upload_delay_ms: u64,
    pub search_delay_ms: u64,

    // Memory Provider Settings
    pub memory_hash_cost: u32,
    pub memory_max_failed_attempts: u32,
    pub memory_lockout_secs: u64,
    pub memory_seed_accounts: Vec<(String, String)>,
}

impl Settings {
    pub fn new() -> Self {
        Settings {
            app_name: get_env("APP_NAME", "ConstituCheck"),
            version: get_env("VERSION", env!("CARGO_PKG_VERSION")),

            host: get_env("HOST", "0.0.0.0"),
            port: get_env_int("PORT", 8080) as u16,

            identity_provider: ProviderKind::parse(&get_env("IDENTITY_PROVIDER", "memory"))
                .unwrap_or(ProviderKind::Memory),
            firebase_api_key: get_env("FIREBASE_API_KEY", ""),
            identity_toolkit_url: get_env(
                "IDENTITY_TOOLKIT_URL",
                "https://identitytoolkit.googleapis.com/v1",
            ),
            secure_token_url: get_env("SECURE_TOKEN_URL", "https://securetoken.googleapis.com/v1"),
            provider_timeout_secs: get_env_int("PROVIDER_TIMEOUT_SECS", 10) as u64,

            session_resolve_timeout_ms: get_env_int("SESSION_RESOLVE_TIMEOUT_MS", 3000) as u64,
            token_refresh_skew_secs: get_env_int("TOKEN_REFRESH_SKEW_SECS", 300) as u64,
            client_cookie: get_env("CLIENT_COOKIE", "cc_client"),
            refresh_cookie: get_env("REFRESH_COOKIE", "cc_refresh"),
            cookie_secure: get_env_bool("COOKIE_SECURE", false),
            client_idle_ttl_secs: get_env_int("CLIENT_IDLE_TTL_SECS", 3600) as u64,
            client_anonymous_ttl_secs: get_env_int("CLIENT_ANONYMOUS_TTL_SECS", 300) as u64,
            client_sweep_interval_secs: get_env_int("CLIENT_SWEEP_INTERVAL_SECS", 60) as u64,

            upload_delay_ms: get_env_int("UPLOAD_DELAY_MS", 2000) as u64,
            search_delay_ms: get_env_int("SEARCH_DELAY_MS", 1000) as u64,

            memory_hash_cost: get_env_int("MEMORY_HASH_COST", bcrypt::DEFAULT_COST as i32) as u32,
            memory_max_failed_attempts: get_env_int("MEMORY_MAX_FAILED_ATTEMPTS", 5) as u32,
            memory_lockout_secs: get_env_int("MEMORY_LOCKOUT_SECS", 300) as u64,
            memory_seed_accounts: parse_seed_accounts(&get_env("MEMORY_SEED_ACCOUNTS", "")),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.session_resolve_timeout_ms)
    }

    pub fn refresh_skew(&self) -> Duration {
        Duration::from_secs(self.token_refresh_skew_secs)
    }

    pub fn memory_lockout(&self) -> Duration {
        Duration::from_secs(self.memory_lockout_secs)
    }

    pub fn upload_delay(&self) -> Duration {
        Duration::from_millis(self.upload_delay_ms)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_millis(self.search_delay_ms)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new()
    }
}

pub static SETTINGS: Lazy<Settings> = Lazy::new(Settings::new);

pub fn get_settings() -> &'static Settings {
    &SETTINGS
}

/// Parse `email:password` pairs separated by commas. Malformed entries are skipped.
fn parse_seed_accounts(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|entry| {
            let (email, password) = entry.trim().split_once(':')?;
            if email.is_empty() || password.is_empty() {
                return None;
            }
            Some((email.to_string(), password.to_string()))
        })
        .collect()
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_env_int(key: &str, default: i32) -> i32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn get_env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
