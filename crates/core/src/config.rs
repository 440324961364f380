use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub nlu: NluConfig,
    pub geocoding: GeocodingConfig,
    pub scheduling: SchedulingConfig,
    pub notifications: NotificationConfig,
    pub server: ServerConfig,
    pub script: ScriptConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct NluConfig {
    pub provider: NluProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct GeocodingConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SchedulingConfig {
    /// Independent crew calendars; a slot must be free in every one of them.
    pub stores: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct NotificationConfig {
    pub email_enabled: bool,
    pub email_api_url: Option<String>,
    pub email_api_key: Option<SecretString>,
    pub email_from: String,
    pub operations_email: String,
    pub sms_enabled: bool,
    pub sms_api_url: Option<String>,
    pub sms_api_key: Option<SecretString>,
    pub sms_from: String,
    pub booking_link_base_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ScriptConfig {
    pub retry_budget: u8,
    pub idle_timeout_secs: u64,
    pub transfer_number: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NluProvider {
    OpenAi,
    Anthropic,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub nlu_provider: Option<NluProvider>,
    pub nlu_model: Option<String>,
    pub geocoding_enabled: Option<bool>,
    pub email_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    pub retry_budget: Option<u8>,
    pub schedule_stores: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://moveline.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            nlu: NluConfig {
                provider: NluProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 8,
            },
            geocoding: GeocodingConfig {
                enabled: false,
                base_url: "http://localhost:8801".to_string(),
                timeout_secs: 5,
            },
            scheduling: SchedulingConfig {
                stores: vec!["crew-alpha".to_string(), "crew-bravo".to_string()],
            },
            notifications: NotificationConfig {
                email_enabled: false,
                email_api_url: None,
                email_api_key: None,
                email_from: "bookings@moveline.example".to_string(),
                operations_email: "ops@moveline.example".to_string(),
                sms_enabled: false,
                sms_api_url: None,
                sms_api_key: None,
                sms_from: "+15125550000".to_string(),
                booking_link_base_url: "https://book.moveline.example".to_string(),
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            script: ScriptConfig {
                retry_budget: 2,
                idle_timeout_secs: 600,
                transfer_number: "+15125550199".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for NluProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported nlu provider `{other}` (expected openai|anthropic|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("moveline.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(nlu) = patch.nlu {
            if let Some(provider) = nlu.provider {
                self.nlu.provider = provider;
            }
            if let Some(api_key_value) = nlu.api_key {
                self.nlu.api_key = Some(secret_value(api_key_value));
            }
            if let Some(base_url) = nlu.base_url {
                self.nlu.base_url = Some(base_url);
            }
            if let Some(model) = nlu.model {
                self.nlu.model = model;
            }
            if let Some(timeout_secs) = nlu.timeout_secs {
                self.nlu.timeout_secs = timeout_secs;
            }
        }

        if let Some(geocoding) = patch.geocoding {
            if let Some(enabled) = geocoding.enabled {
                self.geocoding.enabled = enabled;
            }
            if let Some(base_url) = geocoding.base_url {
                self.geocoding.base_url = base_url;
            }
            if let Some(timeout_secs) = geocoding.timeout_secs {
                self.geocoding.timeout_secs = timeout_secs;
            }
        }

        if let Some(scheduling) = patch.scheduling {
            if let Some(stores) = scheduling.stores {
                self.scheduling.stores = stores;
            }
        }

        if let Some(notifications) = patch.notifications {
            if let Some(enabled) = notifications.email_enabled {
                self.notifications.email_enabled = enabled;
            }
            if let Some(url) = notifications.email_api_url {
                self.notifications.email_api_url = Some(url);
            }
            if let Some(key) = notifications.email_api_key {
                self.notifications.email_api_key = Some(secret_value(key));
            }
            if let Some(from) = notifications.email_from {
                self.notifications.email_from = from;
            }
            if let Some(operations) = notifications.operations_email {
                self.notifications.operations_email = operations;
            }
            if let Some(enabled) = notifications.sms_enabled {
                self.notifications.sms_enabled = enabled;
            }
            if let Some(url) = notifications.sms_api_url {
                self.notifications.sms_api_url = Some(url);
            }
            if let Some(key) = notifications.sms_api_key {
                self.notifications.sms_api_key = Some(secret_value(key));
            }
            if let Some(from) = notifications.sms_from {
                self.notifications.sms_from = from;
            }
            if let Some(link) = notifications.booking_link_base_url {
                self.notifications.booking_link_base_url = link;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(script) = patch.script {
            if let Some(retry_budget) = script.retry_budget {
                self.script.retry_budget = retry_budget;
            }
            if let Some(idle_timeout_secs) = script.idle_timeout_secs {
                self.script.idle_timeout_secs = idle_timeout_secs;
            }
            if let Some(transfer_number) = script.transfer_number {
                self.script.transfer_number = transfer_number;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("MOVELINE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("MOVELINE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("MOVELINE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("MOVELINE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("MOVELINE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MOVELINE_NLU_PROVIDER") {
            self.nlu.provider = value.parse()?;
        }
        if let Some(value) = read_env("MOVELINE_NLU_API_KEY") {
            self.nlu.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("MOVELINE_NLU_BASE_URL") {
            self.nlu.base_url = Some(value);
        }
        if let Some(value) = read_env("MOVELINE_NLU_MODEL") {
            self.nlu.model = value;
        }
        if let Some(value) = read_env("MOVELINE_NLU_TIMEOUT_SECS") {
            self.nlu.timeout_secs = parse_u64("MOVELINE_NLU_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("MOVELINE_GEOCODING_ENABLED") {
            self.geocoding.enabled = parse_bool("MOVELINE_GEOCODING_ENABLED", &value)?;
        }
        if let Some(value) = read_env("MOVELINE_GEOCODING_BASE_URL") {
            self.geocoding.base_url = value;
        }

        if let Some(value) = read_env("MOVELINE_SCHEDULE_STORES") {
            self.scheduling.stores =
                value.split(',').map(|store| store.trim().to_string()).collect();
        }

        if let Some(value) = read_env("MOVELINE_EMAIL_ENABLED") {
            self.notifications.email_enabled = parse_bool("MOVELINE_EMAIL_ENABLED", &value)?;
        }
        if let Some(value) = read_env("MOVELINE_EMAIL_API_URL") {
            self.notifications.email_api_url = Some(value);
        }
        if let Some(value) = read_env("MOVELINE_EMAIL_API_KEY") {
            self.notifications.email_api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("MOVELINE_SMS_ENABLED") {
            self.notifications.sms_enabled = parse_bool("MOVELINE_SMS_ENABLED", &value)?;
        }
        if let Some(value) = read_env("MOVELINE_SMS_API_URL") {
            self.notifications.sms_api_url = Some(value);
        }
        if let Some(value) = read_env("MOVELINE_SMS_API_KEY") {
            self.notifications.sms_api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("MOVELINE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("MOVELINE_SERVER_PORT") {
            self.server.port = parse_u16("MOVELINE_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("MOVELINE_SCRIPT_RETRY_BUDGET") {
            self.script.retry_budget =
                parse_u32("MOVELINE_SCRIPT_RETRY_BUDGET", &value)?.min(u8::MAX as u32) as u8;
        }
        if let Some(value) = read_env("MOVELINE_SCRIPT_IDLE_TIMEOUT_SECS") {
            self.script.idle_timeout_secs =
                parse_u64("MOVELINE_SCRIPT_IDLE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("MOVELINE_SCRIPT_TRANSFER_NUMBER") {
            self.script.transfer_number = value;
        }

        let log_level =
            read_env("MOVELINE_LOGGING_LEVEL").or_else(|| read_env("MOVELINE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("MOVELINE_LOGGING_FORMAT").or_else(|| read_env("MOVELINE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(provider) = overrides.nlu_provider {
            self.nlu.provider = provider;
        }
        if let Some(model) = overrides.nlu_model {
            self.nlu.model = model;
        }
        if let Some(enabled) = overrides.geocoding_enabled {
            self.geocoding.enabled = enabled;
        }
        if let Some(enabled) = overrides.email_enabled {
            self.notifications.email_enabled = enabled;
        }
        if let Some(enabled) = overrides.sms_enabled {
            self.notifications.sms_enabled = enabled;
        }
        if let Some(retry_budget) = overrides.retry_budget {
            self.script.retry_budget = retry_budget;
        }
        if let Some(stores) = overrides.schedule_stores {
            self.scheduling.stores = stores;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_nlu(&self.nlu)?;
        validate_scheduling(&self.scheduling)?;
        validate_notifications(&self.notifications)?;
        validate_server(&self.server)?;
        validate_script(&self.script)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("moveline.toml"), PathBuf::from("config/moveline.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_nlu(nlu: &NluConfig) -> Result<(), ConfigError> {
    if nlu.timeout_secs == 0 || nlu.timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "nlu.timeout_secs must be in range 1..=60; extraction runs inside a live call turn"
                .to_string(),
        ));
    }

    match nlu.provider {
        NluProvider::OpenAi | NluProvider::Anthropic => {
            let missing = nlu
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "nlu.api_key is required for openai/anthropic providers".to_string(),
                ));
            }
        }
        NluProvider::Ollama => {
            let missing =
                nlu.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "nlu.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_scheduling(scheduling: &SchedulingConfig) -> Result<(), ConfigError> {
    if scheduling.stores.is_empty() {
        return Err(ConfigError::Validation(
            "scheduling.stores must name at least one schedule store".to_string(),
        ));
    }
    if scheduling.stores.iter().any(|store| store.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "scheduling.stores entries must be non-empty names".to_string(),
        ));
    }
    Ok(())
}

fn validate_notifications(notifications: &NotificationConfig) -> Result<(), ConfigError> {
    if notifications.email_enabled {
        let has_url = notifications
            .email_api_url
            .as_ref()
            .map(|url| url.starts_with("http://") || url.starts_with("https://"))
            .unwrap_or(false);
        if !has_url {
            return Err(ConfigError::Validation(
                "notifications.email_api_url must be an http(s) URL when email is enabled"
                    .to_string(),
            ));
        }
    }
    if notifications.sms_enabled {
        let has_url = notifications
            .sms_api_url
            .as_ref()
            .map(|url| url.starts_with("http://") || url.starts_with("https://"))
            .unwrap_or(false);
        if !has_url {
            return Err(ConfigError::Validation(
                "notifications.sms_api_url must be an http(s) URL when sms is enabled".to_string(),
            ));
        }
    }
    if !notifications.booking_link_base_url.starts_with("http://")
        && !notifications.booking_link_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "notifications.booking_link_base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_script(script: &ScriptConfig) -> Result<(), ConfigError> {
    if script.retry_budget == 0 || script.retry_budget > 5 {
        return Err(ConfigError::Validation(
            "script.retry_budget must be in range 1..=5".to_string(),
        ));
    }
    if script.idle_timeout_secs < 60 {
        return Err(ConfigError::Validation(
            "script.idle_timeout_secs must be at least 60".to_string(),
        ));
    }
    if script.transfer_number.trim().is_empty() {
        return Err(ConfigError::Validation(
            "script.transfer_number must be set; the escalation path depends on it".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    nlu: Option<NluPatch>,
    geocoding: Option<GeocodingPatch>,
    scheduling: Option<SchedulingPatch>,
    notifications: Option<NotificationPatch>,
    server: Option<ServerPatch>,
    script: Option<ScriptPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct NluPatch {
    provider: Option<NluProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodingPatch {
    enabled: Option<bool>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SchedulingPatch {
    stores: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct NotificationPatch {
    email_enabled: Option<bool>,
    email_api_url: Option<String>,
    email_api_key: Option<String>,
    email_from: Option<String>,
    operations_email: Option<String>,
    sms_enabled: Option<bool>,
    sms_api_url: Option<String>,
    sms_api_key: Option<String>,
    sms_from: Option<String>,
    booking_link_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ScriptPatch {
    retry_budget: Option<u8>,
    idle_timeout_secs: Option<u64>,
    transfer_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
