use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use moveline_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        field_source(
            "database.url",
            Some("MOVELINE_DATABASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        field_source(
            "database.max_connections",
            Some("MOVELINE_DATABASE_MAX_CONNECTIONS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        field_source(
            "database.timeout_secs",
            Some("MOVELINE_DATABASE_TIMEOUT_SECS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "nlu.provider",
        &format!("{:?}", config.nlu.provider),
        field_source(
            "nlu.provider",
            Some("MOVELINE_NLU_PROVIDER"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "nlu.model",
        &config.nlu.model,
        field_source(
            "nlu.model",
            Some("MOVELINE_NLU_MODEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "nlu.base_url",
        config.nlu.base_url.as_deref().unwrap_or("<unset>"),
        field_source(
            "nlu.base_url",
            Some("MOVELINE_NLU_BASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let nlu_api_key = if config.nlu.api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "nlu.api_key",
        nlu_api_key,
        field_source(
            "nlu.api_key",
            Some("MOVELINE_NLU_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "geocoding.enabled",
        &config.geocoding.enabled.to_string(),
        field_source(
            "geocoding.enabled",
            Some("MOVELINE_GEOCODING_ENABLED"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "geocoding.base_url",
        &config.geocoding.base_url,
        field_source(
            "geocoding.base_url",
            Some("MOVELINE_GEOCODING_BASE_URL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "scheduling.stores",
        &config.scheduling.stores.join(","),
        field_source(
            "scheduling.stores",
            Some("MOVELINE_SCHEDULE_STORES"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "notifications.email_enabled",
        &config.notifications.email_enabled.to_string(),
        field_source(
            "notifications.email_enabled",
            Some("MOVELINE_EMAIL_ENABLED"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let email_api_key =
        if config.notifications.email_api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "notifications.email_api_key",
        email_api_key,
        field_source(
            "notifications.email_api_key",
            Some("MOVELINE_EMAIL_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "notifications.sms_enabled",
        &config.notifications.sms_enabled.to_string(),
        field_source(
            "notifications.sms_enabled",
            Some("MOVELINE_SMS_ENABLED"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    let sms_api_key =
        if config.notifications.sms_api_key.is_some() { "<redacted>" } else { "<unset>" };
    lines.push(render_line(
        "notifications.sms_api_key",
        sms_api_key,
        field_source(
            "notifications.sms_api_key",
            Some("MOVELINE_SMS_API_KEY"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "notifications.operations_email",
        &config.notifications.operations_email,
        field_source(
            "notifications.operations_email",
            None,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "server.bind_address",
        &config.server.bind_address,
        field_source(
            "server.bind_address",
            Some("MOVELINE_SERVER_BIND_ADDRESS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "server.port",
        &config.server.port.to_string(),
        field_source(
            "server.port",
            Some("MOVELINE_SERVER_PORT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "script.retry_budget",
        &config.script.retry_budget.to_string(),
        field_source(
            "script.retry_budget",
            Some("MOVELINE_SCRIPT_RETRY_BUDGET"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "script.idle_timeout_secs",
        &config.script.idle_timeout_secs.to_string(),
        field_source(
            "script.idle_timeout_secs",
            Some("MOVELINE_SCRIPT_IDLE_TIMEOUT_SECS"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "script.transfer_number",
        &config.script.transfer_number,
        field_source(
            "script.transfer_number",
            Some("MOVELINE_SCRIPT_TRANSFER_NUMBER"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.push(render_line(
        "logging.level",
        &config.logging.level,
        field_source(
            "logging.level",
            Some("MOVELINE_LOGGING_LEVEL"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        field_source(
            "logging.format",
            Some("MOVELINE_LOGGING_FORMAT"),
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        ),
    ));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("moveline.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/moveline.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
