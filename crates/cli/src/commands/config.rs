use std::env;
use std::fs;
use std::path::Path;

use nomorejokes_core::config::{
    resolve_config_path, AppConfig, LoadOptions, BOT_TOKEN_ENV, GEMINI_API_KEY_ENV,
    TELEGRAM_API_HASH_ENV, TELEGRAM_API_ID_ENV,
};
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{CommandResult, EXIT_CONFIG};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::text(EXIT_CONFIG, format!("config validation failed: {error}"))
        }
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let bot_token = redact_bot_token(config.telegram.bot_token.expose_secret());
    let api_hash = if config.telegram.api_hash.is_some() { "<redacted>" } else { "<unset>" };
    let api_key =
        if config.llm.api_key.expose_secret().trim().is_empty() { "<unset>" } else { "<redacted>" };

    let entries: Vec<(&str, String, Vec<&str>)> = vec![
        ("telegram.bot_token", bot_token, vec![BOT_TOKEN_ENV]),
        (
            "telegram.api_id",
            config.telegram.api_id.clone().unwrap_or_else(|| "<unset>".to_string()),
            vec![TELEGRAM_API_ID_ENV],
        ),
        ("telegram.api_hash", api_hash.to_string(), vec![TELEGRAM_API_HASH_ENV]),
        (
            "telegram.api_base_url",
            config.telegram.api_base_url.clone(),
            vec!["NOMOREJOKES_TELEGRAM_API_BASE_URL"],
        ),
        (
            "telegram.poll_timeout_secs",
            config.telegram.poll_timeout_secs.to_string(),
            vec!["NOMOREJOKES_TELEGRAM_POLL_TIMEOUT_SECS"],
        ),
        ("llm.api_key", api_key.to_string(), vec![GEMINI_API_KEY_ENV]),
        ("llm.base_url", config.llm.base_url.clone(), vec!["NOMOREJOKES_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), vec!["NOMOREJOKES_LLM_MODEL"]),
        (
            "llm.timeout_secs",
            config.llm.timeout_secs.to_string(),
            vec!["NOMOREJOKES_LLM_TIMEOUT_SECS"],
        ),
        (
            "publishing.template_path",
            config.publishing.template_path.display().to_string(),
            vec!["NOMOREJOKES_TEMPLATE_PATH"],
        ),
        (
            "publishing.output_dir",
            config.publishing.output_dir.display().to_string(),
            vec!["NOMOREJOKES_OUTPUT_DIR"],
        ),
        (
            "publishing.public_base_url",
            config.publishing.public_base_url.clone(),
            vec!["NOMOREJOKES_PUBLIC_BASE_URL"],
        ),
        (
            "server.health_enabled",
            config.server.health_enabled.to_string(),
            vec!["NOMOREJOKES_SERVER_HEALTH_ENABLED"],
        ),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            vec!["NOMOREJOKES_SERVER_BIND_ADDRESS"],
        ),
        (
            "server.health_check_port",
            config.server.health_check_port.to_string(),
            vec!["NOMOREJOKES_SERVER_HEALTH_CHECK_PORT"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            vec!["NOMOREJOKES_LOGGING_LEVEL", "NOMOREJOKES_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            vec!["NOMOREJOKES_LOGGING_FORMAT", "NOMOREJOKES_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in &entries {
        lines.push(render_line(key, value, source(*key, env_keys.as_slice())));
    }

    CommandResult::text(0, lines.join("\n"))
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
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

/// Keeps the public bot id and hides the secret half.
fn redact_bot_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((bot_id, _)) = trimmed.split_once(':') {
        return format!("{bot_id}:***");
    }

    "<redacted>".to_string()
}
