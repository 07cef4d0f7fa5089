use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const TELEGRAM_API_ID_ENV: &str = "TELEGRAM_API_ID";
pub const TELEGRAM_API_HASH_ENV: &str = "TELEGRAM_API_HASH";

pub const CONFIG_FILE_CANDIDATES: [&str; 2] = ["nomorejokes.toml", "config/nomorejokes.toml"];

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub llm: LlmConfig,
    pub publishing: PublishingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub bot_token: SecretString,
    /// Reserved for a future MTProto client; unused by the Bot API transport.
    pub api_id: Option<String>,
    /// Reserved for a future MTProto client; unused by the Bot API transport.
    pub api_hash: Option<SecretString>,
    pub api_base_url: String,
    pub poll_timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: SecretString,
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct PublishingConfig {
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub public_base_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub health_enabled: bool,
    pub bind_address: String,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
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
    pub bot_token: Option<String>,
    pub gemini_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_model: Option<String>,
    pub telegram_api_base_url: Option<String>,
    pub template_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub public_base_url: Option<String>,
    pub log_level: Option<String>,
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
            telegram: TelegramConfig {
                bot_token: String::new().into(),
                api_id: None,
                api_hash: None,
                api_base_url: "https://api.telegram.org".to_string(),
                poll_timeout_secs: 30,
            },
            llm: LlmConfig {
                api_key: String::new().into(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                model: "gemini-1.5-flash".to_string(),
                timeout_secs: 120,
            },
            publishing: PublishingConfig {
                template_path: PathBuf::from("templates/article.html"),
                output_dir: PathBuf::from("blog"),
                public_base_url: "https://senlodigi.github.io/NoMoreJokes/blog".to_string(),
            },
            server: ServerConfig {
                health_enabled: true,
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
            },
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), format: LogFormat::Compact }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
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
            let expected = options
                .config_path
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_CANDIDATES[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(telegram) = patch.telegram {
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(api_id) = telegram.api_id {
                self.telegram.api_id = Some(api_id);
            }
            if let Some(api_hash_value) = telegram.api_hash {
                self.telegram.api_hash = Some(secret_value(api_hash_value));
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(poll_timeout_secs) = telegram.poll_timeout_secs {
                self.telegram.poll_timeout_secs = poll_timeout_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key_value) = llm.api_key {
                self.llm.api_key = secret_value(api_key_value);
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(publishing) = patch.publishing {
            if let Some(template_path) = publishing.template_path {
                self.publishing.template_path = template_path;
            }
            if let Some(output_dir) = publishing.output_dir {
                self.publishing.output_dir = output_dir;
            }
            if let Some(public_base_url) = publishing.public_base_url {
                self.publishing.public_base_url = public_base_url;
            }
        }

        if let Some(server) = patch.server {
            if let Some(health_enabled) = server.health_enabled {
                self.server.health_enabled = health_enabled;
            }
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
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
        if let Some(value) = read_env(BOT_TOKEN_ENV) {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env(TELEGRAM_API_ID_ENV) {
            self.telegram.api_id = Some(value);
        }
        if let Some(value) = read_env(TELEGRAM_API_HASH_ENV) {
            self.telegram.api_hash = Some(secret_value(value));
        }
        if let Some(value) = read_env("NOMOREJOKES_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("NOMOREJOKES_TELEGRAM_POLL_TIMEOUT_SECS") {
            self.telegram.poll_timeout_secs =
                parse_u64("NOMOREJOKES_TELEGRAM_POLL_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env(GEMINI_API_KEY_ENV) {
            self.llm.api_key = secret_value(value);
        }
        if let Some(value) = read_env("NOMOREJOKES_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("NOMOREJOKES_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("NOMOREJOKES_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("NOMOREJOKES_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("NOMOREJOKES_TEMPLATE_PATH") {
            self.publishing.template_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("NOMOREJOKES_OUTPUT_DIR") {
            self.publishing.output_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("NOMOREJOKES_PUBLIC_BASE_URL") {
            self.publishing.public_base_url = value;
        }

        if let Some(value) = read_env("NOMOREJOKES_SERVER_HEALTH_ENABLED") {
            self.server.health_enabled = parse_bool("NOMOREJOKES_SERVER_HEALTH_ENABLED", &value)?;
        }
        if let Some(value) = read_env("NOMOREJOKES_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("NOMOREJOKES_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("NOMOREJOKES_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        let log_level =
            read_env("NOMOREJOKES_LOGGING_LEVEL").or_else(|| read_env("NOMOREJOKES_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("NOMOREJOKES_LOGGING_FORMAT").or_else(|| read_env("NOMOREJOKES_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(bot_token) = overrides.bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(gemini_api_key) = overrides.gemini_api_key {
            self.llm.api_key = secret_value(gemini_api_key);
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = llm_base_url;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(api_base_url) = overrides.telegram_api_base_url {
            self.telegram.api_base_url = api_base_url;
        }
        if let Some(template_path) = overrides.template_path {
            self.publishing.template_path = template_path;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.publishing.output_dir = output_dir;
        }
        if let Some(public_base_url) = overrides.public_base_url {
            self.publishing.public_base_url = public_base_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_telegram(&self.telegram)?;
        validate_llm(&self.llm)?;
        validate_publishing(&self.publishing)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    CONFIG_FILE_CANDIDATES.into_iter().map(PathBuf::from).find(|path| path.exists())
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

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    let bot_token = telegram.bot_token.expose_secret().trim();
    if bot_token.is_empty() {
        return Err(ConfigError::Validation(format!(
            "telegram.bot_token is required (set {BOT_TOKEN_ENV}). Get it from @BotFather"
        )));
    }
    let well_formed = bot_token
        .split_once(':')
        .map(|(bot_id, secret)| {
            !bot_id.is_empty() && bot_id.chars().all(|ch| ch.is_ascii_digit()) && !secret.is_empty()
        })
        .unwrap_or(false);
    if !well_formed {
        return Err(ConfigError::Validation(
            "telegram.bot_token must look like `<bot id>:<secret>` as issued by @BotFather"
                .to_string(),
        ));
    }

    if !is_http_url(&telegram.api_base_url) {
        return Err(ConfigError::Validation(
            "telegram.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    if telegram.poll_timeout_secs > 60 {
        return Err(ConfigError::Validation(
            "telegram.poll_timeout_secs must be in range 0..=60".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.api_key.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "llm.api_key is required (set {GEMINI_API_KEY_ENV})"
        )));
    }

    if !is_http_url(&llm.base_url) {
        return Err(ConfigError::Validation(
            "llm.base_url must start with http:// or https://".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 600 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=600".to_string(),
        ));
    }

    Ok(())
}

fn validate_publishing(publishing: &PublishingConfig) -> Result<(), ConfigError> {
    if publishing.template_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "publishing.template_path must not be empty".to_string(),
        ));
    }

    if publishing.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation("publishing.output_dir must not be empty".to_string()));
    }

    if !is_http_url(&publishing.public_base_url) {
        return Err(ConfigError::Validation(
            "publishing.public_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_enabled && server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
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

fn is_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
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
    telegram: Option<TelegramPatch>,
    llm: Option<LlmPatch>,
    publishing: Option<PublishingPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    bot_token: Option<String>,
    api_id: Option<String>,
    api_hash: Option<String>,
    api_base_url: Option<String>,
    poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PublishingPatch {
    template_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    public_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    health_enabled: Option<bool>,
    bind_address: Option<String>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    const MANAGED_VARS: [&str; 8] = [
        "TELEGRAM_BOT_TOKEN",
        "GEMINI_API_KEY",
        "TELEGRAM_API_ID",
        "TELEGRAM_API_HASH",
        "NOMOREJOKES_OUTPUT_DIR",
        "NOMOREJOKES_LOG_LEVEL",
        "NOMOREJOKES_LOG_FORMAT",
        "NOMOREJOKES_LLM_TIMEOUT_SECS",
    ];

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("TEST_NMJ_BOT_TOKEN", "12345:from-env");
        env::set_var("TEST_NMJ_GEMINI_KEY", "gemini-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("nomorejokes.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "${TEST_NMJ_BOT_TOKEN}"

[llm]
api_key = "${TEST_NMJ_GEMINI_KEY}"
model = "gemini-1.5-pro"

[publishing]
output_dir = "public/posts"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.telegram.bot_token.expose_secret() == "12345:from-env",
                "bot token should be interpolated from environment",
            )?;
            ensure(
                config.llm.api_key.expose_secret() == "gemini-from-env",
                "api key should be interpolated from environment",
            )?;
            ensure(config.llm.model == "gemini-1.5-pro", "model should come from the file")?;
            ensure(
                config.publishing.output_dir == PathBuf::from("public/posts"),
                "output dir should come from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_NMJ_BOT_TOKEN", "TEST_NMJ_GEMINI_KEY"]);
        result
    }

    #[test]
    fn required_secrets_come_from_plain_env_names() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "777:abc");
        env::set_var("GEMINI_API_KEY", "key-123");
        env::set_var("TELEGRAM_API_ID", "424242");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.telegram.bot_token.expose_secret() == "777:abc", "bot token from env")?;
            ensure(config.llm.api_key.expose_secret() == "key-123", "api key from env")?;
            ensure(config.telegram.api_id.as_deref() == Some("424242"), "api id from env")?;
            ensure(config.telegram.api_hash.is_none(), "api hash stays optional")?;
            Ok(())
        })();

        clear_vars(&MANAGED_VARS);
        result
    }

    #[test]
    fn missing_bot_token_fails_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("GEMINI_API_KEY", "key-123");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("TELEGRAM_BOT_TOKEN")
            );
            ensure(has_message, "validation failure should name TELEGRAM_BOT_TOKEN")
        })();

        clear_vars(&MANAGED_VARS);
        result
    }

    #[test]
    fn missing_gemini_key_fails_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "777:abc");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("GEMINI_API_KEY")
            );
            ensure(has_message, "validation failure should name GEMINI_API_KEY")
        })();

        clear_vars(&MANAGED_VARS);
        result
    }

    #[test]
    fn malformed_bot_token_is_rejected() {
        let result = AppConfig::load(LoadOptions {
            config_path: Some(PathBuf::from("/nonexistent/nomorejokes.toml")),
            overrides: ConfigOverrides {
                bot_token: Some("not-a-token".to_string()),
                gemini_api_key: Some("key".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        });

        assert!(matches!(
            result,
            Err(ConfigError::Validation(ref message)) if message.contains("<bot id>:<secret>")
        ));
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("NOMOREJOKES_OUTPUT_DIR", "from-env");
        env::set_var("TELEGRAM_BOT_TOKEN", "1:from-env");
        env::set_var("GEMINI_API_KEY", "key-from-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("nomorejokes.toml");
            fs::write(
                &path,
                r#"
[telegram]
bot_token = "1:from-file"

[publishing]
output_dir = "from-file"
public_base_url = "https://example.org/posts"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    output_dir: Some(PathBuf::from("from-override")),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.publishing.output_dir == PathBuf::from("from-override"),
                "override output dir should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.telegram.bot_token.expose_secret() == "1:from-env",
                "env bot token should win over file and defaults",
            )?;
            ensure(
                config.publishing.public_base_url == "https://example.org/posts",
                "file base url should win over default",
            )?;
            Ok(())
        })();

        clear_vars(&MANAGED_VARS);
        result
    }

    #[test]
    fn invalid_numeric_env_override_is_reported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "1:abc");
        env::set_var("GEMINI_API_KEY", "key");
        env::set_var("NOMOREJOKES_LLM_TIMEOUT_SECS", "soon");

        let result = (|| -> Result<(), String> {
            let outcome = AppConfig::load(LoadOptions::default());
            ensure(
                matches!(
                    outcome,
                    Err(ConfigError::InvalidEnvOverride { ref key, .. })
                        if key == "NOMOREJOKES_LLM_TIMEOUT_SECS"
                ),
                "non-numeric timeout should be rejected",
            )
        })();

        clear_vars(&MANAGED_VARS);
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        clear_vars(&MANAGED_VARS);

        env::set_var("TELEGRAM_BOT_TOKEN", "99:bot-secret-value");
        env::set_var("GEMINI_API_KEY", "gemini-secret-value");
        env::set_var("TELEGRAM_API_HASH", "hash-secret-value");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(!debug.contains("bot-secret-value"), "debug output should not contain bot token")?;
            ensure(!debug.contains("gemini-secret-value"), "debug output should not contain api key")?;
            ensure(!debug.contains("hash-secret-value"), "debug output should not contain api hash")?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_vars(&MANAGED_VARS);
        result
    }
}
