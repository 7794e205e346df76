use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::IdStrategy;

pub const DEFAULT_CONFIG_FILE: &str = "covernote.toml";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub wizard: WizardConfig,
    pub gateway: GatewayConfig,
    pub master_data: MasterDataConfig,
    pub uploads: UploadConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WizardConfig {
    pub validate_on_advance: bool,
    pub integration_enabled: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayConfig {
    pub integration_latency_ms: u64,
    pub manual_latency_ms: u64,
    pub timeout_ms: Option<u64>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { integration_latency_ms: 3_000, manual_latency_ms: 2_000, timeout_ms: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MasterDataConfig {
    pub id_strategy: IdStrategy,
    pub actor: String,
}

impl Default for MasterDataConfig {
    fn default() -> Self {
        Self {
            id_strategy: IdStrategy::Sequential,
            actor: crate::domain::master_data::PLACEHOLDER_ACTOR.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    pub accepted_mime_types: Vec<String>,
    pub advisory_max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            accepted_mime_types: vec![
                "application/pdf".to_string(),
                "application/vnd.ms-powerpoint".to_string(),
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
                    .to_string(),
                "video/*".to_string(),
            ],
            advisory_max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
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
    pub validate_on_advance: Option<bool>,
    pub integration_enabled: Option<bool>,
    pub integration_latency_ms: Option<u64>,
    pub manual_latency_ms: Option<u64>,
    pub id_strategy: Option<IdStrategy>,
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
            wizard: WizardConfig::default(),
            gateway: GatewayConfig::default(),
            master_data: MasterDataConfig::default(),
            uploads: UploadConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
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

impl std::str::FromStr for IdStrategy {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "uuid" => Ok(Self::Uuid),
            other => Err(ConfigError::Validation(format!(
                "unsupported id strategy `{other}` (expected sequential|uuid)"
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
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(wizard) = patch.wizard {
            if let Some(validate_on_advance) = wizard.validate_on_advance {
                self.wizard.validate_on_advance = validate_on_advance;
            }
            if let Some(integration_enabled) = wizard.integration_enabled {
                self.wizard.integration_enabled = integration_enabled;
            }
        }

        if let Some(gateway) = patch.gateway {
            if let Some(integration_latency_ms) = gateway.integration_latency_ms {
                self.gateway.integration_latency_ms = integration_latency_ms;
            }
            if let Some(manual_latency_ms) = gateway.manual_latency_ms {
                self.gateway.manual_latency_ms = manual_latency_ms;
            }
            if let Some(timeout_ms) = gateway.timeout_ms {
                self.gateway.timeout_ms = Some(timeout_ms);
            }
        }

        if let Some(master_data) = patch.master_data {
            if let Some(id_strategy) = master_data.id_strategy {
                self.master_data.id_strategy = id_strategy;
            }
            if let Some(actor) = master_data.actor {
                self.master_data.actor = actor;
            }
        }

        if let Some(uploads) = patch.uploads {
            if let Some(accepted_mime_types) = uploads.accepted_mime_types {
                self.uploads.accepted_mime_types = accepted_mime_types;
            }
            if let Some(advisory_max_bytes) = uploads.advisory_max_bytes {
                self.uploads.advisory_max_bytes = advisory_max_bytes;
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
        if let Some(value) = read_env("COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE") {
            self.wizard.validate_on_advance =
                parse_bool("COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE", &value)?;
        }
        if let Some(value) = read_env("COVERNOTE_WIZARD_INTEGRATION_ENABLED") {
            self.wizard.integration_enabled =
                parse_bool("COVERNOTE_WIZARD_INTEGRATION_ENABLED", &value)?;
        }

        if let Some(value) = read_env("COVERNOTE_GATEWAY_INTEGRATION_LATENCY_MS") {
            self.gateway.integration_latency_ms =
                parse_u64("COVERNOTE_GATEWAY_INTEGRATION_LATENCY_MS", &value)?;
        }
        if let Some(value) = read_env("COVERNOTE_GATEWAY_MANUAL_LATENCY_MS") {
            self.gateway.manual_latency_ms =
                parse_u64("COVERNOTE_GATEWAY_MANUAL_LATENCY_MS", &value)?;
        }
        if let Some(value) = read_env("COVERNOTE_GATEWAY_TIMEOUT_MS") {
            self.gateway.timeout_ms = Some(parse_u64("COVERNOTE_GATEWAY_TIMEOUT_MS", &value)?);
        }

        if let Some(value) = read_env("COVERNOTE_MASTER_DATA_ID_STRATEGY") {
            self.master_data.id_strategy = value.parse()?;
        }
        if let Some(value) = read_env("COVERNOTE_MASTER_DATA_ACTOR") {
            self.master_data.actor = value;
        }

        if let Some(value) = read_env("COVERNOTE_UPLOADS_ACCEPTED_MIME_TYPES") {
            self.uploads.accepted_mime_types = value
                .split(',')
                .map(str::trim)
                .filter(|mime| !mime.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(value) = read_env("COVERNOTE_UPLOADS_ADVISORY_MAX_BYTES") {
            self.uploads.advisory_max_bytes =
                parse_u64("COVERNOTE_UPLOADS_ADVISORY_MAX_BYTES", &value)?;
        }

        let log_level =
            read_env("COVERNOTE_LOGGING_LEVEL").or_else(|| read_env("COVERNOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("COVERNOTE_LOGGING_FORMAT").or_else(|| read_env("COVERNOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(validate_on_advance) = overrides.validate_on_advance {
            self.wizard.validate_on_advance = validate_on_advance;
        }
        if let Some(integration_enabled) = overrides.integration_enabled {
            self.wizard.integration_enabled = integration_enabled;
        }
        if let Some(integration_latency_ms) = overrides.integration_latency_ms {
            self.gateway.integration_latency_ms = integration_latency_ms;
        }
        if let Some(manual_latency_ms) = overrides.manual_latency_ms {
            self.gateway.manual_latency_ms = manual_latency_ms;
        }
        if let Some(id_strategy) = overrides.id_strategy {
            self.master_data.id_strategy = id_strategy;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_gateway(&self.gateway)?;
        validate_master_data(&self.master_data)?;
        validate_uploads(&self.uploads)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

/// Candidate config file locations, in lookup order.
pub fn config_file_candidates() -> [PathBuf; 2] {
    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    config_file_candidates().into_iter().find(|path| path.exists())
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

fn validate_gateway(gateway: &GatewayConfig) -> Result<(), ConfigError> {
    const MAX_LATENCY_MS: u64 = 60_000;

    if gateway.integration_latency_ms > MAX_LATENCY_MS {
        return Err(ConfigError::Validation(format!(
            "gateway.integration_latency_ms must be at most {MAX_LATENCY_MS}"
        )));
    }
    if gateway.manual_latency_ms > MAX_LATENCY_MS {
        return Err(ConfigError::Validation(format!(
            "gateway.manual_latency_ms must be at most {MAX_LATENCY_MS}"
        )));
    }
    if gateway.timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "gateway.timeout_ms must be greater than zero when set (omit it to disable)"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_master_data(master_data: &MasterDataConfig) -> Result<(), ConfigError> {
    if master_data.actor.trim().is_empty() {
        return Err(ConfigError::Validation(
            "master_data.actor must not be empty; it is written into audit stamps".to_string(),
        ));
    }
    Ok(())
}

fn validate_uploads(uploads: &UploadConfig) -> Result<(), ConfigError> {
    if uploads.accepted_mime_types.is_empty() {
        return Err(ConfigError::Validation(
            "uploads.accepted_mime_types must list at least one MIME type".to_string(),
        ));
    }
    if let Some(bad) = uploads.accepted_mime_types.iter().find(|mime| !mime.contains('/')) {
        return Err(ConfigError::Validation(format!(
            "uploads.accepted_mime_types entry `{bad}` is not a MIME type (expected type/subtype)"
        )));
    }
    if uploads.advisory_max_bytes == 0 {
        return Err(ConfigError::Validation(
            "uploads.advisory_max_bytes must be greater than zero".to_string(),
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

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    wizard: Option<WizardPatch>,
    gateway: Option<GatewayPatch>,
    master_data: Option<MasterDataPatch>,
    uploads: Option<UploadsPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WizardPatch {
    validate_on_advance: Option<bool>,
    integration_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct GatewayPatch {
    integration_latency_ms: Option<u64>,
    manual_latency_ms: Option<u64>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MasterDataPatch {
    id_strategy: Option<IdStrategy>,
    actor: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UploadsPatch {
    accepted_mime_types: Option<Vec<String>>,
    advisory_max_bytes: Option<u64>,
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
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use crate::ids::IdStrategy;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

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
    fn defaults_match_console_behaviour() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(!config.wizard.validate_on_advance, "advance should not validate by default")?;
        ensure(!config.wizard.integration_enabled, "integration should be off by default")?;
        ensure(config.gateway.integration_latency_ms == 3_000, "integration latency is 3s")?;
        ensure(config.gateway.manual_latency_ms == 2_000, "manual latency is 2s")?;
        ensure(config.gateway.timeout_ms.is_none(), "gateway timeout is disabled by default")?;
        ensure(config.master_data.actor == "Current User", "placeholder actor expected")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_COVERNOTE_ACTOR", "ops-desk");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("covernote.toml");
            fs::write(
                &path,
                r#"
[master_data]
actor = "${TEST_COVERNOTE_ACTOR}"
id_strategy = "uuid"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.master_data.actor == "ops-desk", "actor should come from environment")?;
            ensure(
                config.master_data.id_strategy == IdStrategy::Uuid,
                "id strategy should be read from file",
            )
        })();

        clear_vars(&["TEST_COVERNOTE_ACTOR"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("COVERNOTE_LOG_LEVEL", "warn");
        env::set_var("COVERNOTE_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["COVERNOTE_LOG_LEVEL", "COVERNOTE_LOG_FORMAT"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("COVERNOTE_GATEWAY_MANUAL_LATENCY_MS", "750");
        env::set_var("COVERNOTE_WIZARD_INTEGRATION_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("covernote.toml");
            fs::write(
                &path,
                r#"
[wizard]
validate_on_advance = true
integration_enabled = false

[gateway]
integration_latency_ms = 1200
manual_latency_ms = 900

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    integration_latency_ms: Some(0),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.wizard.validate_on_advance, "file value should beat the default")?;
            ensure(config.wizard.integration_enabled, "env flag should win over file")?;
            ensure(config.gateway.manual_latency_ms == 750, "env latency should win over file")?;
            ensure(config.gateway.integration_latency_ms == 0, "override latency should win")?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")
        })();

        clear_vars(&[
            "COVERNOTE_GATEWAY_MANUAL_LATENCY_MS",
            "COVERNOTE_WIZARD_INTEGRATION_ENABLED",
        ]);
        result
    }

    #[test]
    fn invalid_env_flag_is_reported_with_key() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE", "sometimes");

        let result = match AppConfig::load(LoadOptions::default()) {
            Ok(_) => Err("expected env override failure".to_string()),
            Err(ConfigError::InvalidEnvOverride { key, .. }) => ensure(
                key == "COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE",
                "error should name the offending variable",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
        };

        clear_vars(&["COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE"]);
        result
    }

    #[test]
    fn validation_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("covernote.toml");
            fs::write(
                &path,
                r#"
[uploads]
accepted_mime_types = ["pdf"]
"#,
            )
            .map_err(|err| err.to_string())?;

            let options = LoadOptions { config_path: Some(path), ..LoadOptions::default() };
            let error = match AppConfig::load(options) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message)
                    if message.contains("uploads.accepted_mime_types")
            );
            ensure(has_message, "validation failure should mention uploads.accepted_mime_types")
        })();

        result
    }

    #[test]
    fn missing_required_file_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("absent.toml");

        let error = AppConfig::load(LoadOptions {
            config_path: Some(path.clone()),
            require_file: true,
            ..LoadOptions::default()
        })
        .expect_err("file is required");
        assert!(matches!(error, ConfigError::MissingConfigFile(missing) if missing == path));
    }
}
