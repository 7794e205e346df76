use std::env;
use std::fs;
use std::path::Path;

use covernote_core::config::{resolve_config_path, AppConfig, LoadOptions};
use toml::Value;

struct ConfigField {
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
}

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for field in fields(&config) {
        let source = field_source(
            field.key,
            field.env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        lines.push(render_line(field.key, &field.value, source));
    }

    lines.join("\n")
}

fn fields(config: &AppConfig) -> Vec<ConfigField> {
    vec![
        ConfigField {
            key: "wizard.validate_on_advance",
            value: config.wizard.validate_on_advance.to_string(),
            env_keys: &["COVERNOTE_WIZARD_VALIDATE_ON_ADVANCE"],
        },
        ConfigField {
            key: "wizard.integration_enabled",
            value: config.wizard.integration_enabled.to_string(),
            env_keys: &["COVERNOTE_WIZARD_INTEGRATION_ENABLED"],
        },
        ConfigField {
            key: "gateway.integration_latency_ms",
            value: config.gateway.integration_latency_ms.to_string(),
            env_keys: &["COVERNOTE_GATEWAY_INTEGRATION_LATENCY_MS"],
        },
        ConfigField {
            key: "gateway.manual_latency_ms",
            value: config.gateway.manual_latency_ms.to_string(),
            env_keys: &["COVERNOTE_GATEWAY_MANUAL_LATENCY_MS"],
        },
        ConfigField {
            key: "gateway.timeout_ms",
            value: config
                .gateway
                .timeout_ms
                .map_or_else(|| "<unset>".to_string(), |timeout| timeout.to_string()),
            env_keys: &["COVERNOTE_GATEWAY_TIMEOUT_MS"],
        },
        ConfigField {
            key: "master_data.id_strategy",
            value: config.master_data.id_strategy.as_str().to_string(),
            env_keys: &["COVERNOTE_MASTER_DATA_ID_STRATEGY"],
        },
        ConfigField {
            key: "master_data.actor",
            value: config.master_data.actor.clone(),
            env_keys: &["COVERNOTE_MASTER_DATA_ACTOR"],
        },
        ConfigField {
            key: "uploads.accepted_mime_types",
            value: config.uploads.accepted_mime_types.join(","),
            env_keys: &["COVERNOTE_UPLOADS_ACCEPTED_MIME_TYPES"],
        },
        ConfigField {
            key: "uploads.advisory_max_bytes",
            value: config.uploads.advisory_max_bytes.to_string(),
            env_keys: &["COVERNOTE_UPLOADS_ADVISORY_MAX_BYTES"],
        },
        ConfigField {
            key: "logging.level",
            value: config.logging.level.clone(),
            env_keys: &["COVERNOTE_LOGGING_LEVEL", "COVERNOTE_LOG_LEVEL"],
        },
        ConfigField {
            key: "logging.format",
            value: format!("{:?}", config.logging.format).to_lowercase(),
            env_keys: &["COVERNOTE_LOGGING_FORMAT", "COVERNOTE_LOG_FORMAT"],
        },
    ]
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
