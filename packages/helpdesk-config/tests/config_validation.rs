use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use helpdesk_config::Error;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn sample_toml_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let mut table = root.as_table_mut().expect("Template config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Template config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(contents: &str) -> PathBuf {
	let nanos = SystemTime::now().duration_since(UNIX_EPOCH).expect("Clock is before epoch.");
	let path = env::temp_dir().join(format!(
		"helpdesk_config_{}_{}_{}.toml",
		std::process::id(),
		nanos.as_nanos(),
		COUNTER.fetch_add(1, Ordering::SeqCst)
	));

	fs::write(&path, contents).expect("Failed to write temp config.");

	path
}

fn validation_message(raw: &str) -> String {
	match helpdesk_config::parse(raw) {
		Err(Error::Validation { message }) => message,
		other => panic!("Expected validation error, got {other:?}."),
	}
}

#[test]
fn loads_sample_config_from_file() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML);
	let cfg = helpdesk_config::load(&path).expect("Failed to load sample config.");

	assert_eq!(cfg.service.http_bind, "127.0.0.1:8000");
	assert_eq!(cfg.storage.qdrant.vector_dim, 512);
	assert_eq!(cfg.providers.llm.max_tokens, 512);
	assert_eq!(
		cfg.providers.llm.default_headers.get("X-Client").and_then(|v| v.as_str()),
		Some("helpdesk")
	);

	fs::remove_file(path).expect("Failed to remove temp config.");
}

#[test]
fn trims_trailing_slash_from_api_base() {
	let cfg = helpdesk_config::parse(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse.");

	assert_eq!(cfg.providers.embedding.api_base, "http://127.0.0.1:9000");
}

#[test]
fn missing_file_reports_path() {
	let path = env::temp_dir().join("helpdesk_config_does_not_exist.toml");

	match helpdesk_config::load(&path) {
		Err(Error::ReadConfig { path: reported, .. }) => assert_eq!(reported, path),
		other => panic!("Expected read error, got {other:?}."),
	}
}

#[test]
fn malformed_toml_reports_path() {
	let path = write_temp_config("[service\nhttp_bind = ");

	match helpdesk_config::load(&path) {
		Err(Error::ParseConfig { path: reported, .. }) => assert_eq!(reported, path),
		other => panic!("Expected parse error, got {other:?}."),
	}

	fs::remove_file(path).expect("Failed to remove temp config.");
}

#[test]
fn rejects_dimension_mismatch() {
	let raw = sample_toml_with(&["storage", "qdrant"], "vector_dim", Value::Integer(384));

	assert_eq!(
		validation_message(&raw),
		"providers.embedding.dimensions must match storage.qdrant.vector_dim."
	);
}

#[test]
fn rejects_zero_dimensions() {
	let raw = sample_toml_with(&["providers", "embedding"], "dimensions", Value::Integer(0));

	assert_eq!(
		validation_message(&raw),
		"providers.embedding.dimensions must be greater than zero."
	);
}

#[test]
fn rejects_zero_temperature() {
	let raw = sample_toml_with(&["providers", "llm"], "temperature", Value::Float(0.0));

	assert!(validation_message(&raw).starts_with("providers.llm.temperature must be in the range"));
}

#[test]
fn rejects_high_temperature() {
	let raw = sample_toml_with(&["providers", "llm"], "temperature", Value::Float(0.9));

	assert!(validation_message(&raw).starts_with("providers.llm.temperature must be in the range"));
}

#[test]
fn rejects_empty_api_key() {
	let raw = sample_toml_with(&["providers", "rerank"], "api_key", Value::String("  ".into()));

	assert_eq!(validation_message(&raw), "Provider rerank api_key must be non-empty.");
}

#[test]
fn rejects_zero_max_tokens() {
	let raw = sample_toml_with(&["providers", "llm"], "max_tokens", Value::Integer(0));

	assert_eq!(validation_message(&raw), "providers.llm.max_tokens must be greater than zero.");
}

#[test]
fn defaults_log_level_and_generation_settings() {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let tables = root.as_table_mut().expect("Template config must be a table.");

	tables
		.get_mut("service")
		.and_then(Value::as_table_mut)
		.expect("Template config must include [service].")
		.remove("log_level");

	let llm = tables
		.get_mut("providers")
		.and_then(Value::as_table_mut)
		.and_then(|providers| providers.get_mut("llm"))
		.and_then(Value::as_table_mut)
		.expect("Template config must include [providers.llm].");

	llm.remove("temperature");
	llm.remove("max_tokens");

	let raw = toml::to_string(&root).expect("Failed to render template config.");
	let cfg = helpdesk_config::parse(&raw).expect("Failed to parse config with defaults.");

	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.providers.llm.temperature, 0.2);
	assert_eq!(cfg.providers.llm.max_tokens, 512);
}

#[test]
fn provider_sections_need_only_endpoint_fields() {
	let raw = r#"
[service]
http_bind = "127.0.0.1:8000"

[storage.qdrant]
url        = "http://127.0.0.1:6334"
collection = "kb"
vector_dim = 384

[providers.embedding]
api_base   = "http://127.0.0.1:9000"
api_key    = "k"
path       = "/v1/embeddings"
model      = "all-minilm"
dimensions = 384
timeout_ms = 1000

[providers.rerank]
api_base   = "http://127.0.0.1:9001"
api_key    = "k"
path       = "/v1/rerank"
model      = "ms-marco"
timeout_ms = 1000

[providers.llm]
api_base   = "http://127.0.0.1:9002"
api_key    = "k"
path       = "/v1/chat/completions"
model      = "llama"
timeout_ms = 1000
"#;
	let cfg = helpdesk_config::parse(raw).expect("Failed to parse minimal provider sections.");

	assert_eq!(cfg.providers.rerank.model, "ms-marco");
	assert!(cfg.providers.embedding.default_headers.is_empty());
}
