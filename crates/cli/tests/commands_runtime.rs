use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use nomorejokes_cli::commands::{config, doctor, generate};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ARTICLE_JSON: &str = r#"{"title":"Quiet Streets","slug":"Quiet Streets!","meta_description":"A town goes silent.","keywords":"town, quiet, streets","html_content":"<p>Silence.</p>"}"#;

#[test]
fn generate_publishes_article_from_backend_response() {
    let dir = TempDir::new().expect("temp dir");
    let template = dir.path().join("article.html");
    fs::write(&template, "<h1>{{ title }}</h1><a href=\"{{ slug }}.html\"></a>{{ content }}")
        .expect("write template");
    let output_dir = dir.path().join("blog");

    let executor = tokio::runtime::Runtime::new().expect("runtime");
    let server = executor.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": format!("```json\n{ARTICLE_JSON}\n```") }] } }]
            })))
            .mount(&server)
            .await;
        server
    });

    let template_value = template.display().to_string();
    let output_value = output_dir.display().to_string();
    let base_url = server.uri();
    with_env(
        &[
            ("TELEGRAM_BOT_TOKEN", "123:test"),
            ("GEMINI_API_KEY", "gemini-test"),
            ("NOMOREJOKES_LLM_BASE_URL", &base_url),
            ("NOMOREJOKES_TEMPLATE_PATH", &template_value),
            ("NOMOREJOKES_OUTPUT_DIR", &output_value),
            ("NOMOREJOKES_PUBLIC_BASE_URL", "https://example.org/blog"),
        ],
        || {
            let result = generate::run("A quiet town");
            assert_eq!(result.exit_code, 0, "expected successful generation: {}", result.output);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["command"], "generate");
            assert_eq!(payload["status"], "ok");
            assert_eq!(payload["data"]["slug"], "quiet-streets");
            assert_eq!(payload["data"]["public_url"], "https://example.org/blog/quiet-streets.html");

            let page = fs::read_to_string(output_dir.join("quiet-streets.html")).expect("article");
            assert_eq!(
                page,
                "<h1>Quiet Streets</h1><a href=\"Quiet Streets!.html\"></a><p>Silence.</p>"
            );
        },
    );

    drop(server);
}

#[test]
fn generate_reports_parse_failure_without_writing() {
    let dir = TempDir::new().expect("temp dir");
    let template = dir.path().join("article.html");
    fs::write(&template, "{{ title }}").expect("write template");
    let output_dir = dir.path().join("blog");

    let executor = tokio::runtime::Runtime::new().expect("runtime");
    let server = executor.block_on(async {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "I cannot help with that." }] } }]
            })))
            .mount(&server)
            .await;
        server
    });

    let template_value = template.display().to_string();
    let output_value = output_dir.display().to_string();
    let base_url = server.uri();
    with_env(
        &[
            ("TELEGRAM_BOT_TOKEN", "123:test"),
            ("GEMINI_API_KEY", "gemini-test"),
            ("NOMOREJOKES_LLM_BASE_URL", &base_url),
            ("NOMOREJOKES_TEMPLATE_PATH", &template_value),
            ("NOMOREJOKES_OUTPUT_DIR", &output_value),
        ],
        || {
            let result = generate::run("anything");
            assert_eq!(result.exit_code, 1);

            let payload = parse_payload(&result.output);
            assert_eq!(payload["status"], "error");
            assert_eq!(payload["error_class"], "parse");
            assert!(!output_dir.exists());
        },
    );

    drop(server);
}

#[test]
fn generate_rejects_blank_topic() {
    with_env(&[], || {
        let result = generate::run("   ");
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "invalid_topic");
    });
}

#[test]
fn generate_returns_config_failure_without_secrets() {
    with_env(&[], || {
        let result = generate::run("topic");
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "generate");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn config_reports_sources_and_redacts_secrets() {
    with_env(
        &[
            ("TELEGRAM_BOT_TOKEN", "4242:very-secret"),
            ("GEMINI_API_KEY", "gemini-very-secret"),
            ("NOMOREJOKES_LLM_MODEL", "gemini-1.5-pro"),
        ],
        || {
            let result = config::run();
            assert_eq!(result.exit_code, 0);

            assert!(result.output.contains("- telegram.bot_token = 4242:*** (source: env (TELEGRAM_BOT_TOKEN))"));
            assert!(result.output.contains("- llm.api_key = <redacted> (source: env (GEMINI_API_KEY))"));
            assert!(result
                .output
                .contains("- llm.model = gemini-1.5-pro (source: env (NOMOREJOKES_LLM_MODEL))"));
            assert!(result.output.contains("- publishing.output_dir = blog (source: default)"));
            assert!(!result.output.contains("very-secret"));
        },
    );
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["overall_status"], "fail");
        let checks = payload["checks"].as_array().expect("checks array");
        assert_eq!(checks[0]["name"], "config_validation");
        assert_eq!(checks[0]["status"], "fail");
        assert!(checks[1..].iter().all(|check| check["status"] == "skipped"));
    });
}

#[test]
fn doctor_reports_missing_template_and_unreachable_telegram() {
    let dir = TempDir::new().expect("temp dir");
    let template_value = dir.path().join("missing.html").display().to_string();
    let output_value = dir.path().join("blog").display().to_string();

    with_env(
        &[
            ("TELEGRAM_BOT_TOKEN", "123:test"),
            ("GEMINI_API_KEY", "gemini-test"),
            ("NOMOREJOKES_TELEGRAM_API_BASE_URL", "http://127.0.0.1:9"),
            ("NOMOREJOKES_TEMPLATE_PATH", &template_value),
            ("NOMOREJOKES_OUTPUT_DIR", &output_value),
        ],
        || {
            let result = doctor::run(false);
            assert_eq!(result.exit_code, 1);
            assert!(result.output.starts_with("doctor: one or more readiness checks failed"));
            assert!(result.output.contains("- [ok] config_validation"));
            assert!(result.output.contains("- [fail] template_readable"));
            assert!(result.output.contains("- [ok] output_dir_writable"));
            assert!(result.output.contains("- [fail] telegram_connectivity"));
        },
    );
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "TELEGRAM_BOT_TOKEN",
        "GEMINI_API_KEY",
        "TELEGRAM_API_ID",
        "TELEGRAM_API_HASH",
        "NOMOREJOKES_TELEGRAM_API_BASE_URL",
        "NOMOREJOKES_TELEGRAM_POLL_TIMEOUT_SECS",
        "NOMOREJOKES_LLM_BASE_URL",
        "NOMOREJOKES_LLM_MODEL",
        "NOMOREJOKES_LLM_TIMEOUT_SECS",
        "NOMOREJOKES_TEMPLATE_PATH",
        "NOMOREJOKES_OUTPUT_DIR",
        "NOMOREJOKES_PUBLIC_BASE_URL",
        "NOMOREJOKES_SERVER_HEALTH_ENABLED",
        "NOMOREJOKES_SERVER_BIND_ADDRESS",
        "NOMOREJOKES_SERVER_HEALTH_CHECK_PORT",
        "NOMOREJOKES_LOGGING_LEVEL",
        "NOMOREJOKES_LOGGING_FORMAT",
        "NOMOREJOKES_LOG_LEVEL",
        "NOMOREJOKES_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
