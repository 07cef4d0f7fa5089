use std::sync::Arc;
use std::time::Duration;

use nomorejokes_agent::gemini::GeminiClient;
use nomorejokes_agent::llm::LlmClient;
use nomorejokes_agent::runtime::{AgentRuntime, ArticleGenerator};
use nomorejokes_core::config::{AppConfig, LoadOptions, LogFormat, LoggingConfig};
use nomorejokes_core::domain::ArticleRequest;
use nomorejokes_core::publish::ArticlePublisher;
use nomorejokes_core::render::TemplateRenderer;
use tracing_subscriber::filter::LevelFilter;
use uuid::Uuid;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_FAILURE};

const COMMAND: &str = "generate";

pub fn run(topic: &str) -> CommandResult {
    let Some(request) = ArticleRequest::from_text(topic) else {
        return CommandResult::failure(
            COMMAND,
            "invalid_topic",
            "topic must not be empty",
            EXIT_FAILURE,
        );
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            )
        }
    };
    init_stderr_logging(&config.logging);

    let llm: Arc<dyn LlmClient> = match GeminiClient::from_config(&config.llm) {
        Ok(client) => Arc::new(client),
        Err(error) => {
            return CommandResult::failure(COMMAND, "backend", error.to_string(), EXIT_FAILURE)
        }
    };
    let publisher = ArticlePublisher::new(
        TemplateRenderer::new(config.publishing.template_path.clone()),
        config.publishing.output_dir.clone(),
        config.publishing.public_base_url.clone(),
    );
    let runtime = AgentRuntime::new(llm, publisher, Duration::from_secs(config.llm.timeout_secs));

    let executor = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(executor) => executor,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                EXIT_FAILURE,
            )
        }
    };

    let correlation_id = format!("cli-{}", Uuid::new_v4());
    match executor.block_on(runtime.generate(&request, &correlation_id)) {
        Ok(published) => CommandResult::success(
            COMMAND,
            format!("published `{}` at {}", published.saved_path.display(), published.public_url),
            serde_json::to_value(&published).ok(),
        ),
        Err(error) => {
            CommandResult::failure(COMMAND, error.kind().as_str(), error.to_string(), EXIT_FAILURE)
        }
    }
}

// Stdout carries the JSON result, so diagnostics go to stderr.
fn init_stderr_logging(logging: &LoggingConfig) {
    let level = logging.level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level);

    let _ = match logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
