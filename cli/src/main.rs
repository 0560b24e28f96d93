//! CLI entrypoint for agent-relay
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use relay_application::{
    ConversationLogger, ConversationProgressNotifier, LlmGateway, NoConversationLogger,
    NoConversationProgress, RunConversationInput, RunConversationOutput, RunConversationUseCase,
};
use relay_domain::ConversationConfig;
use relay_infrastructure::{
    ConfigLoader, FileConfig, GeminiConfig, GeminiLlmGateway, JsonSchemaToolConverter,
    JsonlConversationLogger, ModelProvider, ScriptedLlmGateway, ToolRegistry,
    registry_from_config,
};
use relay_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_filter()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to load configuration: {}", e))?
    };

    if cli.show_config {
        show_config(&cli, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    for issue in config.check()? {
        warn!("{}", issue);
    }

    info!("Starting agent-relay");

    let task = resolve_task(&cli)?;
    let system_prompt = match &cli.system_prompt {
        Some(prompt) => prompt.clone(),
        None => config.system_prompt()?,
    };
    let conversation = conversation_config(&cli, &config);
    let input =
        RunConversationInput::new(task.clone(), conversation).with_system_prompt(system_prompt);

    // === Dependency Injection ===
    let registry = Arc::new(registry_from_config(&config.tools)?);
    let logger = conversation_logger(&cli, &config)?;

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling conversation");
            ctrl_c_token.cancel();
        }
    });

    let progress: Box<dyn ConversationProgressNotifier> = if cli.quiet {
        Box::new(NoConversationProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    let script = cli
        .script
        .clone()
        .or_else(|| config.model.script.as_ref().map(PathBuf::from));
    let (provider, _) = config.model.parse_provider();

    let output = if cli.script.is_some() || provider == ModelProvider::Scripted {
        let Some(path) = script else {
            bail!("the scripted provider needs a script (--script or [model] script)");
        };
        let gateway = ScriptedLlmGateway::from_file(&path)?;
        run_with(Arc::new(gateway), registry, logger, token, input, &*progress).await?
    } else {
        let gateway = GeminiLlmGateway::new(GeminiConfig::from_model_config(&config.model)?)?;
        run_with(Arc::new(gateway), registry, logger, token, input, &*progress).await?
    };

    let rendered = match cli.output {
        OutputFormat::Text => ConsoleFormatter::format(&task, &output.state),
        OutputFormat::Json => ConsoleFormatter::format_json(&task, &output.state),
    };
    println!("{}", rendered);

    Ok(if output.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Run one conversation against `gateway`.
async fn run_with<G: LlmGateway + 'static>(
    gateway: Arc<G>,
    registry: Arc<ToolRegistry>,
    logger: Arc<dyn ConversationLogger>,
    token: CancellationToken,
    input: RunConversationInput,
    progress: &dyn ConversationProgressNotifier,
) -> Result<RunConversationOutput> {
    let use_case = RunConversationUseCase::new(gateway, registry, Arc::new(JsonSchemaToolConverter))
        .with_logger(logger)
        .with_cancellation(token);
    Ok(use_case.execute_with_progress(input, progress).await?)
}

fn resolve_task(cli: &Cli) -> Result<String> {
    let task = match (&cli.task, &cli.task_file) {
        (Some(task), _) => task.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("could not read task file {}", path.display()))?,
        (None, None) => bail!("a task is required (positional TASK or --task-file)"),
    };

    let task = task.trim().to_string();
    if task.is_empty() {
        bail!("the task is empty");
    }
    Ok(task)
}

/// File configuration with command-line flags applied on top.
///
/// Lenient-parse warnings were already reported by `FileConfig::check`.
fn conversation_config(cli: &Cli, config: &FileConfig) -> ConversationConfig {
    let (mut conversation, _) = config.conversation.to_conversation_config();
    cli.apply_overrides(&mut conversation);
    conversation
}

fn conversation_logger(cli: &Cli, config: &FileConfig) -> Result<Arc<dyn ConversationLogger>> {
    let path = cli
        .log_file
        .clone()
        .or_else(|| config.logging.conversation_log.as_ref().map(PathBuf::from));

    match path {
        Some(path) => {
            let logger = JsonlConversationLogger::create(&path)
                .with_context(|| format!("could not open conversation log {}", path.display()))?;
            info!(path = %path.display(), "Writing conversation transcript");
            Ok(Arc::new(logger))
        }
        None => Ok(Arc::new(NoConversationLogger)),
    }
}

fn show_config(cli: &Cli, config: &FileConfig) -> Result<()> {
    println!("Configuration sources (highest priority first):");
    if cli.no_config {
        println!("  (files ignored: --no-config)");
    } else {
        for line in ConfigLoader::describe_sources(cli.config.as_ref()) {
            println!("{}", line);
        }
    }
    println!();
    println!("Merged configuration:");
    println!("{}", toml::to_string_pretty(config).context("could not render configuration")?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::TerminationReason;
    use relay_infrastructure::config::FileCommandToolConfig;
    use std::collections::BTreeMap;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["agent-relay"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_resolve_task() {
        assert_eq!(resolve_task(&cli(&["  Check the margin \n"])).unwrap(), "Check the margin");
        assert!(resolve_task(&cli(&[])).is_err());
        assert!(resolve_task(&cli(&["   "])).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("task.md");
        std::fs::write(&path, "Rebalance the portfolio\n").unwrap();
        let task = resolve_task(&cli(&["--task-file", path.to_str().unwrap()])).unwrap();
        assert_eq!(task, "Rebalance the portfolio");
    }

    #[test]
    fn test_flags_override_file_config() {
        let mut config = FileConfig::default();
        config.conversation.max_turns = Some(10);
        config.conversation.turn_delay_ms = 500;

        let conversation = conversation_config(&cli(&["--max-turns", "3"]), &config);
        assert_eq!(conversation.max_turns, Some(3));
        assert_eq!(conversation.turn_delay_ms, 500);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scripted_run_through_configured_command_tool() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("run.jsonl");

        let mut config = FileConfig::default();
        config.tools.command.insert(
            "getAvailableMargin".to_string(),
            FileCommandToolConfig {
                description: "Available margin in USD".to_string(),
                command: r#"echo '{"usd": 12500}'"#.to_string(),
                working_dir: None,
                fatal_exit_code: None,
                parameters: BTreeMap::new(),
            },
        );
        config.logging.conversation_log = Some(log_path.to_string_lossy().to_string());

        let gateway = ScriptedLlmGateway::from_json(
            r#"[{"calls": [{"name": "getAvailableMargin"}]}, {"text": "Balance OK."}]"#,
        )
        .unwrap();
        let registry = Arc::new(registry_from_config(&config.tools).unwrap());
        let logger = conversation_logger(&cli(&["task"]), &config).unwrap();
        let input = RunConversationInput::new("Check the balance", ConversationConfig::default());

        let output = run_with(
            Arc::new(gateway.clone()),
            registry,
            logger,
            CancellationToken::new(),
            input,
            &NoConversationProgress,
        )
        .await
        .unwrap();

        assert_eq!(
            output.termination(),
            Some(&TerminationReason::NoFurtherCalls {
                text: "Balance OK.".to_string()
            })
        );
        let outcome = &output.state.history[0].exchanges[0].outcome;
        assert_eq!(outcome.payload(), Some(&serde_json::json!({"usd": 12500})));
        assert_eq!(gateway.received_messages().len(), 2);

        let transcript = std::fs::read_to_string(&log_path).unwrap();
        assert!(transcript.lines().count() >= 4);
        assert!(transcript.contains("conversation_terminated"));
    }
}
