//! CLI demo — runs the birth-data intake flow over stdin/stdout.
//!
//! Plain text is step input; lines starting with `/` are trigger events
//! (`/skip`, `/cancel`).

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{Mutex, mpsc};

use intake::config::FlowConfig;
use intake::error::EventError;
use intake::event::{EventSource, InputEvent, PromptRequest, Prompter, WaitToken};
use intake::flow::{Flow, FlowOutcome, WorkflowState};
use intake::form::{FormContext, FormOutcome};
use intake::plugin::{AttemptsPlugin, CancelPlugin, Plugin, PluginSet, SkipPlugin};
use intake::session::MemorySession;
use intake::step::StepRegistry;
use intake::steps::{BirthDateStep, BirthPlaceStep, BirthTimeStep};

/// Event source reading stdin on a background task.
struct StdinEvents {
    rx: Mutex<mpsc::UnboundedReceiver<InputEvent>>,
}

impl StdinEvents {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            continue;
                        }
                        let event = match line.strip_prefix('/') {
                            Some(trigger) => InputEvent::Trigger(trigger.to_string()),
                            None => InputEvent::Text(line),
                        };
                        if tx.send(event).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Self { rx: Mutex::new(rx) }
    }
}

#[async_trait]
impl EventSource for StdinEvents {
    async fn next_event(&self, _token: WaitToken) -> Result<InputEvent, EventError> {
        self.rx.lock().await.recv().await.ok_or(EventError::Closed)
    }
}

/// Prompter printing to stdout.
struct ConsolePrompter;

#[async_trait]
impl Prompter for ConsolePrompter {
    async fn render(&self, prompt: &PromptRequest) -> Result<(), EventError> {
        let question = match prompt.text_key.as_str() {
            "onboarding.birth_date" => "When were you born?",
            "onboarding.birth_time" => "At what time? (if you know it)",
            "onboarding.birth_place" => "Where were you born? Coordinates, please.",
            other => other,
        };
        if let Some(guidance) = prompt.params.get("guidance").and_then(|v| v.as_str()) {
            println!("  ✗ {guidance}");
        }
        print!("{question}");
        if let Some(hint) = prompt.params.get("hint").and_then(|v| v.as_str()) {
            print!(" [{hint}]");
        }
        println!();
        for choice in &prompt.choices {
            println!("  ({} → /{})", choice.label, choice.trigger_id);
        }
        eprint!("> ");
        Ok(())
    }
}

fn registry(config: &FlowConfig) -> StepRegistry {
    let cancel = Plugin::Cancel(CancelPlugin::new("cancel").with_hook(
        |ctx: &FormContext<'_>| {
            println!("Okay, stopping here. Nothing was saved for {}.", ctx.user_id);
        },
    ));
    let max_attempts = config.max_attempts;
    let attempts = Plugin::Attempts(AttemptsPlugin::new(max_attempts, move |_ctx| {
        println!("Could not read that after {max_attempts} tries — leaving it empty.");
        Ok(FormOutcome::Skipped(serde_json::Value::Null))
    }));

    StepRegistry::new(vec![
        Arc::new(
            BirthDateStep::new()
                .with_plugins(PluginSet::new().with(cancel.clone()).with(attempts.clone())),
        ),
        Arc::new(BirthTimeStep::new().with_plugins(
            PluginSet::new()
                .with(cancel.clone())
                .with(Plugin::Skip(SkipPlugin::new("skip")))
                .with(attempts.clone()),
        )),
        Arc::new(
            BirthPlaceStep::new()
                .with_plugins(PluginSet::new().with(cancel).with(attempts)),
        ),
    ])
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    eprintln!("🌙 Intake demo v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Answer the prompts; /skip and /cancel where offered.\n");

    let config = FlowConfig::default();
    let session = Arc::new(MemorySession::new());
    let mut flow = Flow::with_config(registry(&config), session, config).on_complete(
        |state: &WorkflowState| {
            println!(
                "\nAll set! Collected: {}",
                serde_json::to_string_pretty(&state.steps_data)?
            );
            Ok(())
        },
    );

    let events = StdinEvents::new();
    let prompter = ConsolePrompter;

    match flow.run(&events, &prompter, "local-user").await? {
        FlowOutcome::Completed => {}
        FlowOutcome::Halted => println!("Workflow abandoned."),
        FlowOutcome::Advanced => unreachable!("run only returns terminal outcomes"),
    }

    Ok(())
}
