/*
[INPUT]:  CLI arguments, YAML configuration file, OS shutdown signals
[OUTPUT]: Tailed command output on the terminal with graceful shutdown
[POS]:    Binary entry point
[UPDATE]: When changing CLI flags, startup flow, or shutdown handling
*/

mod cli;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use chaperone_adapter::{Category, ExecuteRequest, RunAction, RunCommandRequest, TailSource};
use chaperone_tail::terminal::{TerminalSink, spawn_message_printer};
use chaperone_tail::{AppContext, ChainExit, RenderPolicy, TailConfig};

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "chaperone-tail", version, about = "Tail chaperone console command output")]
struct Cli {
    #[arg(long = "config", value_name = "PATH", global = true)]
    config_path: Option<PathBuf>,
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info", global = true)]
    log_level: String,
    #[command(flatten)]
    overrides: Overrides,
    #[command(subcommand)]
    command: Command,
}

/// Flags that win over the configuration file
#[derive(Args, Debug)]
struct Overrides {
    #[arg(long = "base-url", value_name = "URL", global = true)]
    base_url: Option<String>,
    /// Session key of a logged-in operator
    #[arg(long = "session", value_name = "ID", global = true)]
    session_id: Option<String>,
    #[arg(long = "interval-ms", value_name = "MS", global = true)]
    interval_ms: Option<u64>,
    #[arg(long = "policy", value_name = "POLICY", global = true)]
    policy: Option<RenderPolicy>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tail runs that are already in progress
    Watch {
        /// `category/subject` or `execute/item/menu/group`; config targets when empty
        #[arg(value_name = "TARGET", value_parser = parse_target)]
        targets: Vec<TailSource>,
    },
    /// Start a configure/deploy run and tail it
    Run {
        #[arg(long)]
        category: Category,
        #[arg(long)]
        subject: String,
        #[arg(long, default_value = "validate", value_parser = parse_action)]
        action: RunAction,
        #[arg(long)]
        debug: bool,
        /// Extra form field as `key=value`
        #[arg(long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Start an execute-menu action and tail it
    Execute {
        #[arg(long = "item")]
        item_id: String,
        #[arg(long)]
        menu: String,
        #[arg(long)]
        group: String,
        #[arg(long = "action-id")]
        action_id: String,
        #[arg(long)]
        label: String,
        #[arg(long = "arg", value_name = "ACTION_ID")]
        arguments: Vec<String>,
    },
    /// Write a starter configuration file
    Init {
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

enum Start {
    Watch(Vec<TailSource>),
    Command(RunCommandRequest),
    Execute(ExecuteRequest),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let start = match args.command {
        Command::Init { output } => {
            let path = match output {
                Some(path) => path,
                None => TailConfig::default_path().context("no config directory on this platform")?,
            };
            return cli::init::run_init(&path);
        }
        Command::Watch { targets } => Start::Watch(targets),
        Command::Run {
            category,
            subject,
            action,
            debug,
            fields,
        } => {
            let mut request = RunCommandRequest::new(category, subject, action);
            request.debug = debug;
            request.fields = fields;
            Start::Command(request)
        }
        Command::Execute {
            item_id,
            menu,
            group,
            action_id,
            label,
            arguments,
        } => Start::Execute(ExecuteRequest {
            item_id,
            menu,
            group,
            action_id,
            label,
            arguments,
        }),
    };

    let mut config = load_config(args.config_path.as_deref())?;
    apply_overrides(&mut config, &args.overrides);
    let _log_guard = init_tracing(&args.log_level, config.logging.directory.as_deref())?;

    info!(
        base_url = %config.server.base_url,
        policy = %config.render_policy(),
        interval_ms = config.poll.interval_ms,
        "starting chaperone-tail"
    );

    let ctx = AppContext::with_sink(config, Arc::new(TerminalSink::stdout()))
        .context("build application context")?;

    ctx.add_init_function(|ctx| {
        spawn_message_printer(ctx.messages());
        Ok(())
    });

    let shutdown = CancellationToken::new();
    setup_signal_handlers(shutdown.clone());

    match start {
        Start::Watch(targets) => {
            ctx.add_init_function(move |ctx| {
                let targets = if targets.is_empty() {
                    ctx.config().targets.clone()
                } else {
                    targets
                };
                if targets.is_empty() {
                    bail!("nothing to watch; pass targets or list them in the config");
                }
                for source in targets {
                    ctx.runner().watch(source);
                }
                Ok(())
            });
            ctx.init().context("initialize")?;
        }
        Start::Command(request) => {
            ctx.init().context("initialize")?;
            ctx.runner()
                .start_command(&request)
                .await
                .with_context(|| format!("start {} {}", request.category, request.action))?;
        }
        Start::Execute(request) => {
            ctx.init().context("initialize")?;
            ctx.runner()
                .start_execute(&request)
                .await
                .with_context(|| format!("start {}", request.label))?;
        }
    }

    tokio::select! {
        _ = ctx.poller().wait_idle() => {
            info!("all polling chains finished");
        }
        _ = shutdown.cancelled() => {
            info!("shutdown signal received");
            ctx.document().clear();
        }
    }

    let exits = ctx
        .poller()
        .join_all(SHUTDOWN_TIMEOUT)
        .await
        .context("shutdown polling chains")?;

    if ctx.navigator().is_redirected() {
        let location = ctx
            .navigator()
            .location()
            .unwrap_or_else(|| ctx.navigator().login_path().to_string());
        bail!("session expired; log in again at {location}");
    }

    let failures: Vec<String> = exits
        .into_iter()
        .filter_map(|(source, exit)| match exit {
            ChainExit::Failed { message } => Some(format!("{source}: {message}")),
            ChainExit::RegionRemoved => None,
        })
        .collect();
    if !failures.is_empty() {
        bail!("polling stopped: {}", failures.join("; "));
    }

    info!("shutdown complete");
    Ok(())
}

fn init_tracing(log_level: &str, directory: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_new(log_level).context("invalid log level")?;
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard) = match directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chaperone-tail.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|err| anyhow!(err))
        .context("initialize tracing subscriber")?;
    Ok(guard)
}

fn load_config(path: Option<&Path>) -> Result<TailConfig> {
    if let Some(path) = path {
        return TailConfig::from_file(path).context("load config");
    }
    match TailConfig::default_path() {
        Some(path) if path.exists() => TailConfig::from_file(&path).context("load config"),
        _ => Ok(TailConfig::default()),
    }
}

fn apply_overrides(config: &mut TailConfig, args: &Overrides) {
    if let Some(base_url) = &args.base_url {
        config.server.base_url = base_url.clone();
    }
    if let Some(session_id) = &args.session_id {
        config.server.session_id = Some(session_id.clone());
    }
    if let Some(interval_ms) = args.interval_ms {
        config.poll.interval_ms = interval_ms;
    }
    if let Some(policy) = args.policy {
        config.poll.policy = policy;
    }
}

fn parse_target(value: &str) -> Result<TailSource, String> {
    let parts: Vec<&str> = value.split('/').collect();
    match parts.as_slice() {
        ["execute", item_id, menu, group] => Ok(TailSource::execute(*item_id, *menu, *group)),
        [category, subject] if !subject.is_empty() => {
            let category: Category = category.parse().map_err(|err| format!("{err}"))?;
            Ok(TailSource::command(category, *subject))
        }
        _ => Err(format!(
            "expected category/subject or execute/item/menu/group, got {value:?}"
        )),
    }
}

fn parse_action(value: &str) -> Result<RunAction, String> {
    match value.to_ascii_lowercase().as_str() {
        "run" => Ok(RunAction::Run),
        "validate" => Ok(RunAction::Validate),
        other => Err(format!("unknown action {other:?}; expected run or validate")),
    }
}

fn parse_field(value: &str) -> Result<(String, String), String> {
    value
        .split_once('=')
        .map(|(key, val)| (key.to_string(), val.to_string()))
        .ok_or_else(|| format!("expected key=value, got {value:?}"))
}

fn setup_signal_handlers(shutdown: CancellationToken) {
    let shutdown_clone = shutdown.clone();
    tokio::spawn(async move {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to install SIGINT handler");
            return;
        }
        info!("received SIGINT");
        shutdown_clone.cancel();
    });

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let shutdown_clone = shutdown.clone();
        tokio::spawn(async move {
            match signal(SignalKind::terminate()) {
                Ok(mut stream) => {
                    stream.recv().await;
                    info!("received SIGTERM");
                    shutdown_clone.cancel();
                }
                Err(err) => {
                    warn!(error = %err, "failed to install SIGTERM handler");
                }
            }
        });
    }
}
