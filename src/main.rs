//! RTE Bridge - Entry Point
//!
//! Operator tool around the bridge library: an interactive SCORM console for
//! poking at a session by hand, plus offline and live cmi5 launch
//! composition.

use clap::{Parser, Subcommand};
use rte_bridge::attach::{AttachmentManager, FrameChain, LocalFrame};
use rte_bridge::backend::{Backend, HttpBackend};
use rte_bridge::cmi5::{Actor, LaunchComposer, LaunchContext, LaunchState};
use rte_bridge::core::config::{config, set_config, BridgeConfig};
use rte_bridge::core::error::{BridgeError, Result};
use rte_bridge::core::types::{PackageId, ScormVersion};
use rte_bridge::rte::{surfaces, Session};

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// RTE Bridge - SCORM and cmi5 runtime tooling
#[derive(Parser, Debug)]
#[command(name = "rte-bridge")]
#[command(about = "Drive SCORM sessions and compose cmi5 launches")]
struct Cli {
    /// TOML config file (RTE_BRIDGE_* environment variables still apply)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive SCORM session against in-memory frames
    Console {
        /// Package id for the session
        #[arg(long, default_value = "console")]
        package: String,
    },

    /// Compose a cmi5 launch URL without contacting the backend
    LaunchUrl {
        package: String,

        /// Base launch URL of the package
        #[arg(long)]
        base: String,

        #[arg(long)]
        registration: Option<String>,
    },

    /// Negotiate a cmi5 launch with the configured backend
    Launch {
        package: String,

        /// Base launch URL; looked up from package metadata when omitted
        #[arg(long)]
        base: Option<String>,

        #[arg(long)]
        registration: Option<String>,

        /// Also exchange the fetch URL for an auth token and read the launch data
        #[arg(long)]
        fetch_token: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("rte_bridge=debug")),
        )
        .init();

    let cli = Cli::parse();
    let loaded = BridgeConfig::load(cli.config.as_deref())?;
    if set_config(loaded).is_err() {
        tracing::warn!("configuration already installed, keeping the existing one");
    }
    let config = config();

    match cli.command {
        Command::Console { package } => run_console(config, PackageId::new(package)),
        Command::LaunchUrl {
            package,
            base,
            registration,
        } => {
            let context = LaunchContext::new(
                PackageId::new(package),
                registration.as_deref(),
                Actor::from_learner(&config.learner),
                &config.lrs_endpoint,
            );
            println!("{}", context.launch_url(&base)?);
            Ok(())
        }
        Command::Launch {
            package,
            base,
            registration,
            fetch_token,
        } => {
            let rt = Runtime::new()?;
            rt.block_on(run_launch(
                config,
                PackageId::new(package),
                base,
                registration,
                fetch_token,
            ))
        }
    }
}

async fn run_launch(
    config: &BridgeConfig,
    package_id: PackageId,
    base: Option<String>,
    registration: Option<String>,
    fetch_token: bool,
) -> Result<()> {
    let backend = HttpBackend::new(config.clone())?;

    let base = match base {
        Some(base) => base,
        None => backend
            .fetch_metadata(&package_id)
            .await?
            .resolve_launch_url(&config.content_base)?,
    };

    let mut composer = LaunchComposer::new();
    let state = composer
        .init(
            &backend,
            package_id,
            registration.as_deref(),
            Actor::from_learner(&config.learner),
        )
        .await;
    if let LaunchState::Error(message) = state {
        return Err(BridgeError::LaunchInit(message.clone()));
    }

    let context = composer.context(&config.lrs_endpoint)?;
    println!("{}", context.launch_url(&base)?);

    if fetch_token {
        let token = backend.fetch_auth_token(&context.fetch_url).await?;
        println!("auth-token: {}", token);

        let launch_data = backend.fetch_launch_data(&context, &token).await?;
        println!("launch-mode: {:?}", launch_data.launch_mode);
        println!("move-on: {:?}", launch_data.move_on);
        if !launch_data.return_url.is_empty() {
            println!("return-url: {}", launch_data.return_url);
        }
    }
    Ok(())
}

fn run_console(config: &BridgeConfig, package_id: PackageId) -> Result<()> {
    let rt = Runtime::new()?;
    let _guard = rt.enter();

    // An unframed page: the player frame sits under a shared top frame
    let top = LocalFrame::new("top");
    let player = LocalFrame::new("player");
    let chain = FrameChain::new(player).with_parent(top.clone()).with_top(top);

    let session = Session::from_config(package_id.clone(), config);
    let mut attachment = AttachmentManager::new(&chain, surfaces(&session).to_vec());
    let report = attachment.start(config.attach_interval());

    println!("\n=== RTE BRIDGE CONSOLE ===");
    println!("Session {} for package {}", session.id(), package_id);
    println!("Published {} API object(s)", report.published);
    println!();
    println!("Commands:");
    println!("  <Method> [element] [value]  - Call an API method");
    println!("                                (LMSInitialize, GetValue cmi.location, ...)");
    println!("  status / s                  - Show session state");
    println!("  store                       - Dump the active data store");
    println!("  log                         - Show the call log");
    println!("  clear                       - Clear the call log");
    println!("  export <path>               - Write the call log as JSON");
    println!("  quit / q                    - Exit");
    println!();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        match input {
            "quit" | "q" => break,
            "status" | "s" => {
                println!("{}", serde_json::to_string_pretty(&session.info())?);
                continue;
            }
            "store" => {
                match session.active_store() {
                    Some(store) => {
                        for (key, value) in store.iter() {
                            println!("  {} = {:?}", key, value);
                        }
                    }
                    None => println!("No protocol active yet."),
                }
                continue;
            }
            "log" => {
                for entry in session.call_log() {
                    println!(
                        "  #{} [{}] {} {:?} at {}",
                        entry.id,
                        entry.protocol_version,
                        entry.method,
                        entry.args,
                        entry.timestamp.format("%H:%M:%S%.3f")
                    );
                }
                continue;
            }
            "clear" => {
                session.clear_call_log();
                println!("Call log cleared.");
                continue;
            }
            _ => {}
        }

        if let Some(path) = input.strip_prefix("export ") {
            match session.export_call_log_to(Path::new(path.trim())) {
                Ok(()) => println!("Call log written to {}", path.trim()),
                Err(e) => println!("Export failed: {}", e),
            }
            continue;
        }

        call_api(&chain, &session, input);
    }

    let removed = attachment.stop();
    println!("\nGoodbye! Retracted {} API object(s).", removed);
    Ok(())
}

/// Parse `<Method> [element] [value...]` and invoke it the way content would
fn call_api(chain: &FrameChain, session: &Session, input: &str) {
    let mut parts = input.splitn(3, char::is_whitespace);
    let method = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.map(str::trim).collect();

    let version = if method.starts_with("LMS") {
        ScormVersion::V12
    } else {
        ScormVersion::V2004
    };

    let Some(api) = chain.find_api(version.api_key()) else {
        println!("No {} object reachable from the player frame.", version.api_key());
        return;
    };

    // Lifecycle calls take a single empty-string argument
    let lifecycle = matches!(
        method,
        "LMSInitialize" | "Initialize" | "LMSFinish" | "Terminate" | "LMSCommit" | "Commit"
    );
    let args = if args.is_empty() && lifecycle {
        vec![""]
    } else {
        args
    };

    let result = api.invoke(method, &args);
    println!("{:?}  (error {})", result, session.last_error(version));
}
