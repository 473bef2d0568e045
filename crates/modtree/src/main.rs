mod probe;
mod script;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info};

use modtree_core::kernel::{Error, Result};
use modtree_core::{DeviceHost, EngineConfig, EventKind};

use crate::probe::Trace;
use crate::script::{HostScript, LifecycleStep, Step};

/// Modtree: component tree lifecycle dispatch, driven from the command line
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Simple liveness check
    #[arg(long)]
    ping: bool,

    /// Engine configuration file (JSON, TOML or YAML); falls back to $MODTREE_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every lifecycle event with its traversal
    Events,
    /// Print the component tree a host script builds
    Show {
        /// Path to the host script
        script: PathBuf,
    },
    /// Run a host script and print what each step visited
    Run {
        /// Path to the host script
        script: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_level.as_str()))
        .try_init();

    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    let Some(command) = args.command else {
        println!("No command given. Run `modtree --help` for usage.");
        return ExitCode::SUCCESS;
    };

    let result = match command {
        Commands::Events => {
            print_events();
            Ok(())
        }
        Commands::Show { script } => show(&script, args.config.as_deref()),
        Commands::Run { script } => run(&script, args.config.as_deref()).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_events() {
    for kind in EventKind::ALL {
        println!("{:<36} {}", kind.name(), kind.traversal());
    }
}

fn load(script_path: &Path, config_path: Option<&Path>) -> Result<(HostScript, EngineConfig)> {
    let config = EngineConfig::load_or_default(config_path)?;
    let script = HostScript::load(script_path)?;
    info!(
        "Loaded host script {} ({} roots, {} steps)",
        script_path.display(),
        script.tree.len(),
        script.steps.len()
    );
    Ok((script, config))
}

fn show(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let (script, config) = load(script_path, config_path)?;
    let tree = script.build_tree(config, &Trace::default())?;
    print!("{}", tree.describe());
    Ok(())
}

async fn run(script_path: &Path, config_path: Option<&Path>) -> Result<()> {
    let (script, config) = load(script_path, config_path)?;
    let trace = Trace::default();
    let host = Arc::new(DeviceHost::new(script.build_tree(config, &trace)?));

    let mut failed_steps = 0;
    for (index, step) in script.steps.into_iter().enumerate() {
        let label = step.to_string();
        // Closes may block on rundown; keep them off the async workers.
        let outcome = {
            let host = host.clone();
            tokio::task::spawn_blocking(move || execute(&host, &step))
                .await
                .map_err(|e| Error::Other(format!("step {} panicked: {}", index + 1, e)))?
        };

        match outcome {
            Ok(summary) => println!("step {}: {} -> {}", index + 1, label, summary),
            Err(e) => {
                failed_steps += 1;
                println!("step {}: {} -> error: {}", index + 1, label, e);
            }
        }
        for (event, components) in trace.take_grouped() {
            println!("  {}: {}", event, components.join(", "));
        }
    }

    println!("{}", host.tree().describe().trim_end());
    if failed_steps > 0 {
        return Err(Error::Other(format!("{} step(s) failed", failed_steps)));
    }
    Ok(())
}

fn execute(host: &DeviceHost, step: &Step) -> Result<String> {
    match step {
        Step::Lifecycle(LifecycleStep::Create) => host.create().map(|()| "created".to_string()),
        Step::Lifecycle(LifecycleStep::Destroy) => host.destroy().map(|()| "destroyed".to_string()),
        Step::Lifecycle(LifecycleStep::Open { component }) => {
            let view = lookup(host, component)?;
            Ok(match view.open() {
                Ok(()) => view.state().to_string(),
                Err(status) => format!("open failed: {}", status),
            })
        }
        Step::Lifecycle(LifecycleStep::Close { component }) => {
            let view = lookup(host, component)?;
            view.close();
            Ok(view.state().to_string())
        }
        Step::Event(event) => host.deliver(event).map(|outcome| outcome.to_string()),
    }
}

fn lookup<'a>(host: &'a DeviceHost, name: &str) -> Result<modtree_core::ComponentView<'a>> {
    let tree = host.tree();
    tree.find(name)
        .map(|id| tree.view(id))
        .ok_or_else(|| Error::Other(format!("no component named '{}'", name)))
}
