use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zhmc_core::utils::{log_init, CliConfig};
use zhmc_core::{Error, Properties};
use zhmc_modules::{ModuleKind, ModuleRunner};
use zhmc_session::{FakedHmc, SessionFactory};

/// zhmc Command Line Interface
///
/// Runs the zhmc modules with parameters from a JSON file and prints the
/// module output as JSON.
#[derive(Parser)]
#[clap(author, version, about)]
struct Cli {
    /// Path to the configuration file
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a module
    Run {
        /// Module name, e.g. zhmc_partition or partition
        module: String,

        /// Path to a JSON file with the module parameters
        #[clap(long)]
        args: PathBuf,

        /// Only report what would change
        #[clap(long)]
        check: bool,

        /// Path to a faked HMC definition (TOML or JSON) to run against
        #[clap(long)]
        faked_hmc: Option<PathBuf>,
    },

    /// List the available modules
    #[clap(name = "list-modules")]
    ListModules,
}

fn main() {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn execute(cli: Cli) -> Result<i32> {
    let config = CliConfig::load(cli.config.as_deref())?;
    match cli.command {
        Commands::Run {
            module,
            args,
            check,
            faked_hmc,
        } => run_module(&config, &module, &args, check, faked_hmc),
        Commands::ListModules => {
            for kind in ModuleKind::ALL {
                println!("{}", kind);
            }
            Ok(0)
        }
    }
}

fn read_params(path: &Path) -> Result<Properties> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read module parameters from {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    match value {
        Value::Object(params) => Ok(params),
        _ => Err(anyhow!(
            "Module parameters in {} must be a JSON object",
            path.display()
        )),
    }
}

/// Run a module and print its output. Returns the process exit code.
fn run_module(
    config: &CliConfig,
    module: &str,
    args: &Path,
    check: bool,
    faked_hmc: Option<PathBuf>,
) -> Result<i32> {
    let kind = ModuleKind::from_name(module).ok_or_else(|| anyhow!("Unknown module: {}", module))?;
    let params = read_params(args)?;

    // the log_file module parameter wins over the configuration file
    let log_file = params
        .get("log_file")
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .or_else(|| config.log_file.clone());
    log_init(log_file.as_deref(), config.log_level)?;

    let factory = match faked_hmc.or_else(|| config.faked_hmc.clone()) {
        Some(path) => {
            info!("Using faked HMC from {}", path.display());
            SessionFactory::faked(Arc::new(FakedHmc::load(&path)?))
        }
        None => SessionFactory::new(),
    };
    let check_mode = check || config.check_mode;
    info!("Running module {} (check mode: {})", kind, check_mode);

    let runner = ModuleRunner::new(factory);
    let (output, code) = match runner.run(kind, &params, check_mode) {
        Ok(output) => (output.to_json(kind.result_key()), 0),
        Err(e) => (failure_output(&e), 1),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(code)
}

/// The output of a failed module run. Unexpected errors carry their full
/// debug rendering.
fn failure_output(error: &Error) -> Value {
    let mut output = json!({
        "changed": false,
        "failed": true,
        "msg": error.failure_message(),
    });
    if !error.is_handled() {
        output["exception"] = json!(format!("{:?}", error));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_output() {
        let output = failure_output(&Error::parameter("bad input"));
        assert_eq!(
            output,
            json!({"changed": false, "failed": true, "msg": "ParameterError: bad input"})
        );

        let output = failure_output(&Error::unexpected("loop exhausted"));
        assert!(output["msg"].as_str().unwrap().starts_with("AssertionError: "));
        assert!(output["exception"].as_str().unwrap().contains("loop exhausted"));
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "zhmc_cli", "run", "zhmc_cpc", "--args", "p.json", "--check",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                module,
                check,
                faked_hmc,
                ..
            } => {
                assert_eq!(module, "zhmc_cpc");
                assert!(check);
                assert!(faked_hmc.is_none());
            }
            Commands::ListModules => panic!("expected run"),
        }
    }
}
