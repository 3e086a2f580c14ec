/*
This code is part of the GP Tools geoprocessing runtime.
Authors: GP Tools developers
Created: 09/10/2026
Last Modified: 16/10/2026
License: MIT
*/

/*!
`gp_tools` lists the available geoprocessing tools, prints their parameters
and runs them through the configured engine executable.

| Command                          | Description                                                    |
| -------------------------------- | -------------------------------------------------------------- |
| list [KEYWORDS]                  | Lists all tools, or those matching any of the keywords.         |
| help TOOL                        | Prints the help associated with a tool.                         |
| parameters TOOL                  | Prints the parameters (in json form) of a tool.                 |
| toolbox [TOOL]                   | Prints the toolbox of a tool, or of every tool.                 |
| env KEY [VALUE]                  | Stores a default environment setting; no value removes it.      |
| run TOOL [--env K=V] -- ARGS     | Runs a tool, e.g. `run FeatureCompare -- --sort_field=FID`.     |

Global flags `--wd`, `--engine` and `--timeout` are saved to settings.json; `-v` applies
to the current run only.
*/

use clap::{ArgAction, Args, Parser, Subcommand};
use flexi_logger::{FlexiLoggerError, Logger};
use gp_common::configs::{self, ConfigError, Configs};
use gp_common::utils::get_formatted_elapsed_time;
use gp_tools::executors::CommandExecutor;
use gp_tools::tools::errors::DescriptorError;
use gp_tools::tools::invocation::build_request;
use gp_tools::tools::{
    EnvironmentSettings, GeoprocessingTool, ParameterRole, ParameterValue, ProcessError,
    ProcessRuntime, ToolDescriptor, ToolRegistry,
};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("unable to start logging: {0}")]
    Logger(#[from] FlexiLoggerError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid tool argument '{0}'; expected --name=value")]
    InvalidArgument(String),

    #[error("no engine executable is configured; pass --engine=PATH once to store it")]
    NoEngine,
}

#[derive(Parser, Debug)]
#[command(
    name = "gp_tools",
    version,
    about = "Runs geoprocessing tools through an external engine.",
    disable_help_subcommand = true
)]
struct Cli {
    /// Working directory handed to the engine.
    #[arg(long = "wd", visible_alias = "cd", value_name = "DIR", global = true)]
    working_directory: Option<String>,

    /// Engine executable that runs the tools.
    #[arg(long, value_name = "PATH", global = true)]
    engine: Option<String>,

    /// Seconds a single tool run may take; 0 waits indefinitely.
    #[arg(long, value_name = "SECONDS", global = true)]
    timeout: Option<u64>,

    /// Verbose mode.
    #[arg(short = 'v', long = "verbose", action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Lists the available tools, optionally filtered by keywords.
    List { keywords: Vec<String> },
    /// Prints the help associated with a tool.
    Help { tool: String },
    /// Prints the parameters (in json form) of a tool.
    Parameters { tool: String },
    /// Prints the toolbox of a tool, or of every tool.
    Toolbox { tool: Option<String> },
    /// Stores a default environment setting in settings.json.
    Env {
        key: String,
        /// Omit to remove the setting.
        value: Option<String>,
    },
    /// Runs a tool.
    Run(RunCommand),
}

#[derive(Args, Debug)]
struct RunCommand {
    /// Tool name or qualified execute name, e.g. `management.FeatureCompare`.
    tool: String,

    /// Environment override for this run.
    #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    environment: Vec<(String, String)>,

    /// Prints the request instead of running the engine.
    #[arg(long)]
    dry_run: bool,

    /// Tool parameters, e.g. `--in_base_features=roads.shp`.
    #[arg(last = true)]
    args: Vec<String>,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("'{}' is not KEY=VALUE", s)),
    }
}

/// Splits `--name=value` and `--name value` pairs.
fn parse_tool_args(args: &[String]) -> Result<Vec<(String, String)>, CliError> {
    let mut ret = vec![];
    let mut i = 0;
    while i < args.len() {
        let arg = args[i].trim();
        let flag = arg
            .strip_prefix("--")
            .or_else(|| arg.strip_prefix('-'))
            .ok_or_else(|| CliError::InvalidArgument(arg.to_string()))?;
        match flag.split_once('=') {
            Some((name, value)) => ret.push((name.to_string(), strip_quotes(value).to_string())),
            None => {
                let value = args
                    .get(i + 1)
                    .filter(|v| !v.starts_with("--"))
                    .ok_or_else(|| CliError::InvalidArgument(arg.to_string()))?;
                ret.push((flag.to_string(), strip_quotes(value).to_string()));
                i += 1;
            }
        }
        i += 1;
    }
    Ok(ret)
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}

fn init_logging(verbose: bool) -> Result<flexi_logger::LoggerHandle, CliError> {
    let level = if verbose { "info" } else { "warn" };
    Ok(Logger::try_with_env_or_str(level)?.log_to_stderr().start()?)
}

/// Applies the global flags to the stored settings; returns whether they changed.
/// `-v` only applies to the current run and is not stored.
fn update_configs(cli: &Cli, configs: &mut Configs) -> bool {
    let mut modified = false;
    if let Some(wd) = &cli.working_directory {
        if configs.working_directory != *wd {
            configs.working_directory = wd.clone();
            modified = true;
        }
    }
    if let Some(engine) = &cli.engine {
        if configs.engine_path != *engine {
            configs.engine_path = engine.clone();
            modified = true;
        }
    }
    if let Some(timeout) = cli.timeout {
        let timeout = if timeout == 0 { None } else { Some(timeout) };
        if configs.timeout_secs != timeout {
            configs.timeout_secs = timeout;
            modified = true;
        }
    }
    modified
}

/// Stored defaults narrowed to the keys the tool honours, overlaid with the
/// overrides given for this run. Explicit overrides are not narrowed, so an
/// invalid one is still rejected when the request is built.
fn tool_environment(
    descriptor: &ToolDescriptor,
    stored: &BTreeMap<String, String>,
    requested: &[(String, String)],
) -> EnvironmentSettings {
    let defaults = EnvironmentSettings::from_literals(stored).restricted_to(descriptor.environments());
    let requested = EnvironmentSettings::from_literals(requested.iter().map(|(k, v)| (k, v)));
    defaults.merged_with(&requested)
}

fn print_list(title: &str, tools: &[(String, String)]) {
    let mut ret = format!("{} {}:\n", tools.len(), title);
    for (name, description) in tools {
        ret.push_str(&format!("{}: {}\n\n", name, description));
    }
    println!("{}", ret);
}

fn run_tool(
    command: &RunCommand,
    registry: &ToolRegistry,
    configs: &Configs,
    verbose: bool,
) -> Result<(), CliError> {
    let mut tool = registry.create(&command.tool)?;
    for (name, value) in parse_tool_args(&command.args)? {
        tool.set_literal(&name, &value)?;
    }
    let environment = tool_environment(tool.descriptor(), &configs.environments, &command.environment);

    if command.dry_run {
        let request = build_request(tool.descriptor(), tool.instance().values(), &environment)?;
        println!("{}", serde_json::to_string_pretty(&request.redacted(tool.descriptor()))?);
        return Ok(());
    }

    if configs.engine_path.trim().is_empty() {
        return Err(CliError::NoEngine);
    }
    let mut executor = CommandExecutor::new(&configs.engine_path)
        .timeout(configs.timeout_secs.map(Duration::from_secs));
    if !configs.working_directory.is_empty() {
        executor = executor.working_dir(&configs.working_directory);
    }

    let runtime = ProcessRuntime::new(executor);
    let report = runtime.execute(&mut tool, &environment)?;
    for message in &report.messages {
        println!("{}", message);
    }
    for (p, slot) in tool.descriptor().parameters().iter().zip(tool.parameters()) {
        if p.role != ParameterRole::Derived {
            continue;
        }
        let value = match slot {
            ParameterValue::Present(v) => v.to_literal(),
            ParameterValue::Unrecognized(token) => format!("{} (unrecognized)", token),
            _ => "(not computed)".to_string(),
        };
        println!("{}: {}", p.name, value);
    }
    for warning in &report.warnings {
        log::warn!(
            "parameter '{}' returned an unrecognized value '{}'",
            warning.parameter,
            warning.token
        );
    }
    if verbose {
        println!("Elapsed Time (including engine start-up): {}", get_formatted_elapsed_time(report.elapsed));
    }
    Ok(())
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let mut configs = configs::get_configs()?;
    if update_configs(&cli, &mut configs) {
        configs::save_configs(&configs)?;
    }
    let verbose = cli.verbose || configs.verbose_mode;
    let _logger = init_logging(verbose)?;
    let registry = ToolRegistry::with_builtin_tools()?;

    match &cli.command {
        None => print_list("Available Tools", &registry.list_tools()),
        Some(Commands::List { keywords }) if keywords.is_empty() => {
            print_list("Available Tools", &registry.list_tools())
        }
        Some(Commands::List { keywords }) => {
            print_list("Tools containing keywords", &registry.list_tools_with_keywords(keywords))
        }
        Some(Commands::Help { tool }) => println!("{}", registry.tool_help(tool)?),
        Some(Commands::Parameters { tool }) => println!("{}", registry.tool_parameters(tool)?),
        Some(Commands::Toolbox { tool: Some(tool) }) => println!("{}", registry.toolbox(tool)?),
        Some(Commands::Toolbox { tool: None }) => {
            for (tool, toolbox) in registry.toolboxes() {
                println!("{}: {}", tool, toolbox);
            }
        }
        Some(Commands::Env { key, value }) => {
            match value {
                Some(v) => configs.environments.insert(key.clone(), v.clone()),
                None => configs.environments.remove(key),
            };
            configs::save_configs(&configs)?;
        }
        Some(Commands::Run(command)) => run_tool(command, &registry, &configs, verbose)?,
    }
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gp_tools::tools::ParamValue;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_tool_args() {
        let parsed = parse_tool_args(&args(&[
            "--in_base_features=roads.shp",
            "--sort_field",
            "FID;NAME",
            "--xy_tolerance='1 Meters'",
        ]))
        .unwrap();
        assert_eq!(
            parsed,
            vec![
                ("in_base_features".to_string(), "roads.shp".to_string()),
                ("sort_field".to_string(), "FID;NAME".to_string()),
                ("xy_tolerance".to_string(), "1 Meters".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_tool_args_rejects_dangling_flag() {
        assert!(parse_tool_args(&args(&["--in_table"])).is_err());
        assert!(parse_tool_args(&args(&["roads.shp"])).is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("workspace=/data/a.gdb").unwrap(),
            ("workspace".to_string(), "/data/a.gdb".to_string())
        );
        assert!(parse_key_value("workspace").is_err());
    }

    #[test]
    fn test_cli_parses_run_command() {
        let cli = Cli::try_parse_from([
            "gp_tools",
            "-v",
            "run",
            "FeatureCompare",
            "--env",
            "extent=0 0 1 1",
            "--dry-run",
            "--",
            "--in_base_features=a.shp",
        ])
        .unwrap();
        assert!(cli.verbose);
        match cli.command {
            Some(Commands::Run(run)) => {
                assert_eq!(run.tool, "FeatureCompare");
                assert!(run.dry_run);
                assert_eq!(run.environment, vec![("extent".to_string(), "0 0 1 1".to_string())]);
                assert_eq!(run.args, vec!["--in_base_features=a.shp"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_cli_parses_tool_help_command() {
        let cli = Cli::try_parse_from(["gp_tools", "help", "FeatureCompare"]).unwrap();
        match cli.command {
            Some(Commands::Help { tool }) => assert_eq!(tool, "FeatureCompare"),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(Cli::try_parse_from(["gp_tools"]).unwrap().command.is_none());
    }

    #[test]
    fn test_verbose_flag_is_not_stored() {
        let mut configs = Configs::new();
        configs.verbose_mode = true;
        let cli = Cli::try_parse_from(["gp_tools", "list"]).unwrap();
        assert!(!update_configs(&cli, &mut configs));
        assert!(configs.verbose_mode);
    }

    #[test]
    fn test_stored_environments_are_narrowed_per_tool() {
        let registry = ToolRegistry::with_builtin_tools().unwrap();
        let mut stored = BTreeMap::new();
        stored.insert("workspace".to_string(), "/data/city.gdb".to_string());

        let layout = registry.create("ApplyForceDirectedLayout").unwrap();
        let env = tool_environment(layout.descriptor(), &stored, &[]);
        assert!(env.is_empty());

        let package = registry.create("PackageLayer").unwrap();
        let env = tool_environment(package.descriptor(), &stored, &[]);
        assert_eq!(env.get("workspace"), Some(&ParamValue::text("/data/city.gdb")));

        let mut layout = registry.create("ApplyForceDirectedLayout").unwrap();
        layout.set_literal("in_network_diagram_layer", "Diagram").unwrap();
        let env = tool_environment(layout.descriptor(), &stored, &[]);
        assert!(build_request(layout.descriptor(), layout.values(), &env).is_ok());

        let explicit = vec![("workspace".to_string(), "/other.gdb".to_string())];
        let env = tool_environment(layout.descriptor(), &stored, &explicit);
        assert!(matches!(
            build_request(layout.descriptor(), layout.values(), &env),
            Err(ProcessError::InvalidEnvironmentKey { .. })
        ));
    }

    #[test]
    fn test_update_configs_tracks_changes() {
        let cli = Cli::try_parse_from(["gp_tools", "--engine", "/opt/engine", "--timeout", "0", "list"]).unwrap();
        let mut configs = Configs::new();
        configs.timeout_secs = Some(30);
        assert!(update_configs(&cli, &mut configs));
        assert_eq!(configs.engine_path, "/opt/engine");
        assert_eq!(configs.timeout_secs, None);
        assert!(!update_configs(&cli, &mut configs));
    }
}
