use anyhow::{bail, Context, Result};
use marvin::cli::commands::{ArtifactAction, EnvConfigAction};
use marvin::cli::output::{format_artifact_types, format_plan, format_report};
use marvin::cli::terminal_output::TerminalOutput;
use marvin::cli::{Cli, Command};
use marvin::collaborators::Environment;
use marvin::core::{ConfigLookup, Event, MarvinConfig};
use marvin::env_config::{self, split_list};
use marvin::execution::ExecutionEngine;
use std::sync::Arc;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(log_level.into()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let exit_code = run(&cli)?;
    std::process::exit(exit_code)
}

fn run(cli: &Cli) -> Result<i32> {
    let project_root = cli.project_root.canonicalize().with_context(|| {
        format!("Project root {} is not accessible", cli.project_root.display())
    })?;

    let mut options = cli.load_options();
    options.project_root = project_root.clone();
    let config = MarvinConfig::load(&options).context("Failed to load configuration")?;

    if let Command::EnvConfig(cmd) = &cli.command {
        return env_config_command(&cmd.action, &config);
    }

    let environment = Environment::new(project_root, Arc::new(config));
    let mut engine = ExecutionEngine::with_defaults(environment);
    let project_type = engine.environment().setting("projectType", "product");

    if let Command::Artifact(cmd) = &cli.command {
        if let ArtifactAction::Types(types_cmd) = &cmd.action {
            let types = engine.artifact_types(&project_type);
            if types_cmd.json {
                println!("{}", serde_json::to_string_pretty(&types)?);
            } else {
                println!("{}", format_artifact_types(&types));
            }
            return Ok(0);
        }
    }

    let event = cli.event().context("Command does not run a pipeline")?;

    if let Event::ArtifactBuild { artifact_type, .. } = &event {
        let types = engine.artifact_types(&project_type);
        if !types.contains_key(artifact_type) {
            let available: Vec<&str> = types.keys().map(String::as_str).collect();
            bail!(
                "Unknown artifact type '{}' for project type '{}'; available: {}",
                artifact_type,
                project_type,
                if available.is_empty() { "none".to_string() } else { available.join(", ") }
            );
        }
    }

    if let Event::Migrate { group } = &event {
        let key = format!("marvin.migrate.{}", group);
        if engine.environment().config.get(&key).is_none() {
            bail!("Unknown migration group '{}'; define it under {}", group, key);
        }
    }

    if cli.dry_run {
        println!("{}", format_plan(&engine.plan(&event)));
        return Ok(0);
    }

    let output = TerminalOutput::new(cli.verbose);
    engine.add_event_handler(move |event| output.on_event(event));

    let hook = match &event {
        Event::GitHook { hook, .. } => Some(*hook),
        _ => None,
    };
    if let Some(hook) = hook {
        eprintln!("BEGIN {}", hook);
    }

    let report = engine.run(&event);

    if let Some(hook) = hook {
        eprintln!("END   {}", hook);
    }

    debug!(
        "{} finished with exit code {} ({} step(s) executed)",
        report.pipeline_name,
        report.exit_code,
        report.executed_steps().len()
    );
    if cli.verbose {
        println!("\n{}", format_report(&report));
    }

    Ok(report.exit_code)
}

fn env_config_command(action: &EnvConfigAction, config: &MarvinConfig) -> Result<i32> {
    let php = match action {
        EnvConfigAction::SettingsPhp(cmd) => {
            let yaml = env_config::read_source(cmd.file.as_deref())
                .context("Failed to read the env config")?;
            let target = cmd
                .target
                .clone()
                .unwrap_or_else(|| config.get_string("marvin.environment", "local"));
            debug!("Exporting env config for target {}", target);

            env_config::settings_php(
                &yaml,
                &target,
                &split_list(&cmd.sites, ','),
                &split_list(&cmd.parents, '.'),
            )?
        }
        EnvConfigAction::SitesPhp(cmd) => {
            let yaml = env_config::read_source(cmd.file.as_deref())
                .context("Failed to read the sites mapping")?;

            env_config::sites_php(
                &yaml,
                cmd.env_var_name_pattern.as_deref(),
                &split_list(&cmd.parents, '.'),
            )?
        }
        EnvConfigAction::AddEntry(cmd) => {
            let entry = match &cmd.entry {
                Some(entry) if !entry.trim().is_empty() => entry.clone(),
                _ => env_config::read_source(None).context("Failed to read the entry")?,
            };
            if entry.trim().is_empty() {
                bail!("Missing entry");
            }

            env_config::settings_php_entry(&entry)?
        }
    };

    print!("{}", php);
    Ok(0)
}
