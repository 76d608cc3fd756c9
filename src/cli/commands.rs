//! CLI command definitions

use crate::core::{Event, GitHook};
use clap::{Args, Subcommand};
use std::path::PathBuf;

/// Artifact commands
#[derive(Debug, Args, Clone)]
pub struct ArtifactCommand {
    #[command(subcommand)]
    pub action: ArtifactAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ArtifactAction {
    /// Build a release artifact
    Build(ArtifactBuildCommand),

    /// List the artifact types available for this project
    Types(ArtifactTypesCommand),
}

#[derive(Debug, Args, Clone)]
pub struct ArtifactBuildCommand {
    /// Artifact type, see `artifact types`
    pub artifact_type: String,

    /// Version part to bump (major, minor, patch, pre-release, meta-data) or an exact version
    #[arg(long, default_value = "minor")]
    pub version_bump: String,
}

#[derive(Debug, Args, Clone)]
pub struct ArtifactTypesCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Prepare a freshly cloned project for local development
#[derive(Debug, Args, Clone)]
pub struct OnboardingCommand {
    /// Base URL of the local site
    #[arg(long)]
    pub url: Option<String>,
}

/// Composer script callbacks
#[derive(Debug, Args, Clone)]
pub struct ComposerCommand {
    #[command(subcommand)]
    pub action: ComposerAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ComposerAction {
    /// post-install-cmd
    PostInstall(ComposerScriptCommand),

    /// post-update-cmd
    PostUpdate(ComposerScriptCommand),
}

#[derive(Debug, Args, Clone)]
pub struct ComposerScriptCommand {
    /// Composer ran without dev packages
    #[arg(long)]
    pub no_dev: bool,
}

/// Entry point of the deployed git hook scripts
#[derive(Debug, Args, Clone)]
pub struct GitHookCommand {
    /// Hook name
    #[arg(value_parser = parse_git_hook)]
    pub hook: GitHook,

    /// Arguments git passed to the hook
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Debug, Args, Clone)]
pub struct GitHooksCommand {
    #[command(subcommand)]
    pub action: GitHooksAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum GitHooksAction {
    /// Install the hook scripts into .git/hooks
    Deploy,
}

#[derive(Debug, Args, Clone)]
pub struct TestCommand {
    #[command(subcommand)]
    pub action: TestAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum TestAction {
    /// Run the PHPUnit suite
    Unit,

    /// Run every Behat suite
    Behat,
}

/// Import the content of a migration group
#[derive(Debug, Args, Clone)]
pub struct MigrateCommand {
    /// Group name, defined under marvin.migrate.<group>
    pub group: String,
}

/// settings.php and sites.php generators
#[derive(Debug, Args, Clone)]
pub struct EnvConfigCommand {
    #[command(subcommand)]
    pub action: EnvConfigAction,
}

#[derive(Debug, Subcommand, Clone)]
pub enum EnvConfigAction {
    /// Print config overrides for settings.php
    SettingsPhp(SettingsPhpCommand),

    /// Print a sites.php built from a name => directory mapping
    SitesPhp(SitesPhpCommand),

    /// Print one settings.php assignment from a YAML `{key: [...], value: ...}` entry
    AddEntry(AddEntryCommand),
}

#[derive(Debug, Args, Clone)]
pub struct AddEntryCommand {
    /// YAML encoded entry, stdin when omitted
    pub entry: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct SettingsPhpCommand {
    /// YAML file to read, stdin when omitted
    pub file: Option<PathBuf>,

    /// Environment to export, defaults to marvin.environment
    #[arg(long)]
    pub target: Option<String>,

    /// Comma separated list of sites
    #[arg(long, default_value = "default")]
    pub sites: String,

    /// Dotted path of the item list inside the document
    #[arg(long, default_value = "")]
    pub parents: String,
}

#[derive(Debug, Args, Clone)]
pub struct SitesPhpCommand {
    /// YAML file to read, stdin when omitted
    pub file: Option<PathBuf>,

    /// Env var name pattern with `{{ original }}` or `{{ upper }}` placeholders
    #[arg(long)]
    pub env_var_name_pattern: Option<String>,

    /// Dotted path of the mapping inside the document
    #[arg(long, default_value = "")]
    pub parents: String,
}

/// Validate a `--define key=value` argument
pub fn parse_define(s: &str) -> Result<String, String> {
    match s.split_once('=') {
        Some((key, _)) if !key.trim().is_empty() => Ok(s.to_string()),
        _ => Err(format!("Invalid key=value pair: {}", s)),
    }
}

pub fn parse_git_hook(s: &str) -> Result<GitHook, String> {
    s.parse()
}

impl ArtifactBuildCommand {
    pub fn event(&self) -> Event {
        Event::ArtifactBuild {
            artifact_type: self.artifact_type.clone(),
            version_bump: self.version_bump.clone(),
        }
    }
}

impl ComposerAction {
    pub fn event(&self) -> Event {
        match self {
            ComposerAction::PostInstall(cmd) => Event::ComposerPostInstall { dev_mode: !cmd.no_dev },
            ComposerAction::PostUpdate(cmd) => Event::ComposerPostUpdate { dev_mode: !cmd.no_dev },
        }
    }
}

impl GitHookCommand {
    pub fn event(&self) -> Event {
        Event::GitHook {
            hook: self.hook,
            args: self.args.clone(),
        }
    }
}
