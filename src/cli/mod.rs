//! Command-line interface

pub mod commands;
pub mod output;
pub mod terminal_output;

use crate::core::config::LoadOptions;
use crate::core::Event;
use clap::{Parser, Subcommand};
use commands::{
    parse_define, ArtifactAction, ArtifactCommand, ComposerCommand, EnvConfigCommand, GitHookCommand,
    GitHooksAction, GitHooksCommand, MigrateCommand, OnboardingCommand, TestAction, TestCommand,
};
use std::ffi::OsString;
use std::path::PathBuf;

/// Drupal project lifecycle tasks as weighted step pipelines
#[derive(Debug, Parser, Clone)]
#[command(name = "marvin")]
#[command(version)]
#[command(about = "Drupal project lifecycle tasks as weighted step pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Extra configuration file, applied over marvin.yml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Configuration override (key=value), repeatable
    #[arg(short = 'D', long = "define", global = true, value_parser = parse_define)]
    pub defines: Vec<String>,

    /// Project root directory
    #[arg(long, global = true, default_value = ".")]
    pub project_root: PathBuf,

    /// Print the assembled pipeline instead of running it
    #[arg(long, global = true)]
    pub dry_run: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Release artifacts
    Artifact(ArtifactCommand),

    /// Prepare a freshly cloned project for local development
    Onboarding(OnboardingCommand),

    /// Composer script callbacks
    Composer(ComposerCommand),

    /// Run the pipeline of a Git hook
    #[command(hide = true)]
    GitHook(GitHookCommand),

    /// Git hook management
    GitHooks(GitHooksCommand),

    /// Run the linters
    Lint,

    /// Build the frontend assets
    Build,

    /// Run tests
    Test(TestCommand),

    /// Import the content of a migration group
    Migrate(MigrateCommand),

    /// Generate environment specific PHP configuration
    EnvConfig(EnvConfigCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }

    /// The pipeline event of the command, if it runs one
    pub fn event(&self) -> Option<Event> {
        match &self.command {
            Command::Artifact(cmd) => match &cmd.action {
                ArtifactAction::Build(build) => Some(build.event()),
                ArtifactAction::Types(_) => None,
            },
            Command::Onboarding(cmd) => Some(Event::Onboarding { url: cmd.url.clone() }),
            Command::Composer(cmd) => Some(cmd.action.event()),
            Command::GitHook(cmd) => Some(cmd.event()),
            Command::GitHooks(cmd) => match cmd.action {
                GitHooksAction::Deploy => Some(Event::GitHooksDeploy),
            },
            Command::Lint => Some(Event::Lint),
            Command::Build => Some(Event::Build),
            Command::Test(cmd) => match cmd.action {
                TestAction::Unit => Some(Event::TestUnit),
                TestAction::Behat => Some(Event::TestBehat),
            },
            Command::Migrate(cmd) => Some(Event::Migrate {
                group: cmd.group.clone(),
            }),
            Command::EnvConfig(_) => None,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            project_root: self.project_root.clone(),
            config_file: self.config.clone(),
            defines: self.defines.clone(),
            include_user_config: true,
        }
    }
}
