//! Content migration groups
//!
//! A group lives under `marvin.migrate.<group>` in the configuration:
//!
//! ```yaml
//! marvin:
//!   migrate:
//!     default:
//!       module: {migrate_tools: true, app_dc: true}
//!       group: {app_default_content: true}
//!       tag: {}
//! ```
//!
//! Modules the import needs are enabled first and everything the run enabled
//! is uninstalled afterwards.

use super::{Collaborator, Environment};
use crate::core::{Event, PipelineContext, StepRegistry};
use crate::tasks::exec::capture;
use crate::tasks::{report, ExecTask, PathArg, TaskError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CTX_ENABLED_MODULES: &str = "enabledModules";
pub const CTX_MODULES_TO_ENABLE: &str = "modulesToEnable";

/// Filters passed on to `drush migrate:import`
const IMPORT_FILTERS: [&str; 2] = ["group", "tag"];

pub struct MigrateCollaborator;

impl Collaborator for MigrateCollaborator {
    fn name(&self) -> &str {
        "migrate"
    }

    fn on_event(&self, event: &Event, env: &Environment) -> StepRegistry {
        let Event::Migrate { group } = event else {
            return StepRegistry::new();
        };

        let drush = Drush {
            executable: env.setting("drushExecutable", "vendor/bin/drush"),
            project_root: env.project_root.clone(),
        };
        let settings = env.config.get(&format!("marvin.migrate.{}", group)).unwrap_or(Value::Null);
        let modules = enabled_keys(settings.get("module"));

        let collect = {
            let drush = drush.clone();
            move |ctx: &mut PipelineContext| {
                report("collectModulesToEnable", collect_modules_to_enable(ctx, &drush, &modules))
            }
        };

        let enable = {
            let drush = drush.clone();
            move |ctx: &mut PipelineContext| {
                let modules = ctx.get_string_list(CTX_MODULES_TO_ENABLE).unwrap_or_default();
                if modules.is_empty() {
                    debug!("There is no module to enable");
                    return 0;
                }
                report("pm:enable", drush.command("pm:enable").args(modules).arg("--yes").execute(ctx))
            }
        };

        let uninstall = {
            let drush = drush.clone();
            move |ctx: &mut PipelineContext| report("pm:uninstall", uninstall_modules(ctx, &drush))
        };

        let mut registry = StepRegistry::new();
        registry.register("marvin.migrate.collectModulesToEnable", 100, collect);
        registry.register("marvin.migrate.enableModules", 200, enable);

        let options = import_options(&settings);
        if options.is_empty() {
            registry.register("marvin.migrate.import", 300, |_: &mut PipelineContext| {
                debug!("drush migrate:import is skipped, there are no group or tag filters");
                0
            });
        } else {
            registry.register("marvin.migrate.import", 300, drush.command("migrate:import").args(options));
        }

        registry.register("marvin.migrate.uninstallModules", 400, uninstall);
        registry
    }
}

/// Invokes drush in the project root
#[derive(Debug, Clone)]
struct Drush {
    executable: String,
    project_root: PathBuf,
}

impl Drush {
    fn command(&self, name: &str) -> ExecTask {
        ExecTask::new(self.executable.as_str())
            .arg(name)
            .current_dir(PathArg::fixed(&self.project_root))
    }

    fn enabled_modules(&self) -> Result<Vec<String>, TaskError> {
        let stdout = capture(
            &self.executable,
            ["pm:list", "--status=enabled", "--format=json"],
            Path::new(&self.project_root),
        )?;
        parse_module_list(&stdout)
    }
}

/// Keys switched on in a `name: true` mapping
pub fn enabled_keys(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Object(map)) => map
            .iter()
            .filter(|(_, enabled)| enabled.as_bool() == Some(true))
            .map(|(name, _)| name.clone())
            .collect(),
        _ => Vec::new(),
    }
}

/// `--group=a,b` and `--tag=c` from the group settings
pub fn import_options(settings: &Value) -> Vec<String> {
    IMPORT_FILTERS
        .iter()
        .filter_map(|filter| {
            let values = enabled_keys(settings.get(*filter));
            (!values.is_empty()).then(|| format!("--{}={}", filter, values.join(",")))
        })
        .collect()
}

/// Module names from `drush pm:list --format=json` output
pub fn parse_module_list(json: &str) -> Result<Vec<String>, TaskError> {
    match serde_json::from_str::<Value>(json) {
        Ok(Value::Object(map)) => Ok(map.keys().cloned().collect()),
        Ok(Value::Array(list)) if list.is_empty() => Ok(Vec::new()),
        Ok(other) => Err(TaskError::Failed(format!("Unexpected module list: {}", other))),
        Err(e) => Err(TaskError::Failed(format!("Unreadable module list: {}", e))),
    }
}

/// Items of `wanted` that are not in `present`, in `wanted` order
pub fn missing_from(wanted: &[String], present: &[String]) -> Vec<String> {
    wanted
        .iter()
        .filter(|name| !present.contains(name))
        .cloned()
        .collect()
}

fn collect_modules_to_enable(
    ctx: &mut PipelineContext,
    drush: &Drush,
    modules: &[String],
) -> Result<(), TaskError> {
    let enabled = drush.enabled_modules()?;
    let to_enable = missing_from(modules, &enabled);
    debug!("Modules to enable ({}): {}", to_enable.len(), to_enable.join(", "));

    ctx.set(CTX_ENABLED_MODULES, enabled);
    ctx.set(CTX_MODULES_TO_ENABLE, to_enable);
    Ok(())
}

fn uninstall_modules(ctx: &mut PipelineContext, drush: &Drush) -> Result<(), TaskError> {
    let enabled_before = ctx
        .get_string_list(CTX_ENABLED_MODULES)
        .ok_or_else(|| TaskError::MissingContext(CTX_ENABLED_MODULES.to_string()))?;
    let to_uninstall = missing_from(&drush.enabled_modules()?, &enabled_before);
    if to_uninstall.is_empty() {
        debug!("There is no module to uninstall");
        return Ok(());
    }

    drush.command("pm:uninstall").args(to_uninstall).arg("--yes").execute(ctx)
}
