//! Crew configuration
//!
//! Role and task text lives in YAML (`agents.yaml`, `tasks.yaml`). Defaults
//! are compiled in; files in `CREW_CONFIG_DIR` are merged on top, key by
//! key, so an override file only needs the fields it changes.
//!
//! Runtime settings come from the environment:
//!
//! | Variable          | Default                 |
//! |-------------------|-------------------------|
//! | `MODEL`           | `openai/gpt-4o-mini`    |
//! | `CREW_REPORT_DIR` | `.`                     |
//! | `CREW_RUN_LOG`    | `.crew/last_run.json`   |
//! | `CREW_CONFIG_DIR` | unset                   |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::error::{CrewError, Result};

const EMBEDDED_AGENTS: &str = include_str!("../config/agents.yaml");
const EMBEDDED_TASKS: &str = include_str!("../config/tasks.yaml");

pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Trace-export credentials checked for presence
pub const TRACING_CREDENTIALS: &[&str] = &[
    "LANGFUSE_SECRET_KEY",
    "LANGFUSE_PUBLIC_KEY",
    "LANGFUSE_BASE_URL",
];

/// One role in the crew
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRole {
    pub role: String,
    pub goal: String,
    pub backstory: String,
}

/// One unit of work, assigned to a role by key
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub description: String,
    pub expected_output: String,
    pub agent: String,

    /// Relative paths resolve against the report directory
    #[serde(default)]
    pub output_file: Option<PathBuf>,
}

/// Roles and tasks keyed by name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrewConfig {
    pub agents: BTreeMap<String, AgentRole>,
    pub tasks: BTreeMap<String, TaskDefinition>,
}

impl CrewConfig {
    /// The compiled-in defaults
    pub fn embedded() -> Result<Self> {
        Self::load(None)
    }

    /// Defaults merged with `agents.yaml` / `tasks.yaml` from `dir`, if given.
    /// Missing override files are ignored.
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let mut agents = Figment::from(Yaml::string(EMBEDDED_AGENTS));
        let mut tasks = Figment::from(Yaml::string(EMBEDDED_TASKS));

        if let Some(dir) = dir {
            tracing::debug!(dir = %dir.display(), "merging crew config overrides");
            agents = agents.merge(Yaml::file(dir.join("agents.yaml")));
            tasks = tasks.merge(Yaml::file(dir.join("tasks.yaml")));
        }

        Ok(Self {
            agents: agents
                .extract()
                .map_err(|e| CrewError::config(format!("Failed to load agents.yaml: {e}")))?,
            tasks: tasks
                .extract()
                .map_err(|e| CrewError::config(format!("Failed to load tasks.yaml: {e}")))?,
        })
    }

    /// Check that `order` is non-empty, every task exists, and every task
    /// names a configured agent.
    pub fn validate(&self, order: &[String]) -> Result<()> {
        if order.is_empty() {
            return Err(CrewError::config("crew has no tasks"));
        }

        for name in order {
            let task = self
                .tasks
                .get(name)
                .ok_or_else(|| CrewError::config(format!("task '{name}' is not configured")))?;

            if !self.agents.contains_key(&task.agent) {
                return Err(CrewError::UnknownAgent {
                    task: name.clone(),
                    agent: task.agent.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Runtime settings for a crew run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewSettings {
    /// Model used by every role
    pub model: String,

    /// Base directory for task output files
    pub report_dir: PathBuf,

    /// Where the last run is recorded for `replay`
    pub run_log: PathBuf,

    #[serde(default)]
    pub config_dir: Option<PathBuf>,
}

impl Default for CrewSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            report_dir: PathBuf::from("."),
            run_log: PathBuf::from(".crew/last_run.json"),
            config_dir: None,
        }
    }
}

impl CrewSettings {
    /// Defaults, then `MODEL`, then `CREW_*` variables
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Env::raw().only(&["MODEL"]))
            .merge(Env::prefixed("CREW_"))
    }

    pub fn from_env() -> Result<Self> {
        Self::figment()
            .extract()
            .map_err(|e| CrewError::config(format!("Failed to load crew settings: {e}")))
    }

    /// Load the role/task config this run points at
    pub fn crew_config(&self) -> Result<CrewConfig> {
        CrewConfig::load(self.config_dir.as_deref())
    }

    /// Output path for a task, resolved against `report_dir`
    pub fn output_path(&self, file: &Path) -> PathBuf {
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.report_dir.join(file)
        }
    }
}

/// Names from `vars` whose lookup is missing or blank
pub fn missing_vars<'a, F>(vars: &[&'a str], lookup: F) -> Vec<&'a str>
where
    F: Fn(&str) -> Option<String>,
{
    vars.iter()
        .copied()
        .filter(|name| lookup(name).is_none_or(|v| v.trim().is_empty()))
        .collect()
}
