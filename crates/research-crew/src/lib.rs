//! # research-crew
//!
//! A fixed three-role crew run strictly in sequence: a researcher, a
//! military strategy analyst and a reporting analyst. The last task writes
//! `report.md`.
//!
//! ```text
//! entry::run ─▶ Crew::kickoff ─▶ research_task ─▶ military_analysis_task ─▶ reporting_task
//!                                      │                    │                      │
//!                                      └──── context ───────┴──── context ─────────┘
//! ```
//!
//! Role and task text comes from YAML with `{placeholder}` interpolation;
//! the model is reached through any [`agent_core::LlmProvider`].

pub mod config;
pub mod crew;
pub mod entry;
pub mod error;
pub mod interpolate;

pub use config::{AgentRole, CrewConfig, CrewSettings, TaskDefinition};
pub use crew::{
    CREW_NAME, Crew, CrewOutput, CrewRunner, RunLog, TASK_ORDER, TaskOutput, TestReport,
    TrainingRecord,
};
pub use entry::EntryError;
pub use error::{CrewError, Result};

/// Named inputs for placeholder interpolation
pub type CrewInputs = serde_json::Map<String, serde_json::Value>;
