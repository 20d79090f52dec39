//! Error types for the research crew

use std::path::PathBuf;

use thiserror::Error;

use agent_core::AgentError;

/// Result type alias for crew operations
pub type Result<T> = std::result::Result<T, CrewError>;

#[derive(Error, Debug)]
pub enum CrewError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing required template variable '{0}'")]
    MissingInput(String),

    #[error("Task '{task}' is assigned to unknown agent '{agent}'")]
    UnknownAgent { task: String, agent: String },

    #[error("Task '{0}' is not part of this crew")]
    UnknownTask(String),

    #[error("No previous run found at {}", .0.display())]
    NoRunLog(PathBuf),

    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CrewError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            CrewError::MissingInput("topic".into()).to_string(),
            "Missing required template variable 'topic'"
        );
        assert_eq!(
            CrewError::UnknownAgent {
                task: "research_task".into(),
                agent: "ghost".into()
            }
            .to_string(),
            "Task 'research_task' is assigned to unknown agent 'ghost'"
        );
    }

    #[test]
    fn test_agent_error_converts() {
        let err: CrewError = AgentError::MaxIterations(3).into();
        assert!(matches!(err, CrewError::Agent(AgentError::MaxIterations(3))));
    }
}
