//! Entry points
//!
//! Each wraps one `CrewRunner` operation with fixed inputs and turns any
//! failure into an error naming the operation.

use std::path::Path;

use chrono::{Datelike, Local};
use serde_json::Value;
use thiserror::Error;
use tracing::Instrument;

use crate::crew::{CrewOutput, CrewRunner, TestReport, TrainingRecord};
use crate::error::CrewError;
use crate::CrewInputs;

pub const RUN_TOPIC: &str = "World war 1";
pub const TRAIN_TOPIC: &str = "AI LLMs";

pub use crate::crew::TRIGGER_PAYLOAD_KEY;

#[derive(Error, Debug)]
pub enum EntryError {
    #[error("An error occurred while running the crew: {0}")]
    Run(#[source] CrewError),

    #[error("An error occurred while training the crew: {0}")]
    Train(#[source] CrewError),

    #[error("An error occurred while replaying the crew: {0}")]
    Replay(#[source] CrewError),

    #[error("An error occurred while testing the crew: {0}")]
    Test(#[source] CrewError),

    #[error("An error occurred while running the crew with trigger: {0}")]
    Trigger(#[source] CrewError),

    #[error("No trigger payload provided. Please provide JSON payload as argument.")]
    MissingPayload,

    #[error("Invalid JSON payload provided as argument")]
    InvalidPayload(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EntryError>;

fn current_year() -> String {
    Local::now().year().to_string()
}

fn inputs<const N: usize>(pairs: [(&str, Value); N]) -> CrewInputs {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

pub fn run_inputs() -> CrewInputs {
    inputs([("topic", RUN_TOPIC.into())])
}

pub fn train_inputs() -> CrewInputs {
    inputs([("topic", TRAIN_TOPIC.into()), ("current_year", current_year().into())])
}

pub fn test_inputs() -> CrewInputs {
    inputs([("topic", RUN_TOPIC.into()), ("current_year", current_year().into())])
}

/// Parse `payload` and build trigger inputs. `topic` and `current_year` are
/// blank so role and task templates still interpolate.
pub fn trigger_inputs(payload: Option<&str>) -> Result<CrewInputs> {
    let raw = payload.ok_or(EntryError::MissingPayload)?;
    let payload: Value = serde_json::from_str(raw).map_err(EntryError::InvalidPayload)?;

    Ok(inputs([
        (TRIGGER_PAYLOAD_KEY, payload),
        ("topic", "".into()),
        ("current_year", "".into()),
    ]))
}

/// Run the crew on the default topic
pub async fn run(crew: &dyn CrewRunner) -> Result<CrewOutput> {
    let span = tracing::info_span!("crew_run", crew = crew.name(), topic = RUN_TOPIC);

    let output = crew
        .kickoff(run_inputs())
        .instrument(span)
        .await
        .map_err(EntryError::Run)?;

    tracing::info!(crew = crew.name(), tasks = output.tasks.len(), "run complete");
    Ok(output)
}

pub async fn train(
    crew: &dyn CrewRunner,
    n_iterations: u32,
    filename: &Path,
) -> Result<TrainingRecord> {
    crew.train(n_iterations, filename, train_inputs())
        .await
        .map_err(EntryError::Train)
}

pub async fn replay(crew: &dyn CrewRunner, task_id: &str) -> Result<CrewOutput> {
    crew.replay(task_id).await.map_err(EntryError::Replay)
}

pub async fn test(crew: &dyn CrewRunner, n_iterations: u32, eval_llm: &str) -> Result<TestReport> {
    crew.test(n_iterations, eval_llm, test_inputs())
        .await
        .map_err(EntryError::Test)
}

/// Payload errors are reported before the crew is touched
pub async fn run_with_trigger(crew: &dyn CrewRunner, payload: Option<&str>) -> Result<CrewOutput> {
    let inputs = trigger_inputs(payload)?;
    crew.kickoff(inputs).await.map_err(EntryError::Trigger)
}
