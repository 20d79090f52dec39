//! Sequential Crew
//!
//! ```text
//! ┌────────────┐   ┌──────────────────────┐   ┌───────────────────┐
//! │ researcher │──▶│ military strategy    │──▶│ reporting analyst │──▶ report.md
//! └────────────┘   │ analyst              │   └───────────────────┘
//!                  └──────────────────────┘
//! ```
//!
//! Each task sees the outputs of every task before it. Nothing is retried:
//! the first failing task ends the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use agent_core::{AgentBuilder, LlmProvider};

use crate::config::{AgentRole, CrewConfig, CrewSettings};
use crate::error::{CrewError, Result};
use crate::interpolate::{interpolate, render_value};
use crate::CrewInputs;

pub const CREW_NAME: &str = "research_crew";

/// Task execution order for the research crew
pub const TASK_ORDER: &[&str] = &["research_task", "military_analysis_task", "reporting_task"];

/// Input key for an external payload; it is shown to the first task that runs
pub const TRIGGER_PAYLOAD_KEY: &str = "trigger_payload";

const CONTEXT_DIVIDER: &str = "\n\n----------\n\n";

const EVALUATOR_PROMPT: &str = "You are an impartial quality evaluator. \
You grade how well a task output meets its expected criteria.";

/// Output of a single task
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Task key, e.g. `research_task`
    pub task: String,

    /// Role that produced the output
    pub agent: String,

    /// Description after interpolation
    pub description: String,

    pub raw: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<PathBuf>,

    pub timestamp: i64,
    pub duration_ms: u64,
}

/// Result of a full (or replayed) run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrewOutput {
    /// Output of the last task
    pub raw: String,
    pub tasks: Vec<TaskOutput>,
}

impl CrewOutput {
    fn from_tasks(tasks: Vec<TaskOutput>) -> Self {
        let raw = tasks.last().map(|t| t.raw.clone()).unwrap_or_default();
        Self { raw, tasks }
    }

    pub fn task(&self, name: &str) -> Option<&TaskOutput> {
        self.tasks.iter().find(|t| t.task == name)
    }
}

/// Record of the last run, used by `replay`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLog {
    pub crew: String,
    pub inputs: CrewInputs,
    pub tasks: Vec<TaskOutput>,
    pub finished_at: DateTime<Utc>,
}

impl RunLog {
    pub async fn load(path: &Path) -> Result<Self> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CrewError::NoRunLog(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        write_file(path, &serde_json::to_string_pretty(self)?).await
    }
}

/// One training iteration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingIteration {
    pub iteration: u32,
    pub tasks: Vec<TaskOutput>,
}

/// Everything `train` writes to its output file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingRecord {
    pub crew: String,
    pub inputs: CrewInputs,
    pub iterations: Vec<TrainingIteration>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskScore {
    pub task: String,
    pub score: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunScores {
    pub run: u32,
    pub scores: Vec<TaskScore>,
}

/// Scores from `test`, one entry per run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub eval_llm: String,
    pub runs: Vec<RunScores>,
}

impl TestReport {
    /// Mean score per task, in task order
    pub fn task_averages(&self) -> Vec<(String, f64)> {
        let Some(first) = self.runs.first() else {
            return Vec::new();
        };

        first
            .scores
            .iter()
            .map(|s| {
                let scores: Vec<f64> = self
                    .runs
                    .iter()
                    .flat_map(|r| r.scores.iter())
                    .filter(|other| other.task == s.task)
                    .map(|other| other.score)
                    .collect();
                (s.task.clone(), mean(&scores))
            })
            .collect()
    }

    /// Mean over every score in every run
    pub fn overall_average(&self) -> Option<f64> {
        let scores: Vec<f64> = self
            .runs
            .iter()
            .flat_map(|r| r.scores.iter().map(|s| s.score))
            .collect();
        (!scores.is_empty()).then(|| mean(&scores))
    }
}

impl std::fmt::Display for TestReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Task scores (1-10), evaluated by {}", self.eval_llm)?;
        for (task, avg) in self.task_averages() {
            writeln!(f, "  {task:<28} {avg:>5.1}")?;
        }
        if let Some(overall) = self.overall_average() {
            write!(f, "  {:<28} {overall:>5.1}", "crew")?;
        }
        Ok(())
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Operations the entry points drive
#[async_trait]
pub trait CrewRunner: Send + Sync {
    fn name(&self) -> &str;

    /// Run every task in order
    async fn kickoff(&self, inputs: CrewInputs) -> Result<CrewOutput>;

    /// Run `n_iterations` kickoffs and write their outputs to `filename`
    async fn train(
        &self,
        n_iterations: u32,
        filename: &Path,
        inputs: CrewInputs,
    ) -> Result<TrainingRecord>;

    /// Re-run from `task_id` using the outputs of earlier tasks from the last run
    async fn replay(&self, task_id: &str) -> Result<CrewOutput>;

    /// Run `n_iterations` kickoffs and score every task with `eval_llm`
    async fn test(&self, n_iterations: u32, eval_llm: &str, inputs: CrewInputs)
    -> Result<TestReport>;
}

/// A task with all placeholders filled in
#[derive(Clone, Debug)]
struct RenderedTask {
    name: String,
    agent: String,
    role: AgentRole,
    description: String,
    expected_output: String,
    output_file: Option<PathBuf>,
}

pub struct Crew {
    name: String,
    provider: Arc<dyn LlmProvider>,
    config: CrewConfig,
    settings: CrewSettings,
    order: Vec<String>,
}

impl Crew {
    /// Build a crew running `order`; fails if the config does not cover it
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LlmProvider>,
        config: CrewConfig,
        settings: CrewSettings,
        order: Vec<String>,
    ) -> Result<Self> {
        config.validate(&order)?;
        Ok(Self {
            name: name.into(),
            provider,
            config,
            settings,
            order,
        })
    }

    /// Researcher, strategy analyst and reporting analyst, with config
    /// loaded from `settings`
    pub fn research(provider: Arc<dyn LlmProvider>, settings: CrewSettings) -> Result<Self> {
        let config = settings.crew_config()?;
        let order = TASK_ORDER.iter().map(ToString::to_string).collect();
        Self::new(CREW_NAME, provider, config, settings, order)
    }

    pub fn tasks(&self) -> &[String] {
        &self.order
    }

    pub const fn settings(&self) -> &CrewSettings {
        &self.settings
    }

    /// Interpolate every task up front so a missing input fails before any
    /// model call
    fn render(&self, inputs: &CrewInputs) -> Result<Vec<RenderedTask>> {
        self.order
            .iter()
            .map(|name| -> Result<RenderedTask> {
                let task = self
                    .config
                    .tasks
                    .get(name)
                    .ok_or_else(|| CrewError::UnknownTask(name.clone()))?;
                let role = self.config.agents.get(&task.agent).ok_or_else(|| {
                    CrewError::UnknownAgent {
                        task: name.clone(),
                        agent: task.agent.clone(),
                    }
                })?;

                Ok(RenderedTask {
                    name: name.clone(),
                    agent: task.agent.clone(),
                    role: AgentRole {
                        role: fill(&role.role, inputs)?,
                        goal: fill(&role.goal, inputs)?,
                        backstory: fill(&role.backstory, inputs)?,
                    },
                    description: fill(&task.description, inputs)?,
                    expected_output: fill(&task.expected_output, inputs)?,
                    output_file: task.output_file.clone(),
                })
            })
            .collect()
    }

    /// Run `plan[start..]`, seeding the context with `prior`
    async fn execute(
        &self,
        plan: &[RenderedTask],
        start: usize,
        prior: Vec<TaskOutput>,
        inputs: &CrewInputs,
    ) -> Result<Vec<TaskOutput>> {
        let mut outputs = prior;
        let mut trigger = inputs.get(TRIGGER_PAYLOAD_KEY).map(render_value);

        for task in &plan[start..] {
            let span = tracing::info_span!("task", task = %task.name, agent = %task.agent);
            let prompt = task_prompt(task, &outputs, trigger.take().as_deref());
            let output = self.run_task(task, &prompt).instrument(span).await?;
            outputs.push(output);
        }

        Ok(outputs)
    }

    async fn run_task(&self, task: &RenderedTask, prompt: &str) -> Result<TaskOutput> {
        let started = Instant::now();
        let timestamp = Utc::now().timestamp();

        let agent = AgentBuilder::new()
            .provider(Arc::clone(&self.provider))
            .name(&task.agent)
            .system_prompt(system_prompt(&task.role))
            .model(&self.settings.model)
            .build()?;

        let raw = agent.ask(prompt).await?;

        let output_file = match &task.output_file {
            Some(file) => {
                let path = self.settings.output_path(file);
                write_file(&path, &raw).await?;
                tracing::info!(path = %path.display(), "task output written");
                Some(path)
            }
            None => None,
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        tracing::info!(duration_ms, chars = raw.len(), "task complete");

        Ok(TaskOutput {
            task: task.name.clone(),
            agent: task.role.role.clone(),
            description: task.description.clone(),
            raw,
            output_file,
            timestamp,
            duration_ms,
        })
    }

    async fn save_log(&self, inputs: CrewInputs, tasks: &[TaskOutput]) -> Result<()> {
        let log = RunLog {
            crew: self.name.clone(),
            inputs,
            tasks: tasks.to_vec(),
            finished_at: Utc::now(),
        };
        log.save(&self.settings.run_log).await?;
        tracing::debug!(path = %self.settings.run_log.display(), "run log saved");
        Ok(())
    }

    async fn score(&self, eval_llm: &str, task: &RenderedTask, output: &TaskOutput) -> Result<f64> {
        let evaluator = AgentBuilder::new()
            .provider(Arc::clone(&self.provider))
            .name("evaluator")
            .system_prompt(EVALUATOR_PROMPT)
            .model(eval_llm)
            .temperature(0.0)
            .build()?;

        let prompt = format!(
            "Task: {}\n\nExpected output: {}\n\nActual output:\n{}\n\n\
             Score the actual output from 1 to 10. Reply with the number only.",
            task.description, task.expected_output, output.raw
        );

        let reply = evaluator.ask(&prompt).await?;
        parse_score(&reply).ok_or_else(|| {
            CrewError::Evaluation(format!(
                "no score in evaluator reply for '{}': {reply}",
                task.name
            ))
        })
    }
}

#[async_trait]
impl CrewRunner for Crew {
    fn name(&self) -> &str {
        &self.name
    }

    async fn kickoff(&self, inputs: CrewInputs) -> Result<CrewOutput> {
        let span = tracing::info_span!("crew_kickoff", crew = %self.name, tasks = self.order.len());

        async {
            let plan = self.render(&inputs)?;
            tracing::info!("crew started");

            let tasks = self.execute(&plan, 0, Vec::new(), &inputs).await?;
            self.save_log(inputs, &tasks).await?;

            tracing::info!("crew finished");
            Ok::<_, CrewError>(CrewOutput::from_tasks(tasks))
        }
        .instrument(span)
        .await
    }

    async fn train(
        &self,
        n_iterations: u32,
        filename: &Path,
        inputs: CrewInputs,
    ) -> Result<TrainingRecord> {
        if n_iterations == 0 {
            return Err(CrewError::config("n_iterations must be greater than zero"));
        }

        let mut iterations = Vec::new();
        for iteration in 1..=n_iterations {
            tracing::info!(iteration, n_iterations, "training iteration");
            let output = self.kickoff(inputs.clone()).await?;
            iterations.push(TrainingIteration {
                iteration,
                tasks: output.tasks,
            });
        }

        let record = TrainingRecord {
            crew: self.name.clone(),
            inputs,
            iterations,
        };
        write_file(filename, &serde_json::to_string_pretty(&record)?).await?;
        tracing::info!(path = %filename.display(), "training data written");

        Ok(record)
    }

    async fn replay(&self, task_id: &str) -> Result<CrewOutput> {
        let start = self
            .order
            .iter()
            .position(|name| name == task_id)
            .ok_or_else(|| CrewError::UnknownTask(task_id.to_string()))?;

        let log = RunLog::load(&self.settings.run_log).await?;
        if log.tasks.len() < start {
            return Err(CrewError::config(format!(
                "last run stopped before '{task_id}'; run the crew first"
            )));
        }

        let span = tracing::info_span!("crew_replay", crew = %self.name, task = task_id);

        async {
            let plan = self.render(&log.inputs)?;
            let prior = log.tasks[..start].to_vec();

            let tasks = self.execute(&plan, start, prior, &log.inputs).await?;
            self.save_log(log.inputs.clone(), &tasks).await?;

            Ok::<_, CrewError>(CrewOutput::from_tasks(tasks))
        }
        .instrument(span)
        .await
    }

    async fn test(
        &self,
        n_iterations: u32,
        eval_llm: &str,
        inputs: CrewInputs,
    ) -> Result<TestReport> {
        if n_iterations == 0 {
            return Err(CrewError::config("n_iterations must be greater than zero"));
        }

        let plan = self.render(&inputs)?;
        let mut runs = Vec::new();

        for run in 1..=n_iterations {
            let output = self.kickoff(inputs.clone()).await?;

            let mut scores = Vec::new();
            for (task, task_output) in plan.iter().zip(&output.tasks) {
                let score = self.score(eval_llm, task, task_output).await?;
                tracing::info!(run, task = %task.name, score, "task scored");
                scores.push(TaskScore {
                    task: task.name.clone(),
                    score,
                });
            }

            runs.push(RunScores { run, scores });
        }

        Ok(TestReport {
            eval_llm: eval_llm.to_string(),
            runs,
        })
    }
}

/// Interpolate and drop the trailing newline folded YAML scalars carry
fn fill(template: &str, inputs: &CrewInputs) -> Result<String> {
    Ok(interpolate(template, inputs)?.trim().to_string())
}

pub fn system_prompt(role: &AgentRole) -> String {
    format!(
        "You are {}. {}\nYour personal goal is: {}",
        role.role, role.backstory, role.goal
    )
}

fn task_prompt(task: &RenderedTask, context: &[TaskOutput], trigger: Option<&str>) -> String {
    let mut prompt = format!("Current Task: {}", task.description);

    if let Some(payload) = trigger {
        prompt.push_str("\n\nTrigger Payload: ");
        prompt.push_str(payload);
    }

    prompt.push_str(&format!(
        "\n\nThis is the expected criteria for your final answer: {}\n\
         you MUST return the actual complete content as the final answer, not a summary.",
        task.expected_output
    ));

    if !context.is_empty() {
        let joined = context
            .iter()
            .map(|t| t.raw.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_DIVIDER);
        prompt.push_str("\n\nThis is the context you're working with:\n");
        prompt.push_str(&joined);
    }

    prompt
}

/// First number in `reply`, clamped to 1..=10
pub fn parse_score(reply: &str) -> Option<f64> {
    let start = reply.find(|c: char| c.is_ascii_digit())?;
    let digits: String = reply[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    digits
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .map(|score| score.clamp(1.0, 10.0))
}

async fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, contents).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{MockProvider, Role};
    use serde_json::json;
    use tempfile::TempDir;

    fn topic(value: &str) -> CrewInputs {
        let mut inputs = CrewInputs::new();
        inputs.insert("topic".into(), json!(value));
        inputs
    }

    fn settings(dir: &TempDir) -> CrewSettings {
        CrewSettings {
            report_dir: dir.path().to_path_buf(),
            run_log: dir.path().join(".crew").join("last_run.json"),
            ..CrewSettings::default()
        }
    }

    fn crew(provider: &Arc<MockProvider>, dir: &TempDir) -> Crew {
        Crew::research(provider.clone(), settings(dir)).unwrap()
    }

    #[tokio::test]
    async fn test_kickoff_runs_tasks_in_order_with_context() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["facts", "analysis", "# Report"]));
        let crew = crew(&provider, &dir);

        let output = crew.kickoff(topic("World war 1")).await.unwrap();
        assert_eq!(output.raw, "# Report");
        assert_eq!(
            output.tasks.iter().map(|t| t.task.as_str()).collect::<Vec<_>>(),
            TASK_ORDER
        );

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 3);

        let system = &requests[0][0];
        assert_eq!(system.role, Role::System);
        assert!(system.content.starts_with("You are World war 1 Senior Historical Researcher. "));
        assert!(system.content.contains("\nYour personal goal is: "));

        let first = &requests[0][1].content;
        assert!(first.starts_with("Current Task: Conduct thorough research about World war 1."));
        assert!(!first.contains("context you're working with"));

        assert!(requests[1][1].content.ends_with("context you're working with:\nfacts"));
        assert!(
            requests[2][1]
                .content
                .ends_with("context you're working with:\nfacts\n\n----------\n\nanalysis")
        );

        assert!(
            provider
                .requested_models()
                .await
                .iter()
                .all(|m| m == "openai/gpt-4o-mini")
        );
    }

    #[tokio::test]
    async fn test_kickoff_writes_report_and_run_log() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["facts", "analysis", "# Report"]));
        let crew = crew(&provider, &dir);

        let output = crew.kickoff(topic("World war 1")).await.unwrap();

        let report = dir.path().join("report.md");
        assert_eq!(std::fs::read_to_string(&report).unwrap(), "# Report");
        assert_eq!(output.task("reporting_task").unwrap().output_file, Some(report));
        assert!(output.task("research_task").unwrap().output_file.is_none());

        let log = RunLog::load(&crew.settings().run_log).await.unwrap();
        assert_eq!(log.crew, CREW_NAME);
        assert_eq!(log.inputs, topic("World war 1"));
        assert_eq!(log.tasks, output.tasks);
    }

    #[tokio::test]
    async fn test_missing_input_fails_before_any_model_call() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["unused"]));
        let crew = crew(&provider, &dir);

        let err = crew.kickoff(CrewInputs::new()).await.unwrap_err();
        assert!(matches!(err, CrewError::MissingInput(ref k) if k == "topic"));
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["facts"]));
        let crew = crew(&provider, &dir);

        let err = crew.kickoff(topic("World war 1")).await.unwrap_err();
        assert!(matches!(err, CrewError::Agent(_)));
        assert_eq!(provider.requests().await.len(), 2);
        assert!(!dir.path().join("report.md").exists());
        assert!(!crew.settings().run_log.exists());
    }

    #[tokio::test]
    async fn test_replay_reuses_earlier_outputs() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["facts", "analysis", "report"]));
        let crew = crew(&provider, &dir);
        crew.kickoff(topic("World war 1")).await.unwrap();

        provider.push_reply("analysis v2").await;
        provider.push_reply("report v2").await;

        let output = crew.replay("military_analysis_task").await.unwrap();
        let raws: Vec<_> = output.tasks.iter().map(|t| t.raw.as_str()).collect();
        assert_eq!(raws, vec!["facts", "analysis v2", "report v2"]);

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 5);
        assert!(requests[3][1].content.ends_with("context you're working with:\nfacts"));
        assert!(requests[3][0].content.contains("World war 1"));

        let report = std::fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert_eq!(report, "report v2");

        let log = RunLog::load(&crew.settings().run_log).await.unwrap();
        assert_eq!(log.tasks[1].raw, "analysis v2");
    }

    #[tokio::test]
    async fn test_replay_errors() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new());
        let crew = crew(&provider, &dir);

        assert!(matches!(
            crew.replay("research_task").await,
            Err(CrewError::NoRunLog(_))
        ));
        assert!(matches!(
            crew.replay("dance_task").await,
            Err(CrewError::UnknownTask(ref t)) if t == "dance_task"
        ));
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_trigger_payload_reaches_first_task() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["facts", "analysis", "report"]));
        let crew = crew(&provider, &dir);

        crate::entry::run_with_trigger(&crew, Some(r#"{"subject":"Battle of Verdun"}"#))
            .await
            .unwrap();

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 3);
        assert!(
            requests[0][1]
                .content
                .contains(r#"Trigger Payload: {"subject":"Battle of Verdun"}"#)
        );
        assert!(!requests[1][1].content.contains("Trigger Payload"));
        assert!(!requests[2][1].content.contains("Trigger Payload"));

        provider.push_reply("report v2").await;
        crew.replay("reporting_task").await.unwrap();

        let replayed = &provider.requests().await[3][1].content;
        assert!(replayed.contains("Trigger Payload: "));
        assert!(replayed.contains("Verdun"));
    }

    #[tokio::test]
    async fn test_train_writes_every_iteration() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["a1", "b1", "c1", "a2", "b2", "c2"]));
        let crew = crew(&provider, &dir);
        let file = dir.path().join("training").join("data.json");

        let record = crew.train(2, &file, topic("AI LLMs")).await.unwrap();
        assert_eq!(record.iterations.len(), 2);
        assert_eq!(record.iterations[1].tasks[2].raw, "c2");

        let saved: TrainingRecord =
            serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
        assert_eq!(saved, record);
    }

    #[tokio::test]
    async fn test_zero_iterations_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::new());
        let crew = crew(&provider, &dir);

        let file = dir.path().join("data.json");
        assert!(matches!(
            crew.train(0, &file, topic("x")).await,
            Err(CrewError::Config(_))
        ));
        assert!(!file.exists());
        assert!(matches!(
            crew.test(0, "gpt-4o", topic("x")).await,
            Err(CrewError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_scores_each_task_with_eval_model() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted([
            "facts",
            "analysis",
            "report",
            "8",
            "Score: 6/10",
            "10",
        ]));
        let crew = crew(&provider, &dir);

        let report = crew.test(1, "openai/gpt-4o", topic("World war 1")).await.unwrap();
        assert_eq!(
            report.task_averages(),
            vec![
                ("research_task".to_string(), 8.0),
                ("military_analysis_task".to_string(), 6.0),
                ("reporting_task".to_string(), 10.0),
            ]
        );
        assert_eq!(report.overall_average(), Some(8.0));

        let models = provider.requested_models().await;
        assert_eq!(&models[3..], ["openai/gpt-4o"; 3]);

        let requests = provider.requests().await;
        assert!(requests[3][1].content.contains("Actual output:\nfacts"));
    }

    #[tokio::test]
    async fn test_unscorable_reply_is_an_evaluation_error() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(MockProvider::scripted(["a", "b", "c", "excellent work"]));
        let crew = crew(&provider, &dir);

        let err = crew.test(1, "openai/gpt-4o", topic("x")).await.unwrap_err();
        assert!(matches!(err, CrewError::Evaluation(_)));
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("7"), Some(7.0));
        assert_eq!(parse_score("I'd give it 8.5."), Some(8.5));
        assert_eq!(parse_score("42"), Some(10.0));
        assert_eq!(parse_score("0"), Some(1.0));
        assert_eq!(parse_score("no number"), None);
    }

    #[test]
    fn test_report_averages_across_runs() {
        let run = |run, a, b| RunScores {
            run,
            scores: vec![
                TaskScore { task: "t1".into(), score: a },
                TaskScore { task: "t2".into(), score: b },
            ],
        };
        let report = TestReport {
            eval_llm: "m".into(),
            runs: vec![run(1, 4.0, 9.0), run(2, 6.0, 7.0)],
        };

        assert_eq!(
            report.task_averages(),
            vec![("t1".to_string(), 5.0), ("t2".to_string(), 8.0)]
        );
        assert_eq!(report.overall_average(), Some(6.5));
        assert!(report.to_string().contains("evaluated by m"));

        let empty = TestReport { eval_llm: "m".into(), runs: vec![] };
        assert!(empty.task_averages().is_empty());
        assert_eq!(empty.overall_average(), None);
    }

    #[test]
    fn test_unknown_agent_rejected_at_construction() {
        let mut config = CrewConfig::embedded().unwrap();
        config.tasks.get_mut("reporting_task").unwrap().agent = "editor".into();

        let result = Crew::new(
            CREW_NAME,
            Arc::new(MockProvider::new()),
            config,
            CrewSettings::default(),
            TASK_ORDER.iter().map(ToString::to_string).collect(),
        );
        assert!(matches!(result, Err(CrewError::UnknownAgent { .. })));
    }
}
