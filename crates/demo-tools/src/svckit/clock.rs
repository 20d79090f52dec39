//! Time Lookup Tool
//!
//! Reads the local clock. The timezone label is echoed back but not applied.

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

pub const DEFAULT_TIMEZONE: &str = "UTC";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Get the current time, labelled with `timezone`.
pub fn get_time(timezone: &str) -> String {
    get_time_at(timezone, Local::now().naive_local())
}

/// Same as [`get_time`] with an explicit clock reading
pub fn get_time_at(timezone: &str, now: NaiveDateTime) -> String {
    format!(
        "Current time ({timezone}): {} (simulated)",
        now.format(TIME_FORMAT)
    )
}

pub struct TimeTool;

#[async_trait]
impl Tool for TimeTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_time".into(),
            description: "Get the current time in a specified timezone. Returns the current time as a string.".into(),
            parameters: vec![ParameterSchema::optional_string(
                "timezone",
                "The timezone to get time for (default: UTC).",
                DEFAULT_TIMEZONE,
            )],
            category: Some("time".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let timezone = call
            .optional_string_arg("timezone")?
            .unwrap_or(DEFAULT_TIMEZONE);
        Ok(ToolResult::success("get_time", get_time(timezone)))
    }
}
