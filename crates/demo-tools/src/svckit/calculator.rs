//! Math Calculation Tool
//!
//! Character allow-list first, then the explicit evaluator in `crate::math`.
//! Input that passes the allow-list but is still malformed (`1..2`, `(1+2`)
//! comes back as an `Error calculating` string, never as a tool failure.

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

use crate::math;

const ALLOWED_CHARS: &str = "0123456789+-*/.() ";

pub const RESTRICTED_MESSAGE: &str =
    "Error: Only basic math operations are allowed (+, -, *, /)";

/// Whether every character of `expression` is in the allow-list
pub fn is_allowed(expression: &str) -> bool {
    expression.chars().all(|c| ALLOWED_CHARS.contains(c))
}

/// Perform a simple math calculation.
pub fn calculate_math(expression: &str) -> String {
    if !is_allowed(expression) {
        return RESTRICTED_MESSAGE.into();
    }

    match math::evaluate(expression) {
        Ok(value) => format!("Result: {expression} = {value}"),
        Err(e) => {
            tracing::debug!(expression, error = %e, "evaluation failed");
            format!("Error calculating: {e}")
        }
    }
}

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "calculate_math".into(),
            description: "Perform a simple math calculation. Returns the result of the calculation as a string.".into(),
            parameters: vec![ParameterSchema::string(
                "expression",
                "A math expression to evaluate (e.g., \"2 + 2\", \"10 * 5\").",
            )],
            category: Some("math".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let expression = call.string_arg("expression")?;
        let output = calculate_math(expression);

        if output.starts_with("Error") {
            Ok(ToolResult::failure("calculate_math", output))
        } else {
            Ok(ToolResult::success("calculate_math", output))
        }
    }
}
