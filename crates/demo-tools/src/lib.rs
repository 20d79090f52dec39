//! # demo-tools
//!
//! Dummy tools for the demo assistant: weather, math, time and a tiny
//! knowledge base.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  "What's 12 * 7 and is it raining in Tokyo?"                 │
//! ├──────────────────────────────────────────────────────────────┤
//! │  calculate_math("12 * 7")  → Result: 12 * 7 = 84             │
//! │  get_weather("Tokyo")      → Weather in Tokyo: Rainy, 68°F…  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every tool takes one string and returns one string. None of them fail:
//! bad input becomes a descriptive string the model can read.

pub mod error;
pub mod math;
pub mod svckit;

use agent_core::ToolRegistry;

pub use error::{EvalError, Result};
pub use svckit::{calculate_math, get_time, get_weather, search_knowledge};

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{CalculatorTool, KnowledgeSearchTool, TimeTool, WeatherTool};
}

pub const ASSISTANT_NAME: &str = "demo_assistant";

pub const ASSISTANT_DESCRIPTION: &str =
    "A helpful assistant with weather, math, time, and knowledge tools.";

/// System prompt for the demo assistant
pub const ASSISTANT_INSTRUCTION: &str = r#"You are a helpful AI assistant.

You have access to the following tools:
1. get_weather - Get weather information for any city
2. calculate_math - Perform math calculations
3. get_time - Get the current time in any timezone
4. search_knowledge - Search for information about various topics

When a user asks a question:
- Use the appropriate tool to help them
- Be friendly and informative
- If you're not sure which tool to use, ask for clarification

When you need a tool, respond with only a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg": "value"}}
```

Always provide clear and helpful responses!"#;

/// Registry holding the four demo tools in prompt order
pub fn registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(tools::WeatherTool);
    registry.register(tools::CalculatorTool);
    registry.register(tools::TimeTool);
    registry.register(tools::KnowledgeSearchTool);
    registry
}
