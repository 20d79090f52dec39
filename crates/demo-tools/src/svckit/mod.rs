//! Service Kit - Agent Tools
//!
//! Each tool is a plain `&str -> String` function plus a thin
//! `agent_core::Tool` adapter that pulls the argument out of the call.

mod calculator;
mod clock;
mod knowledge;
mod weather;

pub use calculator::{CalculatorTool, RESTRICTED_MESSAGE, calculate_math, is_allowed};
pub use clock::{DEFAULT_TIMEZONE, TimeTool, get_time, get_time_at};
pub use knowledge::{KnowledgeSearchTool, search_knowledge};
pub use weather::{WeatherTool, get_weather};
