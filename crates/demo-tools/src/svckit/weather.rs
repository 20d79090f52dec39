//! Weather Lookup Tool
//!
//! Canned conditions for a handful of cities; everything else gets a mild
//! simulated forecast.

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

/// City (lowercase) → conditions
const WEATHER: &[(&str, &str)] = &[
    ("new york", "Sunny, 72°F (22°C)"),
    ("london", "Cloudy, 59°F (15°C)"),
    ("tokyo", "Rainy, 68°F (20°C)"),
    ("paris", "Partly cloudy, 65°F (18°C)"),
    ("sydney", "Clear, 77°F (25°C)"),
];

const FALLBACK: &str = "Mild, 70°F (21°C) - (simulated data)";

/// Get the current weather for a city.
///
/// Matching ignores case; the reply echoes the city as given.
pub fn get_weather(city: &str) -> String {
    let key = city.to_lowercase();
    let conditions = WEATHER
        .iter()
        .find(|(name, _)| *name == key)
        .map_or(FALLBACK, |(_, conditions)| *conditions);

    format!("Weather in {city}: {conditions}")
}

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_weather".into(),
            description: "Get the current weather for a city. Returns a string describing the weather conditions.".into(),
            parameters: vec![ParameterSchema::string(
                "city",
                "The name of the city to get weather for.",
            )],
            category: Some("lookup".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let city = call.string_arg("city")?;
        Ok(ToolResult::success("get_weather", get_weather(city)))
    }
}
