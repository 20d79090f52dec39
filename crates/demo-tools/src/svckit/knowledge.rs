//! Knowledge Search Tool

use async_trait::async_trait;

use agent_core::{
    Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema, tool::ParameterSchema,
};

/// Key phrase → description. Order matters: the first key found in the
/// query wins.
const KNOWLEDGE: &[(&str, &str)] = &[
    (
        "python",
        "Python is a high-level, interpreted programming language known for its simplicity and readability.",
    ),
    (
        "ai",
        "Artificial Intelligence (AI) is the simulation of human intelligence by machines.",
    ),
    (
        "machine learning",
        "Machine Learning is a subset of AI that enables systems to learn from data.",
    ),
    (
        "google adk",
        "Google ADK (Agent Development Kit) is an open-source framework for building AI agents.",
    ),
    (
        "crewai",
        "CrewAI is a framework for orchestrating role-playing autonomous AI agents.",
    ),
];

const TOPICS: &str = "Python, AI, Machine Learning, Google ADK, or CrewAI";

/// Search the knowledge base for information.
pub fn search_knowledge(query: &str) -> String {
    let needle = query.to_lowercase();

    KNOWLEDGE
        .iter()
        .find(|(key, _)| needle.contains(key))
        .map_or_else(
            || format!("No specific information found for '{query}'. Try asking about: {TOPICS}."),
            |(_, description)| format!("Found: {description}"),
        )
}

pub struct KnowledgeSearchTool;

#[async_trait]
impl Tool for KnowledgeSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "search_knowledge".into(),
            description: "Search a knowledge base for information. Returns relevant information from the knowledge base.".into(),
            parameters: vec![ParameterSchema::string("query", "The search query.")],
            category: Some("lookup".into()),
            has_side_effects: false,
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let query = call.string_arg("query")?;
        Ok(ToolResult::success("search_knowledge", search_knowledge(query)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substring_match() {
        assert_eq!(
            search_knowledge("tell me about ai"),
            "Found: Artificial Intelligence (AI) is the simulation of human intelligence by machines."
        );
        assert_eq!(
            search_knowledge("What is PYTHON?"),
            "Found: Python is a high-level, interpreted programming language known for its simplicity and readability."
        );
    }

    #[test]
    fn test_first_key_in_table_order_wins() {
        // "crewai" contains "ai", so the AI entry shadows the CrewAI one
        assert!(search_knowledge("google adk").starts_with("Found: Google ADK"));
        assert!(search_knowledge("machine learning and python").starts_with("Found: Python"));
        assert!(search_knowledge("crewai").starts_with("Found: Artificial Intelligence"));
    }

    #[test]
    fn test_not_found_lists_topics() {
        assert_eq!(
            search_knowledge("Rust Lang"),
            "No specific information found for 'Rust Lang'. Try asking about: Python, AI, Machine Learning, Google ADK, or CrewAI."
        );
    }
}
