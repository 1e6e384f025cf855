//! System prompt template for the agent.

use chrono::NaiveDate;
use minijinja::{context, Environment};
use serde::Serialize;

use crate::config::ToolsetMode;
use crate::tools::ToolRegistry;

const TEMPLATE_NAME: &str = "research_system";
const TEMPLATE_SOURCE: &str = include_str!("prompts/research_system.j2");

#[derive(Serialize)]
struct PromptTool {
    name: String,
    description: String,
}

/// Compiled system prompt, rendered fresh for every run so the date is current.
pub struct SystemPrompt {
    env: Environment<'static>,
    mode: ToolsetMode,
}

impl SystemPrompt {
    /// Compile the bundled template.
    pub fn new(mode: ToolsetMode) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
        Ok(Self { env, mode })
    }

    pub fn render(&self, today: NaiveDate, tools: &ToolRegistry) -> Result<String, minijinja::Error> {
        let tools: Vec<PromptTool> = tools
            .list_tools()
            .into_iter()
            .map(|t| PromptTool {
                name: t.name,
                description: t.description,
            })
            .collect();

        self.env.get_template(TEMPLATE_NAME)?.render(context! {
            today => format_date(today),
            tools => tools,
            native => self.mode == ToolsetMode::Native,
        })
    }
}

/// Long-form date, e.g. "Sunday, October 18, 2026".
pub fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %d, %Y").to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tools::testing::RecordingProvider;

    fn tools(mode: ToolsetMode) -> ToolRegistry {
        ToolRegistry::research(Arc::new(RecordingProvider::default()), mode, 5)
    }

    #[test]
    fn date_uses_long_form() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(format_date(date), "Sunday, October 18, 2026");
    }

    #[test]
    fn prompt_embeds_date_and_every_tool() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let prompt = SystemPrompt::new(ToolsetMode::Direct)
            .unwrap()
            .render(date, &tools(ToolsetMode::Direct))
            .unwrap();

        assert!(prompt.contains("**Today's Date:** Friday, March 07, 2025"));
        for name in ["web_search", "crawl_website", "extract_content"] {
            assert!(prompt.contains(&format!("**{}**", name)), "missing {}", name);
        }
        assert!(prompt.contains("separated by commas"));
        assert!(!prompt.contains("max_depth"));
    }

    #[test]
    fn native_prompt_describes_list_arguments() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        let prompt = SystemPrompt::new(ToolsetMode::Native)
            .unwrap()
            .render(date, &tools(ToolsetMode::Native))
            .unwrap();
        assert!(prompt.contains("as a JSON list"));
        assert!(prompt.contains("max_depth"));
    }
}
