//! /model command - list and switch models

use super::CommandResult;
use crate::utils::format_rates;
use tbl_ai::CostRateTable;

pub struct ModelCommand;

impl ModelCommand {
    /// Opens the selector with no args, otherwise switches to the matching model
    pub fn execute(args: &str, models: &[String]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::OpenModelSelector;
        }

        match find_model(args, models) {
            Some(model) => CommandResult::ChangeModel(model.to_string()),
            None => CommandResult::Message(format!(
                "No model found matching '{}'\nUse /model to list available models",
                args
            )),
        }
    }

    /// List models as text (for line mode)
    pub fn list_models_text(current: &str, models: &[String], rates: &CostRateTable) -> String {
        if models.is_empty() {
            return "No models available".to_string();
        }

        let mut output = String::from("Available models:\n");
        for model in models {
            let marker = if model == current { " *" } else { "" };
            let pricing = rates
                .get(model)
                .map(format_rates)
                .unwrap_or_else(|| "no rates configured".to_string());
            output.push_str(&format!("  {}{}  ({})\n", model, marker, pricing));
        }
        output.push_str("\nSwitch with: /model <name>");
        output
    }
}

/// Exact (case-insensitive) match first, then the first id containing `query`
fn find_model<'a>(query: &str, models: &'a [String]) -> Option<&'a str> {
    let query_lower = query.to_lowercase();

    models
        .iter()
        .find(|m| m.to_lowercase() == query_lower)
        .or_else(|| models.iter().find(|m| m.to_lowercase().contains(&query_lower)))
        .map(String::as_str)
}
