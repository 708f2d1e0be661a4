//! /exercise command - list and switch exercises

use super::CommandResult;

pub struct ExerciseCommand;

impl ExerciseCommand {
    /// Opens the selector with no args, otherwise switches to the matching exercise
    pub fn execute(args: &str, exercises: &[String]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::OpenExerciseSelector;
        }

        match find_exercise(args, exercises) {
            Some(name) => CommandResult::SelectExercise(name.to_string()),
            None if exercises.is_empty() => {
                CommandResult::Message("No exercises available".to_string())
            }
            None => CommandResult::Message(format!(
                "No exercise found matching '{}'\nUse /exercises to list them",
                args
            )),
        }
    }

    /// List exercises as text (for line mode)
    pub fn list_exercises_text(current: Option<&str>, exercises: &[String]) -> String {
        if exercises.is_empty() {
            return "No exercises available".to_string();
        }

        let mut output = String::from("Exercises:\n");
        for name in exercises {
            let marker = if Some(name.as_str()) == current { " *" } else { "" };
            output.push_str(&format!("  {}{}\n", name, marker));
        }
        output.push_str("\nSwitch with: /exercise <name>");
        output
    }
}

/// Exact match, then the unique exercise starting with `query`
fn find_exercise<'a>(query: &str, exercises: &'a [String]) -> Option<&'a str> {
    if let Some(exact) = exercises.iter().find(|e| e.as_str() == query) {
        return Some(exact.as_str());
    }

    let query_lower = query.to_lowercase();
    let mut matches = exercises
        .iter()
        .filter(|e| e.to_lowercase().starts_with(&query_lower));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.as_str()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercises() -> Vec<String> {
        vec![
            "intro".into(),
            "week2_allergy".into(),
            "week2_immunodeficiency".into(),
        ]
    }

    #[test]
    fn test_find_exercise() {
        let exercises = exercises();
        assert_eq!(find_exercise("intro", &exercises), Some("intro"));
        assert_eq!(find_exercise("week2_i", &exercises), Some("week2_immunodeficiency"));
        assert_eq!(find_exercise("week2", &exercises), None);
        assert_eq!(find_exercise("week3", &exercises), None);
    }

    #[test]
    fn test_empty_catalog_message() {
        assert_eq!(
            ExerciseCommand::execute("intro", &[]),
            CommandResult::Message("No exercises available".into())
        );
        assert_eq!(
            ExerciseCommand::list_exercises_text(None, &[]),
            "No exercises available"
        );
    }

    #[test]
    fn test_list_marks_current() {
        let text = ExerciseCommand::list_exercises_text(Some("intro"), &exercises());
        assert!(text.contains("  intro *\n"));
        assert!(text.contains("  week2_allergy\n"));
    }
}
