//! Slash commands, shared by line mode and the TUI

mod exercise;
mod model;

pub use exercise::ExerciseCommand;
pub use model::ModelCommand;

/// Result of parsing a slash command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Show a message to the user (nothing sent to the model)
    Message(String),
    /// Exit the application
    Exit,
    /// Clear the conversation and the running cost
    Clear,
    /// Export the conversation
    Save,
    /// Show the running cost
    ShowCost,
    /// List exercises (line mode) or open the exercise selector (TUI)
    OpenExerciseSelector,
    /// Switch to the named exercise
    SelectExercise(String),
    /// List models (line mode) or open the model selector (TUI)
    OpenModelSelector,
    /// Switch to the named model
    ChangeModel(String),
    /// Answer a pending exercise switch
    ConfirmSwitch { save: bool },
    CancelSwitch,
    /// Unknown command
    Unknown(String),
}

/// Parse a slash command. Returns `None` when `input` is not a command.
pub fn execute_command(
    input: &str,
    models: &[String],
    exercises: &[String],
) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let (command, args) = match rest.split_once(char::is_whitespace) {
        Some((command, args)) => (command.to_lowercase(), args.trim()),
        None => (rest.to_lowercase(), ""),
    };

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "quit" | "exit" | "q" => CommandResult::Exit,

        "clear" | "c" => CommandResult::Clear,

        "save" | "s" => CommandResult::Save,

        "cost" => CommandResult::ShowCost,

        "exercises" | "exercise" | "e" => ExerciseCommand::execute(args, exercises),

        "model" | "m" => ModelCommand::execute(args, models),

        "yes" | "y" => CommandResult::ConfirmSwitch { save: true },

        "no" | "n" => CommandResult::ConfirmSwitch { save: false },

        "cancel" => CommandResult::CancelSwitch,

        _ => CommandResult::Unknown(command),
    })
}

pub fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?           Show this help message
  /exercises, /e          List exercises (opens selector in the TUI)
  /exercise <name>        Switch to an exercise
  /model, /m [name]       List models or switch to a model
  /cost                   Show the running cost of this conversation
  /save, /s               Save the conversation to a text file
  /clear, /c              Clear the conversation and reset the cost
  /quit, /exit, /q        Exit

When switching exercises with a conversation in progress:
  /yes                    Save the conversation, then switch
  /no                     Switch without saving
  /cancel                 Stay on the current exercise"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models() -> Vec<String> {
        vec!["gpt-4o-2024-11-20".into(), "gpt-4o-mini-2024-07-18".into()]
    }

    fn exercises() -> Vec<String> {
        vec!["intro".into(), "week2_immunodeficiency".into()]
    }

    fn run(input: &str) -> Option<CommandResult> {
        execute_command(input, &models(), &exercises())
    }

    #[test]
    fn test_not_a_command() {
        assert_eq!(run("Hello"), None);
        assert_eq!(run("what about /this"), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(run("/quit"), Some(CommandResult::Exit));
        assert_eq!(run("  /CLEAR "), Some(CommandResult::Clear));
        assert_eq!(run("/save"), Some(CommandResult::Save));
        assert_eq!(run("/cost"), Some(CommandResult::ShowCost));
        assert_eq!(run("/yes"), Some(CommandResult::ConfirmSwitch { save: true }));
        assert_eq!(run("/no"), Some(CommandResult::ConfirmSwitch { save: false }));
        assert_eq!(run("/cancel"), Some(CommandResult::CancelSwitch));
        assert!(matches!(run("/help"), Some(CommandResult::Message(_))));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(run("/branch 3"), Some(CommandResult::Unknown("branch".into())));
    }

    #[test]
    fn test_arguments_are_dispatched() {
        assert_eq!(
            run("/exercise week2"),
            Some(CommandResult::SelectExercise("week2_immunodeficiency".into()))
        );
        assert_eq!(run("/exercises"), Some(CommandResult::OpenExerciseSelector));
        assert_eq!(
            run("/model mini"),
            Some(CommandResult::ChangeModel("gpt-4o-mini-2024-07-18".into()))
        );
        assert_eq!(run("/m"), Some(CommandResult::OpenModelSelector));
    }
}
