//! Session operations shared by the TUI and line mode.
//!
//! Each function applies one user request to the controller and returns the
//! text to show. Failures never end the session.

use std::path::Path;
use tbl_session::{ExerciseSelection, SessionController, SessionError};

use crate::utils::format_cost;

/// Shown when a completion fails, whatever the cause
pub const COMPLETION_FAILED: &str = "Failed to generate response. Please try again.";

/// What to tell the user after an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Info(String),
    Warning(String),
    Error(String),
}

impl Feedback {
    pub fn text(&self) -> &str {
        match self {
            Feedback::Info(text) | Feedback::Warning(text) | Feedback::Error(text) => text,
        }
    }
}

/// Question asked while an exercise switch waits for an answer
pub fn switch_question(requested: &str) -> String {
    format!(
        "You have an ongoing conversation. Would you like to save it before switching to '{}'?",
        requested
    )
}

pub fn select_exercise(controller: &mut SessionController, name: &str) -> Feedback {
    match controller.select_exercise(name) {
        Ok(ExerciseSelection::Loaded(name)) => Feedback::Info(format!("Exercise: {}", name)),
        Ok(ExerciseSelection::ConfirmationRequired { requested, .. }) => {
            Feedback::Warning(switch_question(&requested))
        }
        Ok(ExerciseSelection::Cancelled(current)) => Feedback::Info(format!(
            "Staying on {}",
            current.as_deref().unwrap_or("the current exercise")
        )),
        Err(e) => {
            tracing::warn!(exercise = name, "Could not load exercise: {}", e);
            Feedback::Error(e.to_string())
        }
    }
}

/// Answer a pending switch. The new prompt is checked first, then the export
/// is written, then the transcript is discarded. A failure at any step leaves
/// the session as it was and writes nothing further.
pub fn confirm_switch(controller: &mut SessionController, save: bool, export_dir: &Path) -> Feedback {
    if controller.pending_exercise().is_none() {
        return Feedback::Warning("No exercise change is waiting for an answer.".to_string());
    }
    if let Err(e) = controller.pending_exercise_definition() {
        tracing::warn!("Pending exercise cannot be loaded: {}", e);
        return Feedback::Error(e.to_string());
    }

    let saved = if save {
        match controller.save() {
            Ok(export) => match export.write_to(export_dir) {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::error!("Failed to write export: {}", e);
                    return Feedback::Error(format!("Could not save conversation: {}", e));
                }
            },
            Err(SessionError::NothingToSave) => None,
            Err(e) => return Feedback::Error(e.to_string()),
        }
    } else {
        None
    };

    match controller.confirm_exercise_switch(false) {
        Ok(outcome) => {
            let mut text = format!("Switched to exercise: {}", outcome.exercise);
            if let Some(path) = saved {
                text.push_str(&format!("\nConversation saved to {}", path.display()));
            }
            Feedback::Info(text)
        }
        Err(e) => Feedback::Error(e.to_string()),
    }
}

pub fn cancel_switch(controller: &mut SessionController) -> Feedback {
    match controller.cancel_exercise_switch() {
        Ok(current) => Feedback::Info(format!(
            "Staying on {}",
            current.as_deref().unwrap_or("the current exercise")
        )),
        Err(e) => Feedback::Warning(e.to_string()),
    }
}

pub fn save(controller: &SessionController, export_dir: &Path) -> Feedback {
    match controller.save() {
        Ok(export) => match export.write_to(export_dir) {
            Ok(path) => Feedback::Info(format!("Conversation saved to {}", path.display())),
            Err(e) => {
                tracing::error!("Failed to write export: {}", e);
                Feedback::Error(format!("Could not save conversation: {}", e))
            }
        },
        Err(SessionError::NothingToSave) => {
            Feedback::Warning("No conversation to save yet.".to_string())
        }
        Err(e) => Feedback::Error(e.to_string()),
    }
}

pub fn clear(controller: &mut SessionController) -> Feedback {
    controller.clear();
    Feedback::Info("Conversation cleared.".to_string())
}

pub fn change_model(controller: &mut SessionController, model: &str) -> Feedback {
    match controller.select_model(model) {
        Ok(()) => Feedback::Info(format!("Switched to: {}", model)),
        Err(e) => Feedback::Error(e.to_string()),
    }
}

pub fn show_cost(controller: &SessionController) -> Feedback {
    Feedback::Info(format!(
        "Conversation cost: {}",
        format_cost(controller.accumulated_cost())
    ))
}

/// Shown when the service refuses the configured API key
pub const KEY_REJECTED: &str =
    "The API key was rejected. Check OPENAI_API_KEY or the api_keys section of the config file.";

/// Text for a rejected or failed submission
pub fn submit_error(error: &SessionError) -> Feedback {
    match error {
        SessionError::CompletionFailed(e) if e.is_auth() => Feedback::Error(KEY_REJECTED.to_string()),
        SessionError::CompletionFailed(e) if e.is_retryable() => {
            Feedback::Error(COMPLETION_FAILED.to_string())
        }
        // Resubmitting will not help (quota, bad request)
        SessionError::CompletionFailed(e) => {
            Feedback::Error(format!("Failed to generate response: {}", e))
        }
        SessionError::NoExerciseSelected => {
            Feedback::Warning("Select an exercise before sending a message.".to_string())
        }
        SessionError::ConfirmationPending => {
            Feedback::Warning("Answer the exercise switch question first.".to_string())
        }
        other => Feedback::Warning(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tbl_ai::{CompletionClient, CompletionResult, Message};
    use tbl_session::{ExerciseCatalog, SessionConfig};

    struct EchoClient;

    #[async_trait::async_trait]
    impl CompletionClient for EchoClient {
        async fn complete(
            &self,
            conversation: &[Message],
            _model: &str,
        ) -> tbl_ai::Result<CompletionResult> {
            let last = conversation.last().map(|m| m.content()).unwrap_or_default();
            Ok(CompletionResult::new(format!("echo: {}", last), 10, 5))
        }
    }

    fn setup() -> (tempfile::TempDir, SessionController) {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join("prompts");
        std::fs::create_dir(&prompts).unwrap();
        std::fs::write(prompts.join("intro.txt"), "intro prompt").unwrap();
        std::fs::write(prompts.join("week2.txt"), "week2 prompt").unwrap();
        let controller = SessionController::new(
            ExerciseCatalog::new(prompts),
            Arc::new(EchoClient),
            SessionConfig::default(),
        );
        (dir, controller)
    }

    #[test]
    fn test_save_empty_warns() {
        let (dir, controller) = setup();
        assert_eq!(
            save(&controller, dir.path()),
            Feedback::Warning("No conversation to save yet.".into())
        );
    }

    #[tokio::test]
    async fn test_confirm_with_save_writes_then_switches() {
        let (dir, mut controller) = setup();
        select_exercise(&mut controller, "intro");
        controller.submit("Hello").await.unwrap();

        let feedback = select_exercise(&mut controller, "week2");
        assert_eq!(feedback, Feedback::Warning(switch_question("week2")));

        let exports = dir.path().join("exports");
        let feedback = confirm_switch(&mut controller, true, &exports);
        assert!(matches!(feedback, Feedback::Info(ref t) if t.contains("Conversation saved to")));
        assert_eq!(controller.current_exercise(), Some("week2"));
        assert!(controller.transcript().is_empty());

        let written: Vec<_> = std::fs::read_dir(&exports).unwrap().collect();
        assert_eq!(written.len(), 1);
    }

    #[tokio::test]
    async fn test_confirm_keeps_transcript_when_export_fails() {
        let (dir, mut controller) = setup();
        select_exercise(&mut controller, "intro");
        controller.submit("Hello").await.unwrap();
        select_exercise(&mut controller, "week2");

        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();
        let feedback = confirm_switch(&mut controller, true, &blocker);

        assert!(matches!(feedback, Feedback::Error(_)));
        assert_eq!(controller.current_exercise(), Some("intro"));
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.pending_exercise(), Some("week2"));
    }

    #[tokio::test]
    async fn test_confirm_writes_nothing_when_prompt_vanished() {
        let (dir, mut controller) = setup();
        select_exercise(&mut controller, "intro");
        controller.submit("Hello").await.unwrap();
        select_exercise(&mut controller, "week2");
        std::fs::remove_file(dir.path().join("prompts").join("week2.txt")).unwrap();

        let exports = dir.path().join("exports");
        for _ in 0..2 {
            let feedback = confirm_switch(&mut controller, true, &exports);
            assert!(matches!(feedback, Feedback::Error(ref t) if t.contains("week2")));
        }

        assert!(!exports.exists());
        assert_eq!(controller.current_exercise(), Some("intro"));
        assert_eq!(controller.transcript().len(), 2);
        assert_eq!(controller.pending_exercise(), Some("week2"));
    }

    #[tokio::test]
    async fn test_cancel_and_cost() {
        let (_dir, mut controller) = setup();
        select_exercise(&mut controller, "intro");
        controller.submit("Hello").await.unwrap();
        select_exercise(&mut controller, "week2");

        assert_eq!(cancel_switch(&mut controller), Feedback::Info("Staying on intro".into()));
        assert_eq!(show_cost(&controller), Feedback::Info("Conversation cost: $0.00000".into()));
    }

    #[test]
    fn test_missing_exercise_is_error() {
        let (_dir, mut controller) = setup();
        assert!(matches!(
            select_exercise(&mut controller, "week9"),
            Feedback::Error(_)
        ));
    }

    #[test]
    fn test_submit_error_text() {
        let failed = SessionError::CompletionFailed(tbl_ai::Error::api("server_error", "boom"));
        assert_eq!(submit_error(&failed).text(), COMPLETION_FAILED);

        let timed_out = SessionError::CompletionFailed(tbl_ai::Error::Timeout(
            std::time::Duration::from_secs(120),
        ));
        assert_eq!(submit_error(&timed_out).text(), COMPLETION_FAILED);

        let bad_key = SessionError::CompletionFailed(tbl_ai::Error::InvalidApiKey);
        assert_eq!(submit_error(&bad_key), Feedback::Error(KEY_REJECTED.into()));

        let quota = SessionError::CompletionFailed(tbl_ai::Error::api(
            "insufficient_quota",
            "You exceeded your current quota",
        ));
        assert!(matches!(
            submit_error(&quota),
            Feedback::Error(ref t) if t.contains("exceeded your current quota")
        ));

        assert!(matches!(
            submit_error(&SessionError::NoExerciseSelected),
            Feedback::Warning(_)
        ));
    }
}
