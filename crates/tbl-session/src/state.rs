//! Session state: transcript, running cost and exercise selection.

use chrono::{DateTime, Utc};
use tbl_ai::Message;
use uuid::Uuid;

/// Everything one user session knows. Only the controller mutates it.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Identifies the session in logs
    pub id: Uuid,
    /// Conversation turns (user/assistant), oldest first
    pub transcript: Vec<Message>,
    /// Dollars spent on completions since the last reset
    pub accumulated_cost: f64,
    /// Exercise whose prompt is loaded
    pub current_exercise: Option<String>,
    /// System prompt of the current exercise
    pub system_prompt: Option<String>,
    /// Exercise the user asked to switch to, awaiting confirmation
    pub pending_exercise_change: Option<String>,
    pub awaiting_confirmation: bool,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Fresh session: empty transcript, zero cost, no exercise
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            transcript: Vec::new(),
            accumulated_cost: 0.0,
            current_exercise: None,
            system_prompt: None,
            pending_exercise_change: None,
            awaiting_confirmation: false,
            created_at: now,
            last_update: now,
        }
    }

    /// The conversation as sent to the completion service: the system
    /// message (when an exercise is loaded) followed by every turn.
    pub fn conversation(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(self.transcript.len() + 1);
        if let Some(ref prompt) = self.system_prompt {
            messages.push(Message::system(prompt.clone()));
        }
        messages.extend(self.transcript.iter().cloned());
        messages
    }

    pub fn push(&mut self, message: Message) {
        self.transcript.push(message);
        self.touch();
    }

    pub fn add_cost(&mut self, cost: f64) {
        self.accumulated_cost += cost.max(0.0);
        self.touch();
    }

    /// Drop the transcript and zero the running cost
    pub fn reset_conversation(&mut self) {
        self.transcript.clear();
        self.accumulated_cost = 0.0;
        self.touch();
    }

    /// Install a new exercise prompt
    pub fn set_exercise(&mut self, name: impl Into<String>, system_prompt: impl Into<String>) {
        self.current_exercise = Some(name.into());
        self.system_prompt = Some(system_prompt.into());
        self.touch();
    }

    pub fn begin_confirmation(&mut self, pending: impl Into<String>) {
        self.pending_exercise_change = Some(pending.into());
        self.awaiting_confirmation = true;
        self.touch();
    }

    /// Forget any pending exercise change, returning it
    pub fn end_confirmation(&mut self) -> Option<String> {
        self.awaiting_confirmation = false;
        self.touch();
        self.pending_exercise_change.take()
    }

    fn touch(&mut self) {
        self.last_update = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tbl_ai::Role;

    #[test]
    fn test_new_session_is_empty() {
        let state = SessionState::new();
        assert!(state.transcript.is_empty());
        assert_eq!(state.accumulated_cost, 0.0);
        assert!(state.current_exercise.is_none());
        assert!(!state.awaiting_confirmation);
        assert!(state.conversation().is_empty());
    }

    #[test]
    fn test_conversation_prepends_system_prompt() {
        let mut state = SessionState::new();
        state.set_exercise("intro", "intro prompt");
        state.push(Message::user("Hello"));

        let conversation = state.conversation();
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[0], Message::system("intro prompt"));
        assert_eq!(conversation[1].role(), Role::User);
        assert_eq!(state.transcript.len(), 1);
    }

    #[test]
    fn test_reset_keeps_exercise() {
        let mut state = SessionState::new();
        state.set_exercise("intro", "intro prompt");
        state.push(Message::user("Hello"));
        state.add_cost(0.25);

        state.reset_conversation();
        assert!(state.transcript.is_empty());
        assert_eq!(state.accumulated_cost, 0.0);
        assert_eq!(state.current_exercise.as_deref(), Some("intro"));
    }

    #[test]
    fn test_confirmation_round_trip() {
        let mut state = SessionState::new();
        state.begin_confirmation("week2");
        assert!(state.awaiting_confirmation);
        assert_eq!(state.end_confirmation().as_deref(), Some("week2"));
        assert!(!state.awaiting_confirmation);
        assert!(state.pending_exercise_change.is_none());
    }
}
