//! Session controller: applies UI events to the session state.
//!
//! The controller owns one [`SessionState`] and is the only thing that
//! mutates it. Every operation runs to completion before the next event is
//! handled; [`SessionController::submit`] holds `&mut self` across its single
//! await point, so a second submission cannot start while one is outstanding.

use std::sync::Arc;
use std::time::Duration;

use tbl_ai::{CompletionClient, CompletionResult, CostRateTable, Message, Usage};

use crate::catalog::{ExerciseCatalog, ExerciseDefinition};
use crate::error::{Result, SessionError};
use crate::export::ConversationExport;
use crate::state::SessionState;

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "gpt-4o-mini-2024-07-18";

/// Upper bound on a single completion request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Where the session is in its interaction cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingExerciseConfirmation,
    AwaitingCompletion,
}

/// Controller settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Model used for completions
    pub model: String,
    /// Models the user may pick from, in display order
    pub models: Vec<String>,
    /// Rates used to price each completion
    pub rates: CostRateTable,
    /// Bound on a single completion request (None waits indefinitely)
    pub request_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            models: vec![
                "gpt-4o-2024-11-20".to_string(),
                "gpt-4o-mini-2024-07-18".to_string(),
            ],
            rates: CostRateTable::builtin(),
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Result of asking for a different exercise
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExerciseSelection {
    /// The prompt was loaded and the exercise is now current
    Loaded(String),
    /// The transcript is not empty; the user must choose save, discard or cancel
    ConfirmationRequired {
        current: Option<String>,
        requested: String,
    },
    /// The pending change was withdrawn by re-selecting the current exercise
    Cancelled(Option<String>),
}

/// Result of a confirmed exercise switch
#[derive(Debug, Clone)]
pub struct SwitchOutcome {
    /// Exercise that is now current
    pub exercise: String,
    /// Export of the discarded transcript, when the user asked to save it
    pub export: Option<ConversationExport>,
}

/// Result of a successful turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    pub usage: Usage,
    /// Dollar cost of this turn
    pub cost: f64,
}

/// Drives one user session
pub struct SessionController {
    state: SessionState,
    phase: Phase,
    catalog: ExerciseCatalog,
    client: Arc<dyn CompletionClient>,
    config: SessionConfig,
}

impl SessionController {
    /// Create a controller with an empty session
    pub fn new(
        catalog: ExerciseCatalog,
        client: Arc<dyn CompletionClient>,
        mut config: SessionConfig,
    ) -> Self {
        if !config.models.contains(&config.model) {
            config.models.push(config.model.clone());
        }

        let state = SessionState::new();
        tracing::debug!(session = %state.id, model = %config.model, "Session started");

        Self {
            state,
            phase: Phase::Idle,
            catalog,
            client,
            config,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transcript(&self) -> &[Message] {
        &self.state.transcript
    }

    pub fn accumulated_cost(&self) -> f64 {
        self.state.accumulated_cost
    }

    pub fn current_exercise(&self) -> Option<&str> {
        self.state.current_exercise.as_deref()
    }

    pub fn pending_exercise(&self) -> Option<&str> {
        self.state.pending_exercise_change.as_deref()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn models(&self) -> &[String] {
        &self.config.models
    }

    pub fn rates(&self) -> &CostRateTable {
        &self.config.rates
    }

    pub fn catalog(&self) -> &ExerciseCatalog {
        &self.catalog
    }

    /// Exercise names available for selection
    pub fn list_exercises(&self) -> Vec<String> {
        self.catalog.list_exercises()
    }

    /// Whether a message would be accepted right now
    pub fn can_submit(&self) -> bool {
        self.phase == Phase::Idle && self.state.system_prompt.is_some()
    }

    /// Handle a change of the exercise selector
    pub fn select_exercise(&mut self, name: &str) -> Result<ExerciseSelection> {
        let is_current = self.current_exercise() == Some(name);

        if self.phase == Phase::AwaitingExerciseConfirmation {
            if is_current {
                let current = self.cancel_exercise_switch()?;
                return Ok(ExerciseSelection::Cancelled(current));
            }
            self.catalog.load(name)?;
            self.state.begin_confirmation(name);
            return Ok(ExerciseSelection::ConfirmationRequired {
                current: self.state.current_exercise.clone(),
                requested: name.to_string(),
            });
        }

        if !self.state.transcript.is_empty() && !is_current {
            // Never ask about a switch that cannot happen
            self.catalog.load(name)?;
            tracing::info!(
                session = %self.state.id,
                from = ?self.state.current_exercise,
                to = name,
                "Exercise change requested with conversation in progress"
            );
            self.state.begin_confirmation(name);
            self.phase = Phase::AwaitingExerciseConfirmation;
            return Ok(ExerciseSelection::ConfirmationRequired {
                current: self.state.current_exercise.clone(),
                requested: name.to_string(),
            });
        }

        let exercise = self.catalog.load(name)?;
        self.state.set_exercise(&exercise.name, exercise.system_prompt);
        tracing::info!(session = %self.state.id, exercise = %exercise.name, "Exercise loaded");
        Ok(ExerciseSelection::Loaded(exercise.name))
    }

    /// Switch to the pending exercise, optionally exporting the old transcript.
    ///
    /// The new prompt is loaded before anything is discarded; if that fails
    /// the confirmation stays pending and the transcript is kept.
    pub fn confirm_exercise_switch(&mut self, save: bool) -> Result<SwitchOutcome> {
        let exercise = self.pending_exercise_definition()?;

        let export = if save && !self.state.transcript.is_empty() {
            Some(ConversationExport::from_transcript(&self.state.transcript))
        } else {
            None
        };

        self.state.reset_conversation();
        self.state.set_exercise(&exercise.name, exercise.system_prompt);
        self.state.end_confirmation();
        self.phase = Phase::Idle;

        tracing::info!(
            session = %self.state.id,
            exercise = %exercise.name,
            saved = export.is_some(),
            "Exercise switched"
        );

        Ok(SwitchOutcome {
            exercise: exercise.name,
            export,
        })
    }

    /// Load the prompt a pending switch would move to, without applying it.
    ///
    /// Callers that write the export themselves check this first so a switch
    /// that is about to fail leaves nothing behind.
    pub fn pending_exercise_definition(&self) -> Result<ExerciseDefinition> {
        match (self.phase, self.state.pending_exercise_change.as_deref()) {
            (Phase::AwaitingExerciseConfirmation, Some(pending)) => Ok(self.catalog.load(pending)?),
            _ => Err(SessionError::NoPendingChange),
        }
    }

    /// Abandon the pending exercise change. Returns the exercise the selector
    /// should revert to.
    pub fn cancel_exercise_switch(&mut self) -> Result<Option<String>> {
        if self.phase != Phase::AwaitingExerciseConfirmation {
            return Err(SessionError::NoPendingChange);
        }

        self.state.end_confirmation();
        self.phase = Phase::Idle;
        Ok(self.state.current_exercise.clone())
    }

    /// Send a user message and wait for the assistant's reply.
    ///
    /// On failure the user message stays in the transcript without a reply
    /// and the running cost is unchanged. Nothing is retried.
    pub async fn submit(&mut self, text: &str) -> Result<TurnOutcome> {
        if self.phase == Phase::AwaitingExerciseConfirmation {
            return Err(SessionError::ConfirmationPending);
        }
        if self.state.system_prompt.is_none() {
            return Err(SessionError::NoExerciseSelected);
        }
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        self.state.push(Message::user(text));
        let conversation = self.state.conversation();
        let model = self.config.model.clone();

        self.phase = Phase::AwaitingCompletion;
        let result = self.request_completion(&conversation, &model).await;
        self.phase = Phase::Idle;

        match result {
            Ok(completion) => {
                let usage = completion.usage;
                let cost = self.config.rates.calculate_cost(
                    &model,
                    usage.prompt_tokens,
                    usage.completion_tokens,
                );
                self.state.add_cost(cost);
                self.state.push(Message::assistant(completion.content.clone()));

                tracing::info!(
                    session = %self.state.id,
                    prompt_tokens = usage.prompt_tokens,
                    completion_tokens = usage.completion_tokens,
                    cost,
                    total_cost = self.state.accumulated_cost,
                    "Turn completed"
                );

                Ok(TurnOutcome {
                    reply: completion.content,
                    usage,
                    cost,
                })
            }
            Err(e) => {
                tracing::error!(
                    session = %self.state.id,
                    retryable = e.is_retryable(),
                    "Error generating response: {}",
                    e
                );
                Err(SessionError::CompletionFailed(e))
            }
        }
    }

    async fn request_completion(
        &self,
        conversation: &[Message],
        model: &str,
    ) -> tbl_ai::Result<CompletionResult> {
        let call = self.client.complete(conversation, model);
        match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| tbl_ai::Error::Timeout(limit))?,
            None => call.await,
        }
    }

    /// Empty the transcript and zero the running cost.
    ///
    /// A pending exercise change is withdrawn: with nothing left to save
    /// there is no question to answer.
    pub fn clear(&mut self) {
        self.state.reset_conversation();
        if self.phase == Phase::AwaitingExerciseConfirmation {
            let withdrawn = self.state.end_confirmation();
            self.phase = Phase::Idle;
            tracing::info!(session = %self.state.id, ?withdrawn, "Pending exercise change withdrawn");
        }
        tracing::info!(session = %self.state.id, "Conversation cleared");
    }

    /// Export the transcript for download
    pub fn save(&self) -> Result<ConversationExport> {
        if self.state.transcript.is_empty() {
            return Err(SessionError::NothingToSave);
        }
        Ok(ConversationExport::from_transcript(&self.state.transcript))
    }

    /// Change the model used for subsequent turns
    pub fn select_model(&mut self, model: &str) -> Result<()> {
        if !self.config.models.iter().any(|m| m == model) {
            return Err(SessionError::UnknownModel(model.to_string()));
        }
        if !self.config.rates.contains(model) {
            tracing::warn!(model, "Selected model has no configured rates; cost will read zero");
        }
        self.config.model = model.to_string();
        Ok(())
    }
}
