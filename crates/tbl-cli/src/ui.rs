//! TUI implementation for tbl

use tokio::sync::mpsc;

use crossterm::event::EventStream;
use futures::StreamExt;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tbl_session::{Phase, SessionController, SessionError, TurnOutcome};
use tbl_tui::{
    Theme,
    input::{Action, event_to_action},
    widgets::{
        ChatMessage, ConfirmDialog, InputBox, MessageList, Selector, SelectorItem, SelectorState,
        Speaker, Spinner, calculate_message_height,
    },
};

use crate::actions::{self, Feedback};
use crate::commands::{CommandResult, execute_command};
use crate::utils::{format_cost, format_rates};

/// Buttons of the save-before-switching dialog, in display order
const SWITCH_CHOICES: [&str; 3] = ["Yes, Save", "No, Continue", "Cancel"];

/// Messages sent from key handling to the session loop
#[derive(Debug, PartialEq, Eq)]
pub enum UiMessage {
    /// User submitted a message
    Submit(String),
    /// Slash command
    Command(String),
    OpenExerciseSelector,
    SelectExercise(String),
    /// Change model (index into the model list)
    ChangeModel(usize),
    /// Answer to the switch dialog (index into `SWITCH_CHOICES`)
    AnswerSwitch(usize),
    Clear,
    Save,
    Quit,
}

/// What the loop should do after handling a message
enum Step {
    Continue,
    Prompt(String),
    Quit,
}

/// Copy of the session taken after every change, so the screen can be drawn
/// while the controller is busy with a request
#[derive(Debug, Default)]
struct SessionView {
    model: String,
    /// Model ids with their rates, if known
    models: Vec<(String, Option<String>)>,
    exercise: Option<String>,
    pending_exercise: Option<String>,
    cost: f64,
    can_submit: bool,
    confirming: bool,
}

impl SessionView {
    fn of(controller: &SessionController) -> Self {
        Self {
            model: controller.model().to_string(),
            models: controller
                .models()
                .iter()
                .map(|m| (m.clone(), controller.rates().get(m).map(format_rates)))
                .collect(),
            exercise: controller.current_exercise().map(str::to_string),
            pending_exercise: controller.pending_exercise().map(str::to_string),
            cost: controller.accumulated_cost(),
            can_submit: controller.can_submit(),
            confirming: controller.phase() == Phase::AwaitingExerciseConfirmation,
        }
    }
}

/// TUI application state
pub struct TuiState {
    messages: Vec<ChatMessage>,
    input: InputBox,
    /// Current scroll position (`usize::MAX` pins to the bottom)
    scroll: usize,
    is_processing: bool,
    theme: Theme,
    spinner_start: Instant,
    view: SessionView,
    exercises: Vec<String>,
    prompts_dir: String,
    exercise_selector: SelectorState,
    model_selector: SelectorState,
    dialog: SelectorState,
    ui_tx: mpsc::Sender<UiMessage>,
}

impl TuiState {
    pub fn new(controller: &SessionController, ui_tx: mpsc::Sender<UiMessage>) -> Self {
        let mut state = Self {
            messages: Vec::new(),
            input: InputBox::new().with_placeholder("Type your message here..."),
            scroll: 0,
            is_processing: false,
            theme: Theme::dark(),
            spinner_start: Instant::now(),
            view: SessionView::default(),
            exercises: controller.list_exercises(),
            prompts_dir: controller.catalog().dir().display().to_string(),
            exercise_selector: SelectorState::default(),
            model_selector: SelectorState::default(),
            dialog: SelectorState::default(),
            ui_tx,
        };
        state.sync(controller);
        state
    }

    /// Refresh the copy of the session after the controller changed
    fn sync(&mut self, controller: &SessionController) {
        let was_confirming = self.view.confirming;
        self.view = SessionView::of(controller);

        let has_turns = self
            .messages
            .iter()
            .any(|m| matches!(m.speaker, Speaker::User | Speaker::Assistant));
        if has_turns && controller.transcript().is_empty() {
            self.messages.clear();
            self.scroll = 0;
        }

        if self.view.confirming && !was_confirming {
            self.dialog.show_at(0);
        } else if !self.view.confirming {
            self.dialog.hide();
        }

        self.input.set_enabled(self.view.can_submit);
        let hint = if self.view.confirming {
            "Answer the question above to continue"
        } else if self.exercises.is_empty() && self.view.exercise.is_none() {
            "No exercises available"
        } else {
            "Select an exercise to start (Ctrl+E)"
        };
        self.input.set_disabled_hint(hint);
    }

    fn scroll_to_bottom(&mut self) {
        // Will be calculated during render based on content height
        self.scroll = usize::MAX;
    }

    fn show_feedback(&mut self, feedback: Feedback) {
        let message = match feedback {
            Feedback::Info(text) | Feedback::Warning(text) => ChatMessage::notice(text),
            Feedback::Error(text) => ChatMessage::error(text),
        };
        self.messages.push(message);
        self.scroll_to_bottom();
    }

    fn begin_turn(&mut self) {
        self.is_processing = true;
        self.spinner_start = Instant::now();
        self.scroll_to_bottom();
    }

    fn finish_turn(&mut self, result: Result<TurnOutcome, SessionError>) {
        self.is_processing = false;
        match result {
            Ok(outcome) => self.messages.push(ChatMessage::assistant(outcome.reply)),
            Err(e) => {
                // A rejected message never reached the transcript
                if !e.is_completion_failure()
                    && self.messages.last().is_some_and(|m| m.speaker == Speaker::User)
                {
                    self.messages.pop();
                }
                self.show_feedback(actions::submit_error(&e));
            }
        }
        self.scroll_to_bottom();
    }

    async fn send(&self, msg: UiMessage) {
        let _ = self.ui_tx.send(msg).await;
    }

    /// Handle keyboard action. Returns false when the UI should exit.
    pub async fn handle_action(&mut self, action: Action, width: u16) -> bool {
        if matches!(action, Action::Quit | Action::Interrupt) {
            self.send(UiMessage::Quit).await;
            return false;
        }

        if self.dialog.visible {
            match action {
                Action::Left | Action::Up => self.dialog.up(SWITCH_CHOICES.len()),
                Action::Right | Action::Down => self.dialog.down(SWITCH_CHOICES.len()),
                Action::Submit => self.send(UiMessage::AnswerSwitch(self.dialog.selected)).await,
                Action::Char('y') | Action::Char('Y') => self.send(UiMessage::AnswerSwitch(0)).await,
                Action::Char('n') | Action::Char('N') => self.send(UiMessage::AnswerSwitch(1)).await,
                Action::Escape | Action::Char('c') | Action::Char('C') => {
                    self.send(UiMessage::AnswerSwitch(2)).await
                }
                _ => {}
            }
            return true;
        }

        if self.exercise_selector.visible {
            match action {
                Action::Up => self.exercise_selector.up(self.exercises.len()),
                Action::Down => self.exercise_selector.down(self.exercises.len()),
                Action::Submit => {
                    self.exercise_selector.hide();
                    if let Some(name) = self.exercises.get(self.exercise_selector.selected) {
                        self.send(UiMessage::SelectExercise(name.clone())).await;
                    }
                }
                Action::Escape | Action::ExerciseSelect => self.exercise_selector.hide(),
                _ => {}
            }
            return true;
        }

        if self.model_selector.visible {
            match action {
                Action::Up => self.model_selector.up(self.view.models.len()),
                Action::Down => self.model_selector.down(self.view.models.len()),
                Action::Submit => {
                    self.model_selector.hide();
                    self.send(UiMessage::ChangeModel(self.model_selector.selected)).await;
                }
                Action::Escape | Action::ModelSelect => self.model_selector.hide(),
                _ => {}
            }
            return true;
        }

        match action {
            Action::Submit => {
                let pending = self.input.content().trim();
                if pending.is_empty() {
                    return true;
                }
                if pending.starts_with('/') {
                    let command = self.input.take().trim().to_string();
                    self.send(UiMessage::Command(command)).await;
                } else if self.view.can_submit {
                    let content = self.input.take().trim().to_string();
                    self.messages.push(ChatMessage::user(&content));
                    self.scroll_to_bottom();
                    self.send(UiMessage::Submit(content)).await;
                }
            }
            Action::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
            }
            Action::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
            }
            Action::ExerciseSelect => self.send(UiMessage::OpenExerciseSelector).await,
            Action::ModelSelect => self.open_model_selector(),
            Action::Clear => self.send(UiMessage::Clear).await,
            Action::Save => self.send(UiMessage::Save).await,
            _ => {
                self.input.handle_action(&action, width);
            }
        }
        true
    }

    fn open_exercise_selector(&mut self, exercises: Vec<String>) {
        let current = self
            .view
            .exercise
            .as_ref()
            .and_then(|e| exercises.iter().position(|x| x == e))
            .unwrap_or(0);
        self.exercises = exercises;
        self.exercise_selector.show_at(current);
    }

    fn open_model_selector(&mut self) {
        let current = self
            .view
            .models
            .iter()
            .position(|(m, _)| *m == self.view.model)
            .unwrap_or(0);
        self.model_selector.show_at(current);
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Layout: messages (flex), status bar (1), input (3)
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(size);

        self.render_messages(frame, chunks[0]);
        self.render_status(frame, chunks[1]);
        self.input.render(chunks[2], frame.buffer_mut(), &self.theme);

        if self.exercise_selector.visible {
            self.render_exercise_selector(frame, size);
        }
        if self.model_selector.visible {
            self.render_model_selector(frame, size);
        }
        if self.dialog.visible {
            self.render_dialog(frame, size);
        }
    }

    fn render_exercise_selector(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<SelectorItem> = self
            .exercises
            .iter()
            .map(|name| SelectorItem {
                label: name,
                description: None,
                is_current: self.view.exercise.as_deref() == Some(name.as_str()),
            })
            .collect();

        Selector::new("Select Exercise", items, &self.theme)
            .with_selected(self.exercise_selector.selected)
            .with_empty_text("No exercises available")
            .render_centered(area, frame.buffer_mut());
    }

    fn render_model_selector(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<SelectorItem> = self
            .view
            .models
            .iter()
            .map(|(id, rates)| SelectorItem {
                label: id,
                description: rates.as_deref(),
                is_current: *id == self.view.model,
            })
            .collect();

        Selector::new("Select Model", items, &self.theme)
            .with_selected(self.model_selector.selected)
            .render_centered(area, frame.buffer_mut());
    }

    fn render_dialog(&self, frame: &mut Frame, area: Rect) {
        let question =
            actions::switch_question(self.view.pending_exercise.as_deref().unwrap_or_default());
        ConfirmDialog::new("Save Conversation?", &question, &SWITCH_CHOICES, &self.theme)
            .with_selected(self.dialog.selected)
            .render_centered(area, frame.buffer_mut());
    }

    fn render_messages(&mut self, frame: &mut Frame, area: Rect) {
        let exercise = self.view.exercise.as_deref().unwrap_or("no exercise");
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title(format!(" Team Based Learning │ {} ", exercise));

        let inner = block.inner(area);
        frame.render_widget(block, area);

        if inner.height == 0 || (self.messages.is_empty() && !self.is_processing) {
            self.render_welcome(frame, inner);
            return;
        }

        let content_height =
            calculate_message_height(&self.messages, inner.width as usize, self.is_processing);
        let max_scroll = content_height.saturating_sub(inner.height as usize);
        self.scroll = self.scroll.min(max_scroll);

        let waiting = self.is_processing.then(|| self.spinner_start.elapsed());
        let message_list = MessageList::new(&self.messages, &self.theme)
            .scroll(self.scroll)
            .waiting(waiting);
        frame.render_widget(message_list, inner);

        if content_height > inner.height as usize {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"))
                .track_symbol(Some("│"))
                .thumb_symbol("█");

            let mut scrollbar_state = ScrollbarState::new(max_scroll)
                .position(self.scroll)
                .viewport_content_length(inner.height as usize);

            frame.render_stateful_widget(scrollbar, inner, &mut scrollbar_state);
        }
    }

    fn render_welcome(&self, frame: &mut Frame, area: Rect) {
        let key = |k: &'static str, what: &'static str| {
            Line::from(vec![
                Span::styled(format!("    {:<10}", k), self.theme.accent_style()),
                Span::styled(what, self.theme.base_style()),
            ])
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("  Team Based Learning", self.theme.accent_bold()),
                Span::styled(" - exercise chat", self.theme.dim_style()),
            ]),
            Line::from(""),
            Line::from(Span::styled(
                format!("  Model: {}", self.view.model),
                self.theme.dim_style(),
            )),
            Line::from(Span::styled(
                format!(
                    "  Exercise: {}",
                    self.view.exercise.as_deref().unwrap_or("none selected")
                ),
                self.theme.dim_style(),
            )),
        ];

        if self.exercises.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("  No exercises available in {}", self.prompts_dir),
                self.theme.warning_style(),
            )));
        }

        lines.extend([
            Line::from(""),
            Line::from(Span::styled("  Keybindings", self.theme.warning_style())),
            Line::from(""),
            key("Enter", "Send message"),
            key("Ctrl+E", "Select exercise"),
            key("Ctrl+K", "Select model"),
            key("Ctrl+S", "Save conversation"),
            key("Ctrl+L", "Clear conversation"),
            key("PgUp/Dn", "Scroll history"),
            key("Ctrl+Q", "Quit"),
            Line::from(""),
        ]);

        let hint = if self.view.exercise.is_some() {
            "  Type a message to get started..."
        } else {
            "  Choose an exercise to get started..."
        };
        lines.push(Line::from(Span::styled(hint, self.theme.dim_style())));

        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let cost = format!("Cost: {}", format_cost(self.view.cost));

        if self.is_processing {
            let label = format!("Generating response... │ {}", cost);
            let spinner = Spinner::new(&label, &self.theme).with_start_time(self.spinner_start);
            frame.render_widget(spinner, area);
            return;
        }

        let exercise = self.view.exercise.as_deref().unwrap_or("no exercise");
        let left_content = format!("{} │ {} │ {}", self.view.model, exercise, cost);
        let right_content = "Ctrl+E exercise │ Ctrl+K model │ Ctrl+S save │ Ctrl+L clear │ Ctrl+Q quit";

        let left_width = left_content.chars().count();
        let right_width = right_content.chars().count();
        let available = area.width as usize;

        let line = if left_width + right_width + 2 <= available {
            let spacing = available - left_width - right_width;
            Line::from(vec![
                Span::styled(left_content, self.theme.dim_style()),
                Span::raw(" ".repeat(spacing)),
                Span::styled(right_content, self.theme.border_style()),
            ])
        } else {
            Line::from(Span::styled(left_content, self.theme.dim_style()))
        };

        frame.render_widget(Paragraph::new(line), area);
    }
}

/// Apply one UI message to the session
fn handle_ui_message(
    msg: UiMessage,
    controller: &mut SessionController,
    state: &mut TuiState,
    export_dir: &Path,
) -> Step {
    let feedback = match msg {
        UiMessage::Submit(content) => return Step::Prompt(content),
        UiMessage::Quit => return Step::Quit,
        UiMessage::Command(cmd) => {
            let models: Vec<String> = controller.models().to_vec();
            let exercises = controller.list_exercises();
            match execute_command(&cmd, &models, &exercises) {
                Some(result) => match run_command(result, controller, state, exercises, export_dir) {
                    Ok(feedback) => feedback,
                    Err(step) => return step,
                },
                None => None,
            }
        }
        UiMessage::OpenExerciseSelector => {
            state.open_exercise_selector(controller.list_exercises());
            None
        }
        UiMessage::SelectExercise(name) => Some(actions::select_exercise(controller, &name)),
        UiMessage::ChangeModel(index) => state
            .view
            .models
            .get(index)
            .map(|(id, _)| id.clone())
            .map(|id| actions::change_model(controller, &id)),
        UiMessage::AnswerSwitch(choice) => Some(answer_switch(controller, choice, export_dir)),
        UiMessage::Clear => Some(actions::clear(controller)),
        UiMessage::Save => Some(actions::save(controller, export_dir)),
    };

    state.sync(controller);
    if let Some(feedback) = feedback {
        // The switch question is asked by the dialog itself
        if !(state.view.confirming && matches!(feedback, Feedback::Warning(_))) {
            state.show_feedback(feedback);
        }
    }
    Step::Continue
}

fn answer_switch(controller: &mut SessionController, choice: usize, export_dir: &Path) -> Feedback {
    match choice {
        0 => actions::confirm_switch(controller, true, export_dir),
        1 => actions::confirm_switch(controller, false, export_dir),
        _ => actions::cancel_switch(controller),
    }
}

/// Slash commands typed into the TUI input box
fn run_command(
    result: CommandResult,
    controller: &mut SessionController,
    state: &mut TuiState,
    exercises: Vec<String>,
    export_dir: &Path,
) -> Result<Option<Feedback>, Step> {
    Ok(Some(match result {
        CommandResult::Message(msg) => Feedback::Info(msg),
        CommandResult::Exit => return Err(Step::Quit),
        CommandResult::Clear => actions::clear(controller),
        CommandResult::Save => actions::save(controller, export_dir),
        CommandResult::ShowCost => actions::show_cost(controller),
        CommandResult::OpenExerciseSelector => {
            state.open_exercise_selector(exercises);
            return Ok(None);
        }
        CommandResult::SelectExercise(name) => actions::select_exercise(controller, &name),
        CommandResult::OpenModelSelector => {
            state.open_model_selector();
            return Ok(None);
        }
        CommandResult::ChangeModel(model) => actions::change_model(controller, &model),
        CommandResult::ConfirmSwitch { save } => {
            actions::confirm_switch(controller, save, export_dir)
        }
        CommandResult::CancelSwitch => actions::cancel_switch(controller),
        CommandResult::Unknown(cmd) => Feedback::Warning(format!(
            "Unknown command: /{}\nType /help for available commands.",
            cmd
        )),
    }))
}

/// Run the TUI application
pub async fn run_tui(controller: &mut SessionController, export_dir: PathBuf) -> anyhow::Result<()> {
    use crossterm::{
        event::{DisableBracketedPaste, EnableBracketedPaste},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    };
    use std::io;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, controller, &export_dir).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    controller: &mut SessionController,
    export_dir: &Path,
) -> anyhow::Result<()> {
    let (ui_tx, mut ui_rx) = mpsc::channel::<UiMessage>(32);
    let mut state = TuiState::new(controller, ui_tx);
    let mut event_stream = EventStream::new();

    // Tick interval for animations (80ms for smooth spinner)
    let mut tick_interval = tokio::time::interval(Duration::from_millis(80));

    // Stored outside the select so it lives as long as the request future
    let mut pending_prompt: Option<String> = None;

    loop {
        if let Some(content) = pending_prompt.take() {
            state.begin_turn();

            let outcome = {
                let mut prompt_future = std::pin::pin!(controller.submit(&content));

                // Keep drawing and accepting keystrokes until the reply arrives
                loop {
                    terminal.draw(|frame| state.render(frame))?;
                    let area_width = terminal.size()?.width;

                    tokio::select! {
                        biased;

                        result = &mut prompt_future => break Some(result),

                        event = event_stream.next() => match event {
                            Some(Ok(event)) => match event_to_action(event) {
                                Some(Action::Quit | Action::Interrupt) => break None,
                                Some(Action::PageUp) => state.scroll = state.scroll.saturating_sub(10),
                                Some(Action::PageDown) => state.scroll = state.scroll.saturating_add(10),
                                Some(action) => {
                                    state.input.handle_action(&action, area_width);
                                }
                                None => {}
                            },
                            Some(Err(_)) | None => break None,
                        },

                        _ = tick_interval.tick() => {}
                    }
                }
            };

            match outcome {
                Some(result) => {
                    state.finish_turn(result);
                    state.sync(controller);
                    continue;
                }
                None => return Ok(()),
            }
        }

        terminal.draw(|frame| state.render(frame))?;
        let area_width = terminal.size()?.width;

        tokio::select! {
            biased;

            msg = ui_rx.recv() => {
                let Some(msg) = msg else { return Ok(()) };
                match handle_ui_message(msg, controller, &mut state, export_dir) {
                    Step::Continue => {}
                    Step::Prompt(content) => pending_prompt = Some(content),
                    Step::Quit => return Ok(()),
                }
            }

            event = event_stream.next() => {
                match event {
                    Some(Ok(event)) => {
                        if let Some(action) = event_to_action(event) {
                            if !state.handle_action(action, area_width).await {
                                return Ok(());
                            }
                        }
                    }
                    Some(Err(e)) => return Err(anyhow::anyhow!("Event error: {}", e)),
                    None => return Ok(()),
                }
            }

            // Tick for animations (spinner updates)
            _ = tick_interval.tick() => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tbl_ai::{CompletionClient, CompletionResult, Message};
    use tbl_session::{ExerciseCatalog, SessionConfig};

    struct FixedClient;

    #[async_trait::async_trait]
    impl CompletionClient for FixedClient {
        async fn complete(&self, _: &[Message], _: &str) -> tbl_ai::Result<CompletionResult> {
            Ok(CompletionResult::new("Hi there", 10, 5))
        }
    }

    fn setup() -> (tempfile::TempDir, SessionController) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("intro.txt"), "intro prompt").unwrap();
        std::fs::write(dir.path().join("week2.txt"), "week2 prompt").unwrap();
        let controller = SessionController::new(
            ExerciseCatalog::new(dir.path()),
            Arc::new(FixedClient),
            SessionConfig::default(),
        );
        (dir, controller)
    }

    fn type_text(state: &mut TuiState, text: &str) {
        for c in text.chars() {
            state.input.handle_action(&Action::Char(c), 80);
        }
    }

    #[tokio::test]
    async fn test_input_disabled_until_exercise_loaded() {
        let (dir, mut controller) = setup();
        let (tx, mut rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        assert!(!state.input.is_enabled());
        type_text(&mut state, "Hello");
        state.handle_action(Action::Submit, 80).await;
        assert!(rx.try_recv().is_err());

        handle_ui_message(
            UiMessage::SelectExercise("intro".into()),
            &mut controller,
            &mut state,
            dir.path(),
        );
        assert!(state.input.is_enabled());
        assert_eq!(state.view.exercise.as_deref(), Some("intro"));

        type_text(&mut state, "Hello");
        state.handle_action(Action::Submit, 80).await;
        assert_eq!(rx.try_recv().unwrap(), UiMessage::Submit("Hello".into()));
        assert_eq!(state.messages.last(), Some(&ChatMessage::user("Hello")));
        assert_eq!(state.input.content(), "");

        type_text(&mut state, " /cost ");
        state.handle_action(Action::Submit, 80).await;
        assert_eq!(rx.try_recv().unwrap(), UiMessage::Command("/cost".into()));
        assert_eq!(state.input.content(), "");
    }

    #[tokio::test]
    async fn test_switch_dialog_flow() {
        let (dir, mut controller) = setup();
        let (tx, mut rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        handle_ui_message(UiMessage::SelectExercise("intro".into()), &mut controller, &mut state, dir.path());
        let result = controller.submit("Hello").await;
        state.messages.push(ChatMessage::user("Hello"));
        state.finish_turn(result);
        state.sync(&controller);

        handle_ui_message(UiMessage::SelectExercise("week2".into()), &mut controller, &mut state, dir.path());
        assert!(state.dialog.visible);
        assert!(!state.input.is_enabled());

        state.handle_action(Action::Right, 80).await;
        state.handle_action(Action::Submit, 80).await;
        let answer = rx.try_recv().unwrap();
        assert_eq!(answer, UiMessage::AnswerSwitch(1));

        handle_ui_message(answer, &mut controller, &mut state, dir.path());
        assert!(!state.dialog.visible);
        assert_eq!(state.view.exercise.as_deref(), Some("week2"));
        assert_eq!(state.view.cost, 0.0);
        assert!(state.messages.iter().all(|m| m.speaker == Speaker::Notice));
    }

    #[tokio::test]
    async fn test_cancel_keeps_messages() {
        let (dir, mut controller) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        handle_ui_message(UiMessage::SelectExercise("intro".into()), &mut controller, &mut state, dir.path());
        state.messages.push(ChatMessage::user("Hello"));
        let result = controller.submit("Hello").await;
        state.finish_turn(result);
        handle_ui_message(UiMessage::SelectExercise("week2".into()), &mut controller, &mut state, dir.path());

        handle_ui_message(UiMessage::AnswerSwitch(2), &mut controller, &mut state, dir.path());
        assert!(!state.dialog.visible);
        assert_eq!(state.view.exercise.as_deref(), Some("intro"));
        assert!(state.messages.contains(&ChatMessage::assistant("Hi there")));
    }

    #[test]
    fn test_save_with_empty_conversation_shows_notice() {
        let (dir, mut controller) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        handle_ui_message(UiMessage::Save, &mut controller, &mut state, dir.path());
        assert_eq!(
            state.messages.last(),
            Some(&ChatMessage::notice("No conversation to save yet."))
        );
    }

    #[test]
    fn test_failed_turn_shows_error_banner() {
        let (_dir, controller) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        state.messages.push(ChatMessage::user("Hello"));
        state.finish_turn(Err(SessionError::CompletionFailed(tbl_ai::Error::api("server_error", "boom"))));
        assert_eq!(state.messages.len(), 2);
        assert_eq!(
            state.messages[1],
            ChatMessage::error("Failed to generate response. Please try again.")
        );
    }

    #[test]
    fn test_render_status_and_welcome() {
        use ratatui::backend::TestBackend;

        let (_dir, controller) = setup();
        let (tx, _rx) = mpsc::channel(8);
        let mut state = TuiState::new(&controller, tx);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| state.render(frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = (0..buffer.area.height)
            .flat_map(|y| (0..buffer.area.width).map(move |x| (x, y)))
            .map(|(x, y)| buffer.cell((x, y)).map(|c| c.symbol()).unwrap_or(" "))
            .collect();
        assert!(text.contains("Team Based Learning"));
        assert!(text.contains("Cost: $0.00000"));
        assert!(text.contains("Select an exercise to start (Ctrl+E)"));
    }
}
