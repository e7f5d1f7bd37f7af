use crate::pipeline::{AnswerBundle, AskError, PipelineState, Question};

/// Application state for the TUI.
///
/// Holds the question being typed, the latest answer, and which panel has focus.
#[derive(Debug, Clone)]
pub struct App {
    /// Question input buffer
    input: String,
    /// Currently focused panel
    focus: Focus,
    /// Progress of the current or last submission
    status: Status,
    /// Most recent successful answer
    bundle: Option<AnswerBundle>,
    /// Set when asking is impossible (missing credential); disables submit
    startup_error: Option<String>,
    /// Scroll offset for the answer panel
    answer_scroll: u16,
    /// Scroll offset for the sources panel
    sources_scroll: u16,
}

/// Panel focus state for keyboard navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// Question input is focused (typing edits the question, Enter submits)
    Input,
    /// Answer panel is focused (j/k scroll)
    Answer,
    /// Sources panel is focused (j/k scroll)
    Sources,
}

/// What the status line shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Waiting for a question
    Ready,
    /// A pipeline run is in progress
    Working(PipelineState),
    /// Last run produced an answer
    Answered,
    /// Input rejected before running (e.g. blank question)
    Warning(String),
    /// Last run failed
    Error(String),
}

impl App {
    /// Creates a new App.
    ///
    /// When `startup_error` is set it is displayed permanently and the ask
    /// action is disabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use webqa::tui::{App, Focus};
    ///
    /// let app = App::new(None);
    /// assert_eq!(app.focus(), Focus::Input);
    /// assert!(app.can_ask());
    /// ```
    pub fn new(startup_error: Option<String>) -> Self {
        Self {
            input: String::new(),
            focus: Focus::Input,
            status: Status::Ready,
            bundle: None,
            startup_error,
            answer_scroll: 0,
            sources_scroll: 0,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn bundle(&self) -> Option<&AnswerBundle> {
        self.bundle.as_ref()
    }

    pub fn startup_error(&self) -> Option<&str> {
        self.startup_error.as_deref()
    }

    /// Returns `true` when a submission would be run.
    pub fn can_ask(&self) -> bool {
        self.startup_error.is_none() && !self.is_working()
    }

    pub fn is_working(&self) -> bool {
        matches!(self.status, Status::Working(_))
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
    }

    /// Validates the input buffer and, if it holds a question, marks a run as started.
    ///
    /// Returns `None` when asking is disabled or the input is blank; a blank
    /// input also sets a warning status.
    pub fn take_submission(&mut self) -> Option<Question> {
        if !self.can_ask() {
            return None;
        }
        match Question::parse(&self.input) {
            Ok(question) => {
                self.status = Status::Working(PipelineState::Idle);
                Some(question)
            }
            Err(e) => {
                self.status = Status::Warning(e.to_string());
                None
            }
        }
    }

    /// Records a pipeline state reported during a run.
    pub fn record_state(&mut self, state: PipelineState) {
        if !state.is_terminal() {
            self.status = Status::Working(state);
        }
    }

    /// Stores the outcome of a finished run.
    ///
    /// A failed run keeps the previous answer on screen.
    pub fn finish(&mut self, outcome: Result<AnswerBundle, AskError>) {
        match outcome {
            Ok(bundle) => {
                self.bundle = Some(bundle);
                self.status = Status::Answered;
                self.answer_scroll = 0;
                self.sources_scroll = 0;
            }
            Err(e) => {
                self.status = Status::Error(e.to_string());
            }
        }
    }

    /// Cycles focus: `Input` -> `Answer` -> `Sources` -> `Input`.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Answer,
            Focus::Answer => Focus::Sources,
            Focus::Sources => Focus::Input,
        };
    }

    /// Cycles focus in reverse order.
    pub fn prev_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Sources,
            Focus::Answer => Focus::Input,
            Focus::Sources => Focus::Answer,
        };
    }

    pub fn reset_focus(&mut self) {
        self.focus = Focus::Input;
    }

    pub fn answer_scroll(&self) -> u16 {
        self.answer_scroll
    }

    pub fn sources_scroll(&self) -> u16 {
        self.sources_scroll
    }

    /// Scrolls the focused output panel down.
    pub fn scroll_down(&mut self, amount: u16) {
        match self.focus {
            Focus::Answer => self.answer_scroll = self.answer_scroll.saturating_add(amount),
            Focus::Sources => self.sources_scroll = self.sources_scroll.saturating_add(amount),
            Focus::Input => {}
        }
    }

    /// Scrolls the focused output panel up.
    pub fn scroll_up(&mut self, amount: u16) {
        match self.focus {
            Focus::Answer => self.answer_scroll = self.answer_scroll.saturating_sub(amount),
            Focus::Sources => self.sources_scroll = self.sources_scroll.saturating_sub(amount),
            Focus::Input => {}
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(None)
    }
}
