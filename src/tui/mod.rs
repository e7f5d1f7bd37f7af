//! Terminal User Interface module.
//!
//! Provides a question form with answer, sources and disclaimer panels using
//! ratatui for rendering and crossterm for terminal management.

use std::io;
use std::panic;

use anyhow::{Context, Result};
use crossterm::{
    event::{self as crossterm_event, Event},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::{Backend, CrosstermBackend},
};
use tracing::debug;

use crate::pipeline::{AnswerPipeline, AskError, Question};

mod app;
pub mod event;
mod ui;

pub use app::{App, Focus, Status};
use event::Action;

/// Initializes the terminal for TUI rendering.
///
/// Enables raw mode and enters the alternate screen.
fn init_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
///
/// This should always be called before exiting the TUI, even in error cases,
/// to prevent terminal corruption.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

/// Minimal terminal restoration for the panic hook. Errors are ignored.
fn restore_terminal_panic() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Installs a panic hook that restores the terminal before the original hook runs.
fn init_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        restore_terminal_panic();
        original_hook(panic_info);
    }));
}

/// Runs the main event loop for the TUI.
///
/// Terminal state is always restored, even on error.
pub fn run_event_loop(app: &mut App, pipeline: Option<&AnswerPipeline>) -> Result<()> {
    let mut terminal = init_terminal()?;

    let result = run_event_loop_internal(app, pipeline, &mut terminal);

    if let Err(e) = restore_terminal(&mut terminal) {
        eprintln!("Error restoring terminal: {e}");
    }

    result
}

fn run_event_loop_internal(
    app: &mut App,
    pipeline: Option<&AnswerPipeline>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    loop {
        terminal.draw(|frame| {
            ui::draw(frame, app);
        })?;

        if crossterm_event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = crossterm_event::read()?
        {
            match event::handle_key_event(app, key) {
                Action::Quit => break,
                Action::Submit => submit(app, pipeline, terminal)?,
                Action::Continue => {}
            }
        }
    }

    Ok(())
}

/// Runs one submission to completion, redrawing as the pipeline advances.
///
/// Key presses made while the pipeline runs are queued by the terminal and
/// handled afterwards.
fn submit(
    app: &mut App,
    pipeline: Option<&AnswerPipeline>,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    let Some(pipeline) = pipeline else {
        return Ok(());
    };
    let Some(question) = app.take_submission() else {
        return Ok(());
    };

    terminal.draw(|frame| ui::draw(frame, app))?;
    run_with_progress(app, pipeline, &question, terminal);
    Ok(())
}

/// Runs the pipeline and redraws after every state it reports.
///
/// A failed redraw only costs a progress frame; it is logged and the run
/// carries on.
fn run_with_progress<B: Backend>(
    app: &mut App,
    pipeline: &AnswerPipeline,
    question: &Question,
    terminal: &mut Terminal<B>,
) {
    let outcome = pipeline.run(question, |state| {
        app.record_state(state);
        if let Err(e) = terminal.draw(|frame| ui::draw(frame, app)) {
            debug!(%state, error = %e, "failed to redraw during pipeline run");
        }
    });
    app.finish(outcome);
}

/// Entry point for the TUI application.
///
/// With `Err(AskError::MissingCredential)` (or any other startup error) the
/// form is still shown, with the error displayed and submission disabled.
pub fn run(pipeline: Result<AnswerPipeline, AskError>) -> Result<()> {
    init_panic_hook();

    let (pipeline, startup_error) = match pipeline {
        Ok(p) => (Some(p), None),
        Err(e) => (None, Some(e.to_string())),
    };

    let mut app = App::new(startup_error);
    run_event_loop(&mut app, pipeline.as_ref()).context("TUI event loop failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::fetcher::{ContentFetcher, FetchError};
    use crate::openai::{LanguageModel, ModelError};
    use crate::pipeline::{AnswerPipelineBuilder, PipelineOptions};
    use crate::search::WebSearch;

    struct FixedModel;

    impl LanguageModel for FixedModel {
        fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String, ModelError> {
            Ok("Paris.".to_string())
        }
    }

    struct NoResults;

    impl WebSearch for NoResults {
        fn search(&self, _query: &str, _num_results: usize) -> Vec<String> {
            Vec::new()
        }
    }

    struct NoPages;

    impl ContentFetcher for NoPages {
        fn fetch_and_extract(&self, _: &str, _: usize, _: usize) -> Result<String, FetchError> {
            Err(FetchError::Empty)
        }
    }

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn progress_is_redrawn_and_outcome_recorded() {
        let pipeline = AnswerPipelineBuilder::new()
            .model(Arc::new(FixedModel))
            .search(Arc::new(NoResults))
            .fetcher(Arc::new(NoPages))
            .options(PipelineOptions::default())
            .build();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        let mut app = App::default();
        for c in "Capital of France?".chars() {
            app.push_char(c);
        }
        let question = app.take_submission().unwrap();

        run_with_progress(&mut app, &pipeline, &question, &mut terminal);

        // The last frame drawn during the run is the final non-terminal state.
        assert!(screen(&terminal).contains("Getting response... (summarizing sources)"));
        assert_eq!(app.status(), &Status::Answered);
        assert_eq!(app.bundle().map(|b| b.direct_answer.as_str()), Some("Paris."));
    }
}
