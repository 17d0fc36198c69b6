//! Terminal UI event loop

use crate::events::TuiEvent;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tracing::{error, info};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run the terminal UI until the user exits
pub fn run(manager: &mut ConversationManager) -> Result<()> {
    install_panic_hook();
    let mut terminal = setup_terminal()?;
    info!("Terminal UI started");

    let result = event_loop(&mut terminal, manager);

    if let Err(err) = restore_terminal() {
        error!(error = %err, "Failed to restore terminal");
    }
    info!("Terminal UI stopped");
    result
}

fn event_loop(terminal: &mut Tui, manager: &mut ConversationManager) -> Result<()> {
    loop {
        let mut render_result = Ok(());
        terminal
            .draw(|frame| {
                render_result = manager.render(frame.size(), frame.buffer_mut());
            })
            .context("Failed to draw terminal UI")?;
        render_result?;

        let Some(event) = next_event()? else {
            continue;
        };

        let action = match event {
            TuiEvent::Key(key) => manager.handle_key(key)?,
            TuiEvent::Paste(text) => {
                manager.paste(&text);
                ConversationAction::None
            }
            TuiEvent::Resize(width, height) => {
                terminal
                    .resize(ratatui::layout::Rect::new(0, 0, width, height))
                    .context("Failed to resize terminal")?;
                ConversationAction::None
            }
        };

        match action {
            ConversationAction::None => {}
            ConversationAction::ShowHistory { query } => manager.open_history(query.as_deref()),
            ConversationAction::Exit => return Ok(()),
        }
    }
}

fn next_event() -> Result<Option<TuiEvent>> {
    if !event::poll(Duration::from_millis(250)).context("Failed to poll terminal events")? {
        return Ok(None);
    }

    let event = match event::read().context("Failed to read terminal event")? {
        Event::Key(key) => Some(TuiEvent::Key(key)),
        Event::Paste(text) => Some(TuiEvent::Paste(text)),
        Event::Resize(width, height) => Some(TuiEvent::Resize(width, height)),
        _ => None,
    };
    Ok(event)
}

fn setup_terminal() -> Result<Tui> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)
        .context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen, DisableBracketedPaste, cursor::Show)
        .context("Failed to leave alternate screen")?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}
