//! Line-oriented frontend over stdin and stdout

use crate::ui::conversation::history_sheet::short_id;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use tracing::info;

/// Read lines from `input` until EOF or /bye, echoing the conversation to `output`
pub fn run<R: BufRead, W: Write>(
    manager: &mut ConversationManager,
    input: R,
    mut output: W,
) -> Result<()> {
    info!("REPL started");
    writeln!(output, "OpenChat. Type a message, or /help for commands.")?;
    prompt(manager, &mut output)?;

    for line in input.lines() {
        let line = line.context("Failed to read input")?;
        let before = message_count(manager)?;

        let action = manager.handle_input(&line)?;
        match action {
            ConversationAction::Exit => break,
            ConversationAction::ShowHistory { query } => {
                print_history(manager, query.as_deref().unwrap_or_default(), &mut output)?;
            }
            ConversationAction::None => {
                if message_count(manager)? > before {
                    print_last_message(manager, &mut output)?;
                }
            }
        }

        if let Some(notice) = manager.take_notice() {
            writeln!(output, "{notice}")?;
        }
        prompt(manager, &mut output)?;
    }

    writeln!(output, "Bye!")?;
    info!("REPL stopped");
    Ok(())
}

fn prompt<W: Write>(manager: &ConversationManager, output: &mut W) -> Result<()> {
    write!(output, "{} > ", manager.role())?;
    output.flush().context("Failed to flush output")
}

fn message_count(manager: &ConversationManager) -> Result<usize> {
    Ok(manager.store().with(|store| store.current().len())?)
}

fn print_last_message<W: Write>(manager: &ConversationManager, output: &mut W) -> Result<()> {
    let line = manager.store().with(|store| {
        store.current().last_message().map(|message| {
            let time = message.created_at.with_timezone(&chrono::Local).format("%H:%M:%S");
            format!("[{time}] {}: {}", message.role.display_name(), message.content)
        })
    })?;
    if let Some(line) = line {
        writeln!(output, "{line}")?;
    }
    Ok(())
}

fn print_history<W: Write>(manager: &ConversationManager, query: &str, output: &mut W) -> Result<()> {
    let entries = manager.history_entries(query)?;
    if entries.is_empty() {
        writeln!(output, "No conversations")?;
        return Ok(());
    }

    for entry in entries {
        writeln!(
            output,
            "  {}  {}  ({} messages)",
            short_id(entry.id),
            entry.name,
            entry.message_count
        )?;
    }
    Ok(())
}
