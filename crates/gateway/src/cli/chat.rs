//! `configchat chat`: interactive REPL command.
//!
//! Opens a readline loop that sends each line through the exchange
//! pipeline. Slash-commands manage the session.

use std::sync::Arc;

use cc_domain::config::Config;
use cc_domain::message::TurnRole;

use crate::bootstrap;
use crate::runtime::{run_exchange, ExchangeInput, ExchangeOutcome, JudgeOutcome};
use crate::state::AppState;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL.
pub async fn chat(
    config: Arc<Config>,
    mut session_id: String,
    user_id: Option<String>,
) -> anyhow::Result<()> {
    let state = bootstrap::build_app_state(config)?;

    let mut rl = rustyline::DefaultEditor::new()?;

    // Banner goes to stderr to keep stdout clean for output.
    eprintln!("ConfigChat interactive chat");
    eprintln!("Session: {session_id}  |  Type /help for commands, Ctrl+D to exit");
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                if trimmed.starts_with('/') {
                    if handle_slash_command(&state, trimmed, &mut session_id) {
                        break;
                    }
                    continue;
                }

                if let Err(e) = send_message(&state, &session_id, &user_id, trimmed).await {
                    eprintln!("\x1B[31merror: {e}\x1B[0m");
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command. Returns `true` if the REPL should exit.
fn handle_slash_command(state: &AppState, input: &str, session_id: &mut String) -> bool {
    let (cmd, arg) = match input.split_once(' ') {
        Some((cmd, arg)) => (cmd, Some(arg.trim())),
        None => (input, None),
    };

    match cmd {
        "/exit" | "/quit" => return true,

        "/session" => {
            if let Some(name) = arg.filter(|s| !s.is_empty()) {
                *session_id = name.to_string();
                eprintln!("Session switched to: {session_id}");
            } else {
                eprintln!("Current session: {session_id}");
                eprintln!("Usage: /session <id>");
            }
        }

        "/reset" => {
            if state.sessions.reset(session_id) {
                eprintln!("Conversation reset.");
            } else {
                eprintln!("Nothing to reset.");
            }
        }

        "/history" => {
            let turns = state.sessions.snapshot(session_id);
            if turns.is_empty() {
                eprintln!("(no history)");
            }
            for turn in turns {
                let who = match turn.role {
                    TurnRole::User => "you",
                    TurnRole::Assistant => "assistant",
                };
                eprintln!("{who}> {}", turn.content);
            }
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /session <id>    Switch to another session");
            eprintln!("  /history         Show this session's conversation");
            eprintln!("  /reset           Clear this session's conversation");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

async fn send_message(
    state: &AppState,
    session_id: &str,
    user_id: &Option<String>,
    user_message: &str,
) -> anyhow::Result<()> {
    let input = ExchangeInput {
        session_id: session_id.to_string(),
        message: user_message.to_string(),
        user_id: user_id.clone(),
        email: None,
    };

    match run_exchange(state, input).await? {
        ExchangeOutcome::Completed(result) => {
            println!("{}", result.assistant_text);
            if let Some(JudgeOutcome::Evaluated {
                score: Some(score), ..
            }) = result.judge
            {
                eprintln!("\x1B[2m[{} | judge score: {score:.2}]\x1B[0m", result.model_id);
            }
            println!();
        }
        ExchangeOutcome::Disabled { key } => {
            eprintln!("\x1B[33mAI configuration '{key}' is disabled for this context\x1B[0m");
        }
    }

    Ok(())
}
