use std::io::{self, Write};

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task;

use crate::session::{GenerateBackend, Session};

/// What one line of input asks the shell to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Clear,
    Skip,
    Send(String),
}

impl Action {
    pub fn classify(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Skip;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            return Self::Quit;
        }
        if trimmed.eq_ignore_ascii_case("clear") {
            return Self::Clear;
        }
        Self::Send(trimmed.to_string())
    }
}

pub async fn run_repl<B: GenerateBackend>(session: &mut Session<'_, B>) -> Result<()> {
    println!("Gemini Command Line - Interactive Mode");
    println!("Type 'exit' or 'quit' to end the session");
    println!("Type 'clear' to clear conversation history");
    println!("{}", "-".repeat(50));

    session.start_conversation();

    loop {
        print!("\nYou: ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let line = tokio::select! {
            line = read_line() => line?,
            _ = signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            // end of input or Ctrl-C
            println!("\nGoodbye!");
            return Ok(());
        };

        match Action::classify(&line) {
            Action::Skip => continue,
            Action::Quit => {
                println!("Goodbye!");
                return Ok(());
            }
            Action::Clear => {
                session.start_conversation();
                println!("Conversation history cleared.");
            }
            Action::Send(message) => {
                let response = tokio::select! {
                    response = session.send_in_conversation(&message) => response,
                    _ = signal::ctrl_c() => {
                        println!("\nGoodbye!");
                        return Ok(());
                    }
                };
                println!("\nGemini: {response}");
            }
        }
    }
}

/// Blocking stdin read moved off the runtime so Ctrl-C stays responsive.
/// Returns `None` once the input stream is closed.
async fn read_line() -> Result<Option<String>> {
    task::spawn_blocking(|| {
        let mut line = String::new();
        let read = io::stdin()
            .read_line(&mut line)
            .context("Failed to read stdin")?;
        Ok(if read == 0 { None } else { Some(line) })
    })
    .await
    .context("stdin reader task failed")?
}

#[cfg(test)]
mod tests {
    use super::Action;

    #[test]
    fn classify_recognizes_quit_words_case_insensitively() {
        assert_eq!(Action::classify("exit"), Action::Quit);
        assert_eq!(Action::classify("Exit"), Action::Quit);
        assert_eq!(Action::classify("  quit  "), Action::Quit);
        assert_eq!(Action::classify("QUIT"), Action::Quit);
    }

    #[test]
    fn classify_recognizes_clear() {
        assert_eq!(Action::classify("clear"), Action::Clear);
        assert_eq!(Action::classify(" CLEAR "), Action::Clear);
    }

    #[test]
    fn classify_skips_blank_lines() {
        assert_eq!(Action::classify(""), Action::Skip);
        assert_eq!(Action::classify("   \t"), Action::Skip);
        assert_eq!(Action::classify("\n"), Action::Skip);
    }

    #[test]
    fn classify_trims_ordinary_messages() {
        assert_eq!(
            Action::classify("  what is rust?  \n"),
            Action::Send("what is rust?".to_string())
        );
    }

    #[test]
    fn control_words_embedded_in_a_message_are_sent() {
        assert_eq!(
            Action::classify("please exit the loop"),
            Action::Send("please exit the loop".to_string())
        );
    }
}
