//! Interactive confirmation on the terminal

use async_trait::async_trait;
use sprintforge_baseline::Confirmation;
use std::io::{BufRead, Write};

/// Asks on stderr and reads the answer from stdin
///
/// Only `y` or `yes` (any case) confirms. End of input declines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

/// Whether a typed answer confirms
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[async_trait]
impl Confirmation for TerminalConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_string();
        let answer = tokio::task::spawn_blocking(move || {
            let mut stderr = std::io::stderr().lock();
            let _ = write!(stderr, "{prompt} [y/N] ");
            let _ = stderr.flush();
            let mut line = String::new();
            match std::io::stdin().lock().read_line(&mut line) {
                Ok(0) | Err(_) => None,
                Ok(_) => Some(line),
            }
        })
        .await;
        matches!(answer, Ok(Some(line)) if is_yes(&line))
    }
}
