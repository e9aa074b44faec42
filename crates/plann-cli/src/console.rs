//! Terminal prompts.

use std::io::{self, BufRead, Write};

use plann_core::postpone::{Conflict, Decider, Question};
use tracing::warn;

/// Asks on stderr and reads answers from stdin.
///
/// With `accept_defaults` nothing is read: confirmations are declined and
/// line prompts take their default.
pub struct ConsoleDecider {
    accept_defaults: bool,
}

impl ConsoleDecider {
    pub fn new(accept_defaults: bool) -> Self {
        Self { accept_defaults }
    }

    /// Prompt for a line of text, falling back to `default` on empty input.
    pub fn ask_line(&mut self, prompt: &str, default: &str) -> io::Result<String> {
        if self.accept_defaults {
            eprintln!("{prompt} [{default}]: {default}");
            return Ok(default.to_string());
        }
        eprint!("{prompt} [{default}]: ");
        io::stderr().flush()?;
        let answer = read_line()?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    /// Ask a yes/no question; anything but y or yes is a no.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        if self.accept_defaults {
            eprintln!("{prompt} [y/N]: n");
            return Ok(false);
        }
        eprint!("{prompt} [y/N]: ");
        io::stderr().flush()?;
        let answer = read_line()?.to_ascii_lowercase();
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }
}

fn read_line() -> io::Result<String> {
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

impl Decider for ConsoleDecider {
    fn resolve(&mut self, question: &Question) -> bool {
        match self.confirm(&question.prompt()) {
            Ok(answer) => answer,
            Err(err) => {
                warn!(%err, "could not read answer, assuming no");
                false
            }
        }
    }

    fn report(&mut self, conflict: &Conflict) {
        eprintln!("{conflict}");
    }
}
