//! Confirmation gate for actions that change a user's platform account.

use crate::error::{DeployError, Result};
use std::io::{BufRead, Write};

/// A one-shot yes/no question about one action
#[derive(Debug, Clone, Copy)]
pub struct ConfirmationRequest<'a> {
    /// What is about to happen
    pub action: &'a str,
    /// Exact command that will be run on the user's behalf, if any
    pub command: Option<&'a str>,
}

impl<'a> ConfirmationRequest<'a> {
    /// Ask about a plain action
    pub fn new(action: &'a str) -> Self {
        Self {
            action,
            command: None,
        }
    }

    /// Ask about running `command`
    pub fn with_command(action: &'a str, command: &'a str) -> Self {
        Self {
            action,
            command: Some(command),
        }
    }

    /// Prompt text as shown to the user
    pub fn prompt(&self) -> String {
        match self.command {
            Some(command) => format!(
                "{}\n\n    $ {}\n\nAre you sure you want to do this? (yes|no) ",
                self.action, command
            ),
            None => format!("{}\n\nAre you sure you want to do this? (yes|no) ", self.action),
        }
    }
}

/// Blocks for a yes/no answer unless confirmations are bypassed
pub struct ConfirmationGate {
    bypass: bool,
    input: Box<dyn BufRead + Send>,
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("bypass", &self.bypass)
            .finish_non_exhaustive()
    }
}

impl ConfirmationGate {
    /// Gate reading answers from stdin
    pub fn stdin(bypass: bool) -> Self {
        Self::with_input(bypass, std::io::BufReader::new(std::io::stdin()))
    }

    /// Gate reading answers from `input`
    pub fn with_input(bypass: bool, input: impl BufRead + Send + 'static) -> Self {
        Self {
            bypass,
            input: Box::new(input),
        }
    }

    /// True when every request is approved without prompting
    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    /// Show `request` and wait for yes or no.
    ///
    /// Bypassed gates approve immediately. Unrecognised answers re-prompt;
    /// end of input counts as no.
    pub fn confirm(&mut self, request: &ConfirmationRequest<'_>) -> Result<bool> {
        if self.bypass {
            log::debug!("Confirmation bypassed: {}", request.action);
            return Ok(true);
        }

        print!("{}", request.prompt());
        std::io::stdout().flush()?;

        loop {
            let mut answer = String::new();
            if self.input.read_line(&mut answer)? == 0 {
                return Ok(false);
            }

            match answer.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => {
                    print!("Please answer yes or no. (yes|no) ");
                    std::io::stdout().flush()?;
                }
            }
        }
    }

    /// Like [`confirm`](Self::confirm), but a decline becomes `DeployError::Declined`
    pub fn require(
        &mut self,
        request: &ConfirmationRequest<'_>,
        cancel_message: &str,
    ) -> Result<()> {
        if self.confirm(request)? {
            Ok(())
        } else {
            Err(DeployError::Declined {
                message: cancel_message.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_bypass_never_reads_input() {
        // Empty input would count as "no" if it were read.
        let mut gate = ConfirmationGate::with_input(true, Cursor::new(Vec::new()));
        let request = ConfirmationRequest::with_command(
            "Create a Postgres database",
            "flyctl postgres create --name blog-db",
        );
        assert!(gate.confirm(&request).unwrap());
        assert!(gate.require(&request, "cancelled").is_ok());
    }

    #[test]
    fn test_yes_and_no_answers() {
        let mut gate = ConfirmationGate::with_input(false, Cursor::new(b"YES\nn\n".to_vec()));
        let request = ConfirmationRequest::new("Continue?");
        assert!(gate.confirm(&request).unwrap());
        assert!(!gate.confirm(&request).unwrap());
    }

    #[test]
    fn test_reprompts_until_clear_answer() {
        let mut gate =
            ConfirmationGate::with_input(false, Cursor::new(b"maybe\n\ny\n".to_vec()));
        assert!(gate.confirm(&ConfirmationRequest::new("Continue?")).unwrap());
    }

    #[test]
    fn test_decline_is_graceful_error() {
        let mut gate = ConfirmationGate::with_input(false, Cursor::new(b"no\n".to_vec()));
        let err = gate
            .require(&ConfirmationRequest::new("Continue?"), "Okay, cancelling.")
            .unwrap_err();
        assert!(err.is_declined());
        assert_eq!(err.to_string(), "Okay, cancelling.");
    }

    #[test]
    fn test_end_of_input_is_no() {
        let mut gate = ConfirmationGate::with_input(false, Cursor::new(Vec::new()));
        assert!(!gate.confirm(&ConfirmationRequest::new("Continue?")).unwrap());
    }

    #[test]
    fn test_prompt_shows_exact_command() {
        let request = ConfirmationRequest::with_command(
            "A database will be created.",
            "flyctl postgres create --name blog-db --region sea",
        );
        assert!(
            request
                .prompt()
                .contains("$ flyctl postgres create --name blog-db --region sea")
        );
    }
}
