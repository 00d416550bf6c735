//! Where the key, recipient and amount for a transfer come from.

use std::io::{self, BufRead, IsTerminal, StdinLock, Stdout, Write};

use crate::blockchain::types::{TransferError, TransferResult};

/// Supplies the caller-controlled inputs of one transfer.
pub trait TransferSource {
    /// Hex-encoded private key of the sender.
    fn private_key(&mut self) -> TransferResult<String>;

    /// Recipient address text.
    fn recipient(&mut self) -> TransferResult<String>;

    /// Human-readable amount.
    fn amount(&mut self) -> TransferResult<f64>;
}

/// Inputs supplied programmatically.
pub struct FixedSource {
    private_key: String,
    recipient: String,
    amount: f64,
}

impl FixedSource {
    pub fn new(private_key: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self {
            private_key: private_key.into(),
            recipient: recipient.into(),
            amount,
        }
    }
}

impl TransferSource for FixedSource {
    fn private_key(&mut self) -> TransferResult<String> {
        Ok(self.private_key.clone())
    }

    fn recipient(&mut self) -> TransferResult<String> {
        Ok(self.recipient.clone())
    }

    fn amount(&mut self) -> TransferResult<f64> {
        Ok(self.amount)
    }
}

impl std::fmt::Debug for FixedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedSource")
            .field("recipient", &self.recipient)
            .field("amount", &self.amount)
            .finish_non_exhaustive()
    }
}

/// Line-oriented prompts. Values preset from flags skip their prompt.
///
/// The private key is never echoed when read from a terminal.
pub struct TerminalSource<R, W> {
    input: R,
    output: W,
    /// Read the key from the controlling terminal with echo disabled.
    hide_key_echo: bool,
    private_key: Option<String>,
    recipient: Option<String>,
    amount: Option<f64>,
}

impl TerminalSource<StdinLock<'static>, Stdout> {
    /// Prompt on stdout, read from stdin.
    pub fn stdio() -> Self {
        let stdin = io::stdin();
        let hide_key_echo = stdin.is_terminal();
        Self {
            hide_key_echo,
            ..Self::new(stdin.lock(), io::stdout())
        }
    }
}

impl<R: BufRead, W: Write> TerminalSource<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_key_echo: false,
            private_key: None,
            recipient: None,
            amount: None,
        }
    }

    pub fn with_private_key(mut self, private_key: Option<String>) -> Self {
        self.private_key = private_key;
        self
    }

    pub fn with_recipient(mut self, recipient: Option<String>) -> Self {
        self.recipient = recipient;
        self
    }

    pub fn with_amount(mut self, amount: Option<f64>) -> Self {
        self.amount = amount;
        self
    }

    fn prompt(&mut self, label: &str) -> TransferResult<String> {
        write!(self.output, "{label}: ").map_err(input_error)?;
        self.output.flush().map_err(input_error)?;

        let mut line = String::new();
        if self.input.read_line(&mut line).map_err(input_error)? == 0 {
            return Err(TransferError::Input(format!("no input for '{label}'")));
        }
        Ok(line.trim().to_string())
    }

    fn prompt_secret(&mut self, label: &str) -> TransferResult<String> {
        let prompt = format!("{label}: ");
        let secret = if self.hide_key_echo {
            rpassword::prompt_password(prompt)
        } else {
            rpassword::prompt_password_from_bufread(&mut self.input, &mut self.output, prompt)
        };
        match secret {
            Ok(secret) if !secret.trim().is_empty() => Ok(secret.trim().to_string()),
            Ok(_) => Err(TransferError::Input(format!("no input for '{label}'"))),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(TransferError::Input(format!("no input for '{label}'")))
            }
            Err(e) => Err(input_error(e)),
        }
    }
}

fn input_error(e: io::Error) -> TransferError {
    TransferError::Input(e.to_string())
}

impl<R: BufRead, W: Write> TransferSource for TerminalSource<R, W> {
    fn private_key(&mut self) -> TransferResult<String> {
        match self.private_key.take() {
            Some(key) => Ok(key),
            None => self.prompt_secret("Sender private key"),
        }
    }

    fn recipient(&mut self) -> TransferResult<String> {
        match self.recipient.take() {
            Some(recipient) => Ok(recipient),
            None => self.prompt("Recipient address"),
        }
    }

    fn amount(&mut self) -> TransferResult<f64> {
        if let Some(amount) = self.amount.take() {
            return Ok(amount);
        }
        let text = self.prompt("Amount of tokens to send")?;
        text.parse()
            .map_err(|_| TransferError::InvalidAmount(format!("'{text}' is not a number")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_terminal_prompts_in_order() {
        let input = Cursor::new("0xabc\n 0x70997970C51812dc3A010C7d01b50e0d17dc79C8 \n25.5\n");
        let mut output = Vec::new();
        {
            let mut source = TerminalSource::new(input, &mut output);
            assert_eq!(source.private_key().unwrap(), "0xabc");
            assert_eq!(
                source.recipient().unwrap(),
                "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"
            );
            assert_eq!(source.amount().unwrap(), 25.5);
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Sender private key: "));
        assert!(shown.contains("Recipient address: "));
        assert!(shown.contains("Amount of tokens to send: "));
    }

    #[test]
    fn test_presets_skip_prompts() {
        let mut output = Vec::new();
        {
            let mut source = TerminalSource::new(Cursor::new("key-from-stdin\n"), &mut output)
                .with_recipient(Some("0x01".into()))
                .with_amount(Some(3.0));
            assert_eq!(source.recipient().unwrap(), "0x01");
            assert_eq!(source.amount().unwrap(), 3.0);
            assert_eq!(source.private_key().unwrap(), "key-from-stdin");
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(!shown.contains("Recipient"));
    }

    #[test]
    fn test_unparseable_amount() {
        let mut source = TerminalSource::new(Cursor::new("lots\n"), Vec::new());
        assert!(matches!(source.amount(), Err(TransferError::InvalidAmount(_))));
    }

    #[test]
    fn test_end_of_input() {
        let mut source = TerminalSource::new(Cursor::new(""), Vec::new());
        assert!(matches!(source.recipient(), Err(TransferError::Input(_))));
    }

    #[test]
    fn test_private_key_read_as_password() {
        let key = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
        let mut output = Vec::new();
        {
            let mut source = TerminalSource::new(Cursor::new(format!("{key}\r\n")), &mut output);
            assert_eq!(source.private_key().unwrap(), key);
        }
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with("Sender private key: "));
        assert!(!shown.contains(key));
    }

    #[test]
    fn test_private_key_end_of_input() {
        let mut source = TerminalSource::new(Cursor::new(""), Vec::new());
        assert!(matches!(source.private_key(), Err(TransferError::Input(_))));
    }

    #[test]
    fn test_fixed_source_debug_hides_key() {
        let source = FixedSource::new("deadbeef", "0x01", 1.0);
        assert!(!format!("{source:?}").contains("deadbeef"));
    }
}
