//! Terminal output shared by the interactive clients.
//!
//! Results of calls go to the output stream, rejected input lines go to the
//! error stream.  The `> ` prompt is only written when the input is a
//! terminal, so piping a script into a client yields clean output.

use std::io;

use ledipc_core::StateResponse;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use super::led_client::ClientError;

pub const PROMPT: &str = "> ";

/// A line the user typed that is not a valid command.
///
/// The display text is exactly what the client prints on its error stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("Invalid command.")]
    InvalidCommand,

    #[error("Invalid input. LED name must be a number.")]
    InvalidLedNumber,
}

/// LED names typed at the console are non-empty runs of ASCII digits.
pub fn is_led_number(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_digit())
}

/// Reads the next input line, or `None` at end of input.
///
/// Bytes that are not UTF-8 are replaced rather than rejected, so such a line
/// is reported as invalid input instead of ending the session.  The line
/// terminator is kept; the command parsers trim it.
pub async fn read_line<R>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if input.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(buf).into_owned()))
}

/// Output and error streams of one interactive session.
pub struct Console<O, E> {
    out: O,
    err: E,
    interactive: bool,
}

impl<O, E> Console<O, E>
where
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    pub fn new(out: O, err: E, interactive: bool) -> Self {
        Self {
            out,
            err,
            interactive,
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    /// Writes one line to the output stream.
    pub async fn line(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes()).await?;
        self.out.write_all(b"\n").await?;
        self.out.flush().await
    }

    /// Writes one line to the error stream.
    pub async fn error_line(&mut self, text: &str) -> io::Result<()> {
        self.err.write_all(text.as_bytes()).await?;
        self.err.write_all(b"\n").await?;
        self.err.flush().await
    }

    /// Shows the prompt when attached to a terminal.
    pub async fn prompt(&mut self) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        self.out.write_all(PROMPT.as_bytes()).await?;
        self.out.flush().await
    }

    /// Prints the outcome of one call.
    pub async fn report(&mut self, outcome: &Result<StateResponse, ClientError>) -> io::Result<()> {
        self.line(&format_outcome(outcome)).await
    }

    /// Gives back the underlying streams.
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

/// Text printed for the outcome of one call.
///
/// ```text
/// Response: 1=on
/// Error: LED 7 not found
/// No response: operation timed out after 5s
/// ```
pub fn format_outcome(outcome: &Result<StateResponse, ClientError>) -> String {
    match outcome {
        Ok(response) if response.is_success() => format!("Response: {response}"),
        Ok(response) => format!("Error: {}", response.error_message),
        Err(e) if e.is_timeout() => format!("No response: {e}"),
        Err(e) => format!("Error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledipc_core::LedState;
    use ledipc_transport::TransportError;
    use std::time::Duration;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_led_numbers_are_digits_only() {
        assert!(is_led_number("1"));
        assert!(is_led_number("042"));
        assert!(!is_led_number(""));
        assert!(!is_led_number("a1"));
        assert!(!is_led_number("-1"));
        assert!(!is_led_number("1 "));
    }

    #[tokio::test]
    async fn test_read_line_survives_invalid_utf8() {
        // Arrange
        let mut input: &[u8] = b"\xff\xfe\n1\nlast";
        let mut buf = Vec::new();

        // Act
        let first = read_line(&mut input, &mut buf).await.unwrap();
        let second = read_line(&mut input, &mut buf).await.unwrap();
        let third = read_line(&mut input, &mut buf).await.unwrap();
        let end = read_line(&mut input, &mut buf).await.unwrap();

        // Assert
        assert_eq!(first, Some("\u{FFFD}\u{FFFD}\n".to_string()));
        assert_eq!(second, Some("1\n".to_string()));
        assert_eq!(third, Some("last".to_string()));
        assert_eq!(end, None);
    }

    #[test]
    fn test_format_success() {
        let outcome = Ok(StateResponse::success("1", LedState::On));
        assert_eq!(format_outcome(&outcome), "Response: 1=on");
    }

    #[test]
    fn test_format_error_response() {
        let outcome = Ok(StateResponse::failure("7", "LED 7 not found"));
        assert_eq!(format_outcome(&outcome), "Error: LED 7 not found");
    }

    #[test]
    fn test_format_timeout_is_no_response() {
        let outcome = Err(ClientError::Transport(TransportError::Timeout(
            Duration::from_secs(5),
        )));
        assert!(format_outcome(&outcome).starts_with("No response: "));
    }

    #[test]
    fn test_format_disconnect_is_error() {
        let outcome = Err(ClientError::Transport(TransportError::Closed));
        assert!(format_outcome(&outcome).starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_prompt_only_when_interactive() {
        // Arrange
        let mut piped = Console::new(Vec::new(), Vec::new(), false);
        let mut tty = Console::new(Vec::new(), Vec::new(), true);

        // Act
        piped.prompt().await.unwrap();
        tty.prompt().await.unwrap();

        // Assert
        assert_eq!(text(piped.into_parts().0), "");
        assert_eq!(text(tty.into_parts().0), PROMPT);
    }

    #[tokio::test]
    async fn test_error_lines_go_to_error_stream() {
        let mut console = Console::new(Vec::new(), Vec::new(), false);

        console.line("visible").await.unwrap();
        console.error_line("Invalid command.").await.unwrap();

        let (out, err) = console.into_parts();
        assert_eq!(text(out), "visible\n");
        assert_eq!(text(err), "Invalid command.\n");
    }
}
