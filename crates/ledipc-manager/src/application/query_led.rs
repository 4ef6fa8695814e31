//! The query-led client: reads LED states.
//!
//! Each input line is an LED number; `exit` or end of input quits.

use std::io;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::info;

use super::console::{is_led_number, read_line, Console, InputError};
use super::led_client::LedService;

pub const GREETING: &str = "Welcome to the QueryLed client!";
pub const INSTRUCTIONS: &str = "Enter LED number to query (e.g., '1'), or 'exit' to quit.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryCommand {
    Query { target: String },
    Skip,
    Exit,
}

/// Parses one input line.  Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`InputError::InvalidLedNumber`] for anything but digits.
pub fn parse_query_command(line: &str) -> Result<QueryCommand, InputError> {
    match line.trim() {
        "" => Ok(QueryCommand::Skip),
        "exit" => Ok(QueryCommand::Exit),
        target if is_led_number(target) => Ok(QueryCommand::Query {
            target: target.to_string(),
        }),
        _ => Err(InputError::InvalidLedNumber),
    }
}

/// Runs the query-led session until `exit` or end of input.
///
/// # Errors
///
/// Returns the I/O error from reading `input` or writing to `console`.
pub async fn run_query_led<S, R, O, E>(
    client: &mut S,
    input: R,
    console: &mut Console<O, E>,
) -> io::Result<()>
where
    S: LedService + ?Sized,
    R: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    console.line(GREETING).await?;
    console.line(INSTRUCTIONS).await?;

    let mut input = input;
    let mut buf = Vec::new();
    loop {
        console.prompt().await?;
        let Some(line) = read_line(&mut input, &mut buf).await? else {
            break;
        };
        match parse_query_command(&line) {
            Ok(QueryCommand::Exit) => break,
            Ok(QueryCommand::Skip) => {}
            Ok(QueryCommand::Query { target }) => {
                info!(led = %target, "sending query");
                let outcome = client.query(&target).await;
                console.report(&outcome).await?;
            }
            Err(e) => console.error_line(&e.to_string()).await?,
        }
    }

    info!("query-led session finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::led_client::ClientError;
    use async_trait::async_trait;
    use ledipc_core::{LedState, StateResponse};
    use std::collections::HashMap;

    struct FakeLeds {
        states: HashMap<String, LedState>,
        queried: Vec<String>,
    }

    impl FakeLeds {
        fn with(states: &[(&str, LedState)]) -> Self {
            Self {
                states: states.iter().map(|(t, s)| (t.to_string(), *s)).collect(),
                queried: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl LedService for FakeLeds {
        async fn update(&mut self, _target: &str, _state: LedState) -> Result<StateResponse, ClientError> {
            unreachable!("query-led never updates")
        }

        async fn query(&mut self, target: &str) -> Result<StateResponse, ClientError> {
            self.queried.push(target.to_string());
            Ok(match self.states.get(target) {
                Some(state) => StateResponse::success(target, *state),
                None => StateResponse::failure(target, format!("LED {target} not found")),
            })
        }
    }

    #[test]
    fn test_parse_query_commands() {
        assert_eq!(
            parse_query_command(" 8 "),
            Ok(QueryCommand::Query {
                target: "8".to_string()
            })
        );
        assert_eq!(parse_query_command("exit"), Ok(QueryCommand::Exit));
        assert_eq!(parse_query_command(""), Ok(QueryCommand::Skip));
        assert_eq!(parse_query_command("!1"), Err(InputError::InvalidLedNumber));
        assert_eq!(parse_query_command("led1"), Err(InputError::InvalidLedNumber));
    }

    #[tokio::test]
    async fn test_session_prints_states_and_errors() {
        // Arrange
        let mut leds = FakeLeds::with(&[("1", LedState::On), ("2", LedState::Off)]);
        let mut console = Console::new(Vec::new(), Vec::new(), false);

        // Act
        run_query_led(&mut leds, "1\n2\n3\nabc\nexit\n1\n".as_bytes(), &mut console)
            .await
            .unwrap();

        // Assert
        let (out, err) = console.into_parts();
        assert_eq!(leds.queried, vec!["1", "2", "3"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!(
                "{GREETING}\n{INSTRUCTIONS}\nResponse: 1=on\nResponse: 2=off\nError: LED 3 not found\n"
            )
        );
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Invalid input. LED name must be a number.\n"
        );
    }

    #[tokio::test]
    async fn test_interactive_session_prompts_before_each_line() {
        let mut leds = FakeLeds::with(&[]);
        let mut console = Console::new(Vec::new(), Vec::new(), true);

        run_query_led(&mut leds, "exit\n".as_bytes(), &mut console).await.unwrap();

        let out = String::from_utf8(console.into_parts().0).unwrap();
        assert!(out.ends_with(&format!("{INSTRUCTIONS}\n> ")));
    }

    #[tokio::test]
    async fn test_non_utf8_line_is_invalid_and_session_continues() {
        let mut leds = FakeLeds::with(&[("4", LedState::Off)]);
        let mut console = Console::new(Vec::new(), Vec::new(), false);

        let result = run_query_led(&mut leds, &b"\xff\n4\n"[..], &mut console).await;

        assert!(result.is_ok());
        let (out, err) = console.into_parts();
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Invalid input. LED name must be a number.\n"
        );
        assert!(String::from_utf8(out).unwrap().ends_with("Response: 4=off\n"));
    }
}
