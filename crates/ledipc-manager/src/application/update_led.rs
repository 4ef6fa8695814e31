//! The update-led client: switches LEDs on and off.
//!
//! # Commands
//!
//! | Line   | Effect              |
//! |--------|---------------------|
//! | `N`    | turn LED `N` on     |
//! | `!N`   | turn LED `N` off    |
//! | `exit` | quit (as does EOF)  |
//!
//! Empty lines are ignored.  Targets given as `--led<N>` on the command line
//! are switched on before the greeting is shown.

use std::io;

use ledipc_core::LedState;
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::info;

use super::console::{is_led_number, read_line, Console, InputError};
use super::led_client::LedService;

pub const GREETING: &str = "Welcome to the UpdateLed client!";
pub const INSTRUCTIONS: &str = "Enter command ('1' for on, '!1' for off), or 'exit' to quit.";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateCommand {
    Set { target: String, state: LedState },
    Skip,
    Exit,
}

/// Parses one input line.  Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`InputError::InvalidCommand`] when the LED name is missing or
/// not a number.
pub fn parse_update_command(line: &str) -> Result<UpdateCommand, InputError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(UpdateCommand::Skip);
    }
    if line == "exit" {
        return Ok(UpdateCommand::Exit);
    }

    let (target, state) = match line.strip_prefix('!') {
        Some(rest) => (rest, LedState::Off),
        None => (line, LedState::On),
    };
    if !is_led_number(target) {
        return Err(InputError::InvalidCommand);
    }
    Ok(UpdateCommand::Set {
        target: target.to_string(),
        state,
    })
}

async fn send_update<S, O, E>(
    client: &mut S,
    console: &mut Console<O, E>,
    target: &str,
    state: LedState,
) -> io::Result<()>
where
    S: LedService + ?Sized,
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    info!(led = %target, state = %state, "sending update");
    let outcome = client.update(target, state).await;
    if let Err(e) = &outcome {
        info!(led = %target, "update got no response: {e}");
    }
    console.report(&outcome).await
}

/// Runs the update-led session until `exit` or end of input.
///
/// Call failures are printed and the loop continues; only errors writing to
/// the console end the session early.
///
/// # Errors
///
/// Returns the I/O error from reading `input` or writing to `console`.
pub async fn run_update_led<S, R, O, E>(
    client: &mut S,
    initial_targets: &[String],
    input: R,
    console: &mut Console<O, E>,
) -> io::Result<()>
where
    S: LedService + ?Sized,
    R: AsyncBufRead + Unpin,
    O: AsyncWrite + Unpin + Send,
    E: AsyncWrite + Unpin + Send,
{
    for target in initial_targets {
        send_update(client, console, target, LedState::On).await?;
    }

    console.line(GREETING).await?;
    console.line(INSTRUCTIONS).await?;

    let mut input = input;
    let mut buf = Vec::new();
    loop {
        console.prompt().await?;
        let Some(line) = read_line(&mut input, &mut buf).await? else {
            break;
        };
        match parse_update_command(&line) {
            Ok(UpdateCommand::Exit) => break,
            Ok(UpdateCommand::Skip) => {}
            Ok(UpdateCommand::Set { target, state }) => {
                send_update(client, console, &target, state).await?;
            }
            Err(e) => console.error_line(&e.to_string()).await?,
        }
    }

    info!("update-led session finished");
    Ok(())
}
