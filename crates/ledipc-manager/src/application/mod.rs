//! Application layer use cases for the LED manager and its clients.
//!
//! # Sub-modules
//!
//! - **`route_request`** – Server side.  Decodes each incoming request,
//!   applies it to the state store and builds the response.
//!
//! - **`led_client`** – Client side.  Typed `update` / `query` calls on top of
//!   a transport session.
//!
//! - **`update_led`** / **`query_led`** – The interactive client personalities:
//!   read commands line by line, call the manager, print the outcome.
//!
//! - **`console`** – Output conventions shared by both personalities.

pub mod console;
pub mod led_client;
pub mod query_led;
pub mod route_request;
pub mod update_led;

/// The three ways the binary can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Personality {
    LedManager,
    UpdateLed,
    QueryLed,
}

impl Personality {
    /// Name used for the log file and in log lines.
    pub fn service_name(self) -> &'static str {
        match self {
            Personality::LedManager => "LedManager",
            Personality::UpdateLed => "UpdateLed",
            Personality::QueryLed => "QueryLed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_names_match_log_file_names() {
        assert_eq!(Personality::LedManager.service_name(), "LedManager");
        assert_eq!(Personality::UpdateLed.service_name(), "UpdateLed");
        assert_eq!(Personality::QueryLed.service_name(), "QueryLed");
    }
}
