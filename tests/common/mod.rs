//! Common utilities for integration tests

use assert_cmd::Command;
use mockito::{Matcher, Mock, Server};
use std::path::PathBuf;

/// Path to the `tsh` binary built for this test run
pub fn tsh_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tsh"))
}

/// A `tsh` command isolated from the caller's configuration
#[allow(dead_code)]
pub fn tsh_command() -> Command {
    let mut cmd = Command::new(tsh_binary());
    cmd.env_remove("TSH_API_URL")
        .env_remove("TSH_TIMEOUT_SECS")
        .env_remove("TSH_LOG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

/// A `tsh` command pointed at `server`
#[allow(dead_code)]
pub fn tsh_against(server: &Server) -> Command {
    let mut cmd = tsh_command();
    cmd.arg("--api-url").arg(server.url());
    cmd
}

/// Mocks that fail `assert()` if any request reaches the server
#[allow(dead_code)]
pub fn forbid_requests(server: &mut Server) -> Vec<Mock> {
    ["GET", "POST", "PUT", "DELETE"]
        .into_iter()
        .map(|method| {
            server
                .mock(method, Matcher::Any)
                .with_status(500)
                .expect(0)
                .create()
        })
        .collect()
}

/// Async variant of [`forbid_requests`]
#[allow(dead_code)]
pub async fn forbid_requests_async(server: &mut Server) -> Vec<Mock> {
    let mut mocks = Vec::new();
    for method in ["GET", "POST", "PUT", "DELETE"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .with_status(500)
                .expect(0)
                .create_async()
                .await,
        );
    }
    mocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tsh_binary_exists() {
        let binary = tsh_binary();
        assert!(binary.exists(), "tsh binary should exist at {:?}", binary);
    }
}
