//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and the resolved
//! configuration the binary runs with.

use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

use crate::client::{BASE_URL_ENV, resolve_base_url};
use crate::identity::FileStore;

/// Command-line arguments for the ragchat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat service.
    #[arrrg(
        optional,
        "Service URL (default: $RAGCHAT_API_URL or http://localhost:8000)",
        "URL"
    )]
    pub base_url: Option<String>,

    /// File that persists the session identifier.
    #[arrrg(optional, "State file holding the session identifier", "PATH")]
    pub state_file: Option<String>,

    /// Keep the session identifier in memory only.
    #[arrrg(flag, "Start a fresh session that is not persisted")]
    pub ephemeral: bool,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: none)", "SECONDS")]
    pub timeout: Option<u64>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Do not print the stored transcript on startup.
    #[arrrg(flag, "Do not print the stored conversation on startup")]
    pub no_history: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL of the chat service.
    pub base_url: String,

    /// Where the session identifier is persisted. `None` keeps it in memory.
    pub state_path: Option<PathBuf>,

    /// Optional per-request timeout.
    pub timeout: Option<Duration>,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to print the stored transcript on startup.
    pub show_history: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: `$RAGCHAT_API_URL` or `http://localhost:8000`
    /// - State: the per-user data directory
    /// - Timeout: none
    /// - Color: enabled
    pub fn new() -> Self {
        Self {
            base_url: resolve_base_url(None, std::env::var(BASE_URL_ENV).ok()),
            state_path: FileStore::default_location(),
            timeout: None,
            use_color: true,
            show_history: true,
        }
    }

    /// Sets the service base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = resolve_base_url(Some(base_url.into()), None);
        self
    }

    /// Sets where the session identifier is persisted.
    pub fn with_state_path(mut self, path: Option<PathBuf>) -> Self {
        self.state_path = path;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Skips printing the stored transcript on startup.
    pub fn without_history(mut self) -> Self {
        self.show_history = false;
        self
    }

    fn from_args(args: ChatArgs, from_env: Option<String>) -> Self {
        let state_path = if args.ephemeral {
            None
        } else {
            args.state_file
                .map(PathBuf::from)
                .or_else(FileStore::default_location)
        };
        ChatConfig {
            base_url: resolve_base_url(args.base_url, from_env),
            state_path,
            timeout: args.timeout.map(Duration::from_secs),
            use_color: !args.no_color,
            show_history: !args.no_history,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        Self::from_args(args, std::env::var(BASE_URL_ENV).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::DEFAULT_BASE_URL;

    #[test]
    fn config_from_args_defaults() {
        let config = ChatConfig::from_args(ChatArgs::default(), None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.state_path, FileStore::default_location());
        assert!(config.timeout.is_none());
        assert!(config.use_color);
        assert!(config.show_history);
    }

    #[test]
    fn environment_beats_default() {
        let config =
            ChatConfig::from_args(ChatArgs::default(), Some("http://rag:9000/".to_string()));
        assert_eq!(config.base_url, "http://rag:9000");
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("https://chat.example.com/".to_string()),
            state_file: Some("/tmp/ragchat.json".to_string()),
            ephemeral: false,
            timeout: Some(30),
            no_color: true,
            no_history: true,
        };
        let config = ChatConfig::from_args(args, Some("http://ignored".to_string()));
        assert_eq!(config.base_url, "https://chat.example.com");
        assert_eq!(config.state_path, Some(PathBuf::from("/tmp/ragchat.json")));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
        assert!(!config.use_color);
        assert!(!config.show_history);
    }

    #[test]
    fn ephemeral_drops_state_path() {
        let args = ChatArgs {
            state_file: Some("/tmp/ragchat.json".to_string()),
            ephemeral: true,
            ..ChatArgs::default()
        };
        let config = ChatConfig::from_args(args, None);
        assert!(config.state_path.is_none());
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("http://localhost:9999/")
            .with_state_path(None)
            .with_timeout(Some(Duration::from_secs(5)))
            .without_color()
            .without_history();

        assert_eq!(config.base_url, "http://localhost:9999");
        assert!(config.state_path.is_none());
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert!(!config.use_color);
        assert!(!config.show_history);
    }
}
