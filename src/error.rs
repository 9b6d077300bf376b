//! # Error Handling
//!
//! This module defines the centralized error type for `avatar-compose`. It
//! uses the `thiserror` library to build a single `Error` enum covering the
//! failure modes that can escape the composition engine.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all errors the library can return. Variants fall
//!   into three groups:
//!   - caller-contract violations (`LayerNotFound`, `LayerMissing`), which mean
//!     a feature touched the controller in the wrong order;
//!   - named builder failures (`Builder`), raised by feature authors when a
//!     request cannot be satisfied and shown to the user verbatim;
//!   - loading problems (`ConfigParse`, `Io`, `Yaml`, `Json`) from the CLI.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! Malformed host data (a missing state machine, a dangling synced layer
//! index, an override chain that ends nowhere) is never reported here. Those
//! cases are repaired where they are found.
//!
//! The build session wraps failing actions in `Error::Action`. Use
//! [`Error::root_cause`] to get back to the error that started it.

use thiserror::Error;

/// Main error type for avatar-compose operations
#[derive(Error, Debug)]
pub enum Error {
    /// A layer index was requested that the controller does not have.
    #[error("Layer {index} not found in controller. It may have been accessed after it was removed.")]
    LayerNotFound { index: usize },

    /// A layer was looked up by name and is not present.
    #[error("Layer '{name}' not found in controller. It may have been accessed after it was removed.")]
    LayerMissing { name: String },

    /// A feature could not be applied as authored.
    ///
    /// The message is meant for the person who configured the feature.
    #[error("{message}")]
    Builder { message: String },

    /// A feature action failed. Wraps the underlying error.
    #[error("Failed to apply {action}: {source}")]
    Action {
        action: String,
        #[source]
        source: Box<Error>,
    },

    /// An error occurred while parsing a build file.
    #[error("Configuration parsing error: {message}{}", hint.as_ref().map(|h| format!("\n  hint: {}", h)).unwrap_or_default())]
    ConfigParse {
        message: String,
        /// Optional hint for how to fix the configuration issue
        hint: Option<String>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Builder`] failure.
    pub fn builder(message: impl Into<String>) -> Self {
        Error::Builder {
            message: message.into(),
        }
    }

    /// Wrap this error as the failure of a named action.
    pub fn in_action(self, action: impl Into<String>) -> Self {
        Error::Action {
            action: action.into(),
            source: Box::new(self),
        }
    }

    /// Unwrap any number of [`Error::Action`] layers down to the real cause.
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Action { source, .. } = current {
            current = source;
        }
        current
    }

    /// Whether this error (after unwrapping) is a named builder failure.
    pub fn is_builder_failure(&self) -> bool {
        matches!(self.root_cause(), Error::Builder { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
