// Copyright 2025 New Vector Ltd.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE files in the repository root for full details.

//! Log levels and the dispatch of log events to an application callback.

use std::{fmt, str::FromStr, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The severity of a log event emitted by the identity client.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum LogLevel {
    /// An error.
    Error,

    /// A warning.
    Warning,

    /// An informational message.
    Info,

    /// A detailed message.
    Verbose,
}

impl LogLevel {
    /// All the levels, the most severe first.
    pub const ALL: [Self; 4] = [Self::Error, Self::Warning, Self::Info, Self::Verbose];

    /// The names used in dynamic objects.
    pub const NAMES: &'static [&'static str] = &["Error", "Warning", "Info", "Verbose"];

    /// Get the string representation of this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Verbose => "Verbose",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The error when parsing a [`LogLevel`] from a string.
#[derive(Debug, Clone, Error)]
#[error("Invalid log level {0:?}")]
pub struct InvalidLogLevelError(String);

impl FromStr for LogLevel {
    type Err = InvalidLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Error" => Ok(Self::Error),
            "Warning" => Ok(Self::Warning),
            "Info" => Ok(Self::Info),
            "Verbose" => Ok(Self::Verbose),
            s => Err(InvalidLogLevelError(s.to_owned())),
        }
    }
}

type CallbackFn = dyn Fn(LogLevel, &str, bool) + Send + Sync;

/// An application-supplied function receiving log events.
///
/// It is called with the level, the message, and whether the message
/// contains personally identifiable information.
#[derive(Clone)]
pub struct LoggerCallback(Arc<CallbackFn>);

impl LoggerCallback {
    /// Wrap a function as a logger callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(LogLevel, &str, bool) + Send + Sync + 'static,
    {
        Self(Arc::new(callback))
    }

    /// A callback forwarding events to `tracing`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(|level, message, _contains_pii| forward_to_tracing(level, message))
    }

    /// Invoke the callback.
    pub fn call(&self, level: LogLevel, message: &str, contains_pii: bool) {
        (self.0)(level, message, contains_pii);
    }
}

impl fmt::Debug for LoggerCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LoggerCallback").finish_non_exhaustive()
    }
}

/// Two callbacks are equal if they wrap the same function.
impl PartialEq for LoggerCallback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for LoggerCallback {}

fn forward_to_tracing(level: LogLevel, message: &str) {
    match level {
        LogLevel::Error => tracing::error!(target: "msal", "{message}"),
        LogLevel::Warning => tracing::warn!(target: "msal", "{message}"),
        LogLevel::Info => tracing::info!(target: "msal", "{message}"),
        LogLevel::Verbose => tracing::debug!(target: "msal", "{message}"),
    }
}

/// Dispatches log events to a [`LoggerCallback`], suppressing those which
/// contain personally identifiable information unless allowed to.
///
/// Without a callback, events go to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    callback: Option<LoggerCallback>,
    pii_logging_enabled: bool,
}

impl Logger {
    /// Create a new logger.
    #[must_use]
    pub fn new(callback: Option<LoggerCallback>, pii_logging_enabled: bool) -> Self {
        Self {
            callback,
            pii_logging_enabled,
        }
    }

    /// Whether events containing personally identifiable information are
    /// dispatched.
    #[must_use]
    pub fn pii_logging_enabled(&self) -> bool {
        self.pii_logging_enabled
    }

    /// Dispatch a log event.
    ///
    /// The callback is invoked exactly once, unless the message contains
    /// personally identifiable information and those are not allowed, in which
    /// case it is not invoked at all.
    pub fn log(&self, level: LogLevel, message: &str, contains_pii: bool) {
        if contains_pii && !self.pii_logging_enabled {
            tracing::trace!(%level, "Suppressing log event containing PII");
            return;
        }

        match &self.callback {
            Some(callback) => callback.call(level, message, contains_pii),
            None => forward_to_tracing(level, message),
        }
    }

    /// Log an error.
    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message, false);
    }

    /// Log an error containing personally identifiable information.
    pub fn error_pii(&self, message: &str) {
        self.log(LogLevel::Error, message, true);
    }

    /// Log a warning.
    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message, false);
    }

    /// Log a warning containing personally identifiable information.
    pub fn warning_pii(&self, message: &str) {
        self.log(LogLevel::Warning, message, true);
    }

    /// Log an informational message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message, false);
    }

    /// Log an informational message containing personally identifiable
    /// information.
    pub fn info_pii(&self, message: &str) {
        self.log(LogLevel::Info, message, true);
    }

    /// Log a detailed message.
    pub fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message, false);
    }

    /// Log a detailed message containing personally identifiable
    /// information.
    pub fn verbose_pii(&self, message: &str) {
        self.log(LogLevel::Verbose, message, true);
    }
}
