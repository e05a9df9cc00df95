// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

/// Failure kinds raised by table operations. They travel inside
/// `anyhow::Error`; use `downcast_ref::<TableError>()` to branch on the kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// Bad caller input, detected before any driver interaction.
    Precondition(String),
    /// The control lacks the structure an operation needs.
    NotFound(String),
    /// The injected script replied with nothing usable.
    ScriptReply(String),
}

impl TableError {
    pub fn message(&self) -> &str {
        match self {
            Self::Precondition(message) | Self::NotFound(message) | Self::ScriptReply(message) => {
                message
            }
        }
    }
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Precondition(message) => write!(f, "precondition failed: {message}"),
            Self::NotFound(message) => write!(f, "not found: {message}"),
            Self::ScriptReply(message) => write!(f, "bad script reply: {message}"),
        }
    }
}

impl std::error::Error for TableError {}

/// Convenience for `matches!` on an `anyhow::Error` that may wrap a
/// [`TableError`].
pub fn table_error(error: &anyhow::Error) -> Option<&TableError> {
    error.downcast_ref::<TableError>()
}
