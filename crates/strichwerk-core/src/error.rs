// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Strichwerk.

use thiserror::Error;

/// Top-level error type for all Strichwerk operations.
#[derive(Debug, Error)]
pub enum StrichwerkError {
    // -- Input errors (batch never starts) --
    #[error("barcode value is missing or empty")]
    MissingBarcode,

    #[error("invalid render input: {0}")]
    InvalidInput(String),

    // -- Fetch errors (contained per slot) --
    #[error("fragment request failed: {0}")]
    Fetch(String),

    #[error("fragment endpoint returned status {status}")]
    FetchStatus { status: u16 },

    #[error("fragment request timed out")]
    FetchTimeout,

    // -- Print surface --
    #[error("image resource failed to load: {0}")]
    ResourceLoad(String),

    #[error("template rendering failed: {0}")]
    Template(String),

    #[error("print command failed: {0}")]
    PrintCommand(String),

    #[error("nothing to print: no batch has been rendered yet")]
    NothingToPrint,

    // -- Configuration / persistence --
    #[error("configuration error: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Which part of the error taxonomy an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed host attributes. Shown to the user, batch not started.
    Input,
    /// A single fragment request failed. Recorded as a placeholder slot.
    Fetch,
    /// An image inside the print surface failed to load. Counts as settlement.
    ResourceLoad,
    /// The physical print step failed.
    Print,
    /// Anything else (config, I/O, templates).
    Internal,
}

impl StrichwerkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MissingBarcode | Self::InvalidInput(_) => ErrorCategory::Input,
            Self::Fetch(_) | Self::FetchStatus { .. } | Self::FetchTimeout => ErrorCategory::Fetch,
            Self::ResourceLoad(_) => ErrorCategory::ResourceLoad,
            Self::PrintCommand(_) | Self::NothingToPrint => ErrorCategory::Print,
            Self::Template(_) | Self::Config(_) | Self::Io(_) | Self::Serialization(_) => {
                ErrorCategory::Internal
            }
        }
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, StrichwerkError>;
