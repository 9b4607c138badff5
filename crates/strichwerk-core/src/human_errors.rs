// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages for the dashboard operator.
//
// Input errors are written straight into the barcode container, so they need
// wording an operator can act on without reading logs.

use crate::error::StrichwerkError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Only part of the output is affected; the rest still renders.
    Partial,
    /// The operator must fix something before trying again.
    ActionRequired,
    /// Nothing the operator can do from the dashboard.
    Internal,
}

impl Severity {
    /// CSS modifier used when the message is shown in the host surface.
    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Partial => "notice-partial",
            Self::ActionRequired => "notice-action",
            Self::Internal => "notice-internal",
        }
    }
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the operator should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `StrichwerkError` into a `HumanError`.
pub fn humanize_error(err: &StrichwerkError) -> HumanError {
    match err {
        StrichwerkError::MissingBarcode => HumanError {
            message: "No barcode value was provided.".into(),
            suggestion: "Enter the product code to encode, then render again.".into(),
            severity: Severity::ActionRequired,
        },

        StrichwerkError::InvalidInput(detail) => HumanError {
            message: "The barcode settings could not be read.".into(),
            suggestion: format!("Check the barcode, format and quantity fields. ({detail})"),
            severity: Severity::ActionRequired,
        },

        StrichwerkError::FetchStatus { status } if *status == 404 => HumanError {
            message: "The barcode service was not found.".into(),
            suggestion: "Check the fragment endpoint address in the settings.".into(),
            severity: Severity::Partial,
        },

        StrichwerkError::FetchStatus { status } => HumanError {
            message: "The barcode service refused one of the labels.".into(),
            suggestion: format!("The other labels were still rendered. (HTTP {status})"),
            severity: Severity::Partial,
        },

        StrichwerkError::Fetch(_) | StrichwerkError::FetchTimeout => HumanError {
            message: "One of the labels could not be fetched.".into(),
            suggestion: "Check the connection to the server, then render again.".into(),
            severity: Severity::Partial,
        },

        StrichwerkError::ResourceLoad(_) => HumanError {
            message: "An image did not load before printing.".into(),
            suggestion: "The page was printed without it. Print again to retry.".into(),
            severity: Severity::Partial,
        },

        StrichwerkError::NothingToPrint => HumanError {
            message: "There is nothing to print yet.".into(),
            suggestion: "Render the barcodes first, then press print.".into(),
            severity: Severity::ActionRequired,
        },

        StrichwerkError::PrintCommand(detail) => HumanError {
            message: "The printer did not accept the page.".into(),
            suggestion: format!("Check that the printer is on and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        StrichwerkError::Config(detail) => HumanError {
            message: "The settings are invalid.".into(),
            suggestion: format!("Fix the configuration file. ({detail})"),
            severity: Severity::ActionRequired,
        },

        StrichwerkError::Template(_)
        | StrichwerkError::Io(_)
        | StrichwerkError::Serialization(_) => HumanError {
            message: "Something went wrong inside the barcode tool.".into(),
            suggestion: "Try again. If it keeps happening, send the log to support.".into(),
            severity: Severity::Internal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_barcode_needs_action() {
        let human = humanize_error(&StrichwerkError::MissingBarcode);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("barcode"));
    }

    #[test]
    fn not_found_points_at_endpoint() {
        let human = humanize_error(&StrichwerkError::FetchStatus { status: 404 });
        assert!(human.suggestion.contains("endpoint"));
        assert_eq!(human.severity, Severity::Partial);
    }

    #[test]
    fn io_is_internal() {
        let err = StrichwerkError::Io(std::io::Error::other("disk"));
        assert_eq!(humanize_error(&err).severity, Severity::Internal);
    }
}
