// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Strichwerk barcode renderer.

use std::cell::RefCell;
use std::rc::Rc;

use lol_html::{RewriteStrSettings, element, rewrite_str};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StrichwerkError};

/// Raster format requested when the host markup does not name one.
pub const DEFAULT_FORMAT: &str = "png";

/// Number of copies rendered when the host markup does not name one.
pub const DEFAULT_QUANTITY: u32 = 1;

/// Hard ceiling on copies per batch. Every slot is allocated and fetched
/// up front, so this bounds memory and in-flight requests.
pub const MAX_QUANTITY: u32 = 1_000;

/// Unique identifier for a render request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic token tagging every batch started by a render controller.
///
/// Outcomes carrying an older generation than the controller's current one
/// are stale and must not touch the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Attributes as read verbatim from the host markup.
///
/// Nothing here is validated yet; see [`RenderRequest::from_attributes`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderAttributes {
    /// `data-barcode`: required.
    pub barcode: Option<String>,
    /// `data-format`: optional.
    pub format: Option<String>,
    /// `data-quantity`: optional, coerced leniently.
    pub quantity: Option<String>,
}

impl RenderAttributes {
    /// Read the attributes of the first element carrying `data-barcode`.
    ///
    /// Returns empty attributes when no such element exists, which later
    /// surfaces as [`StrichwerkError::MissingBarcode`].
    pub fn from_markup(html: &str) -> Result<Self> {
        let found: Rc<RefCell<Option<RenderAttributes>>> = Rc::new(RefCell::new(None));

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![element!("[data-barcode]", {
                    let found = Rc::clone(&found);
                    move |el| {
                        let mut slot = found.borrow_mut();
                        if slot.is_none() {
                            *slot = Some(RenderAttributes {
                                barcode: el.get_attribute("data-barcode"),
                                format: el.get_attribute("data-format"),
                                quantity: el.get_attribute("data-quantity"),
                            });
                        }
                        Ok(())
                    }
                })],
                ..RewriteStrSettings::default()
            },
        )
        .map_err(|e| StrichwerkError::InvalidInput(format!("unreadable host markup: {e}")))?;

        let attrs = found.borrow_mut().take().unwrap_or_default();
        Ok(attrs)
    }
}

/// Fallback values applied while coercing host attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderDefaults {
    pub format: String,
    pub quantity: u32,
    /// Largest quantity accepted from host attributes.
    pub max_quantity: u32,
}

impl Default for RenderDefaults {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.into(),
            quantity: DEFAULT_QUANTITY,
            max_quantity: MAX_QUANTITY,
        }
    }
}

/// One request to render `quantity` copies of a barcode.
///
/// Immutable once built; a new render always means a new request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    id: RequestId,
    barcode_value: String,
    format: String,
    quantity: u32,
}

impl RenderRequest {
    /// Build a request from already-typed values.
    ///
    /// The barcode value is trimmed and must not be empty. An empty format
    /// falls back to [`DEFAULT_FORMAT`]. Quantities above [`MAX_QUANTITY`]
    /// are rejected.
    pub fn new(barcode_value: &str, format: &str, quantity: u32) -> Result<Self> {
        let barcode_value = barcode_value.trim();
        if barcode_value.is_empty() {
            return Err(StrichwerkError::MissingBarcode);
        }
        if quantity > MAX_QUANTITY {
            return Err(too_many(quantity, MAX_QUANTITY));
        }
        let format = normalize_format(Some(format)).unwrap_or_else(|| DEFAULT_FORMAT.into());
        Ok(Self {
            id: RequestId::new(),
            barcode_value: barcode_value.to_string(),
            format,
            quantity,
        })
    }

    /// Build a request from raw host attributes.
    ///
    /// A missing or blank barcode is an input error, as is a quantity above
    /// `defaults.max_quantity`. Otherwise format and quantity never fail:
    /// anything unusable degrades to the supplied defaults.
    pub fn from_attributes(attrs: &RenderAttributes, defaults: &RenderDefaults) -> Result<Self> {
        let barcode = attrs.barcode.as_deref().unwrap_or_default();
        let format =
            normalize_format(attrs.format.as_deref()).unwrap_or_else(|| defaults.format.clone());
        let quantity = coerce_quantity(attrs.quantity.as_deref(), defaults.quantity);
        let limit = defaults.max_quantity.min(MAX_QUANTITY);
        if quantity > limit {
            return Err(too_many(quantity, limit));
        }
        Self::new(barcode, &format, quantity)
    }

    pub fn id(&self) -> RequestId {
        self.id
    }

    pub fn barcode_value(&self) -> &str {
        &self.barcode_value
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }
}

fn too_many(quantity: u32, limit: u32) -> StrichwerkError {
    StrichwerkError::InvalidInput(format!("quantity {quantity} exceeds the limit of {limit}"))
}

fn normalize_format(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_lowercase())
    }
}

/// Leniently read a quantity attribute.
///
/// Leading ASCII digits are taken (`"3.7"` is 3, `"4abc"` is 4). Blank,
/// signed, non-numeric, or overflowing input yields `default`.
pub fn coerce_quantity(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    let trimmed = raw.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    if digits_end == 0 {
        return default;
    }
    trimmed[..digits_end].parse::<u32>().unwrap_or(default)
}

/// What a single fetch produced for its slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FragmentBody {
    /// Opaque renderable markup returned by the endpoint.
    Rendered(String),
    /// The fetch failed; the slot is filled with a placeholder.
    Failed { reason: String },
}

impl FragmentBody {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Terminal result of one in-flight fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// Batch this outcome belongs to.
    pub generation: Generation,
    /// 0-based position in the batch.
    pub index: u32,
    pub body: FragmentBody,
    /// Arrival ordinal within the batch (0 = first to settle).
    pub completed_at: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_barcode_is_rejected() {
        let err = RenderRequest::new("   ", "png", 2).unwrap_err();
        assert!(matches!(err, StrichwerkError::MissingBarcode));
    }

    #[test]
    fn format_is_normalized() {
        let req = RenderRequest::new(" 12345 ", " SVG ", 1).unwrap();
        assert_eq!(req.barcode_value(), "12345");
        assert_eq!(req.format(), "svg");
    }

    #[test]
    fn quantity_coercion_is_lenient() {
        assert_eq!(coerce_quantity(Some("3"), 1), 3);
        assert_eq!(coerce_quantity(Some(" 3.7 "), 1), 3);
        assert_eq!(coerce_quantity(Some("4abc"), 1), 4);
        assert_eq!(coerce_quantity(Some("0"), 1), 0);
        assert_eq!(coerce_quantity(Some("-2"), 1), 1);
        assert_eq!(coerce_quantity(Some("abc"), 1), 1);
        assert_eq!(coerce_quantity(Some(""), 1), 1);
        assert_eq!(coerce_quantity(Some("99999999999"), 1), 1);
        assert_eq!(coerce_quantity(None, 5), 5);
    }

    #[test]
    fn oversized_quantity_is_rejected_before_allocation() {
        let attrs = RenderAttributes {
            barcode: Some("12345".into()),
            format: None,
            quantity: Some("4000000000".into()),
        };
        let err = RenderRequest::from_attributes(&attrs, &RenderDefaults::default()).unwrap_err();
        assert!(matches!(err, StrichwerkError::InvalidInput(_)));

        let err = RenderRequest::new("12345", "png", MAX_QUANTITY + 1).unwrap_err();
        assert!(matches!(err, StrichwerkError::InvalidInput(_)));
        assert!(RenderRequest::new("12345", "png", MAX_QUANTITY).is_ok());
    }

    #[test]
    fn configured_limit_applies_to_attributes() {
        let defaults = RenderDefaults {
            max_quantity: 10,
            ..RenderDefaults::default()
        };
        let attrs = |q: &str| RenderAttributes {
            barcode: Some("12345".into()),
            format: None,
            quantity: Some(q.into()),
        };
        assert_eq!(RenderRequest::from_attributes(&attrs("10"), &defaults).unwrap().quantity(), 10);
        assert!(RenderRequest::from_attributes(&attrs("11"), &defaults).is_err());
    }

    #[test]
    fn attributes_fall_back_to_defaults() {
        let attrs = RenderAttributes {
            barcode: Some("ABC-1".into()),
            format: Some("".into()),
            quantity: Some("many".into()),
        };
        let req = RenderRequest::from_attributes(&attrs, &RenderDefaults::default()).unwrap();
        assert_eq!(req.format(), DEFAULT_FORMAT);
        assert_eq!(req.quantity(), DEFAULT_QUANTITY);
    }

    #[test]
    fn missing_barcode_attribute_is_input_error() {
        let attrs = RenderAttributes::default();
        let err = RenderRequest::from_attributes(&attrs, &RenderDefaults::default()).unwrap_err();
        assert!(matches!(err, StrichwerkError::MissingBarcode));
    }

    #[test]
    fn markup_attributes_are_read_from_first_match() {
        let html = r#"<section>
            <div id="barcode" data-barcode="12345" data-format="png" data-quantity="3"></div>
            <div data-barcode="ignored"></div>
        </section>"#;
        let attrs = RenderAttributes::from_markup(html).unwrap();
        assert_eq!(attrs.barcode.as_deref(), Some("12345"));
        assert_eq!(attrs.format.as_deref(), Some("png"));
        assert_eq!(attrs.quantity.as_deref(), Some("3"));
    }

    #[test]
    fn markup_without_barcode_element_is_empty() {
        let attrs = RenderAttributes::from_markup("<p>nothing here</p>").unwrap();
        assert_eq!(attrs, RenderAttributes::default());
    }

    #[test]
    fn generations_advance() {
        let g = Generation(7);
        assert_eq!(g.next(), Generation(8));
        assert!(g.next() > g);
    }
}
