// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Markup written into the host's barcode container.
//
// Fragments are opaque markup from the rendering endpoint and are inserted
// as-is.  Everything else (failure reasons, operator messages) is escaped.

use askama::Template;

use strichwerk_core::error::{Result, StrichwerkError};
use strichwerk_core::human_errors::HumanError;

/// One slot as the container template sees it.
#[derive(Debug, Clone, Copy)]
pub struct SlotView<'a> {
    pub index: u32,
    pub markup: &'a str,
    pub failed: bool,
    pub reason: &'a str,
}

impl<'a> SlotView<'a> {
    pub fn rendered(index: u32, markup: &'a str) -> Self {
        Self {
            index,
            markup,
            failed: false,
            reason: "",
        }
    }

    pub fn failed(index: u32, reason: &'a str) -> Self {
        Self {
            index,
            markup: "",
            failed: true,
            reason,
        }
    }
}

#[derive(Template)]
#[template(
    source = r#"<div class="barcode-batch" data-count="{{ slots.len() }}">
{%- for slot in slots %}
{%- if slot.failed %}
<div class="barcode-item barcode-error" data-index="{{ slot.index }}" title="{{ slot.reason }}">Barcode unavailable</div>
{%- else %}
<div class="barcode-item" data-index="{{ slot.index }}">{{ slot.markup|safe }}</div>
{%- endif %}
{%- endfor %}
</div>"#,
    ext = "html"
)]
struct ContainerTemplate<'a> {
    slots: &'a [SlotView<'a>],
}

#[derive(Template)]
#[template(
    source = r#"<div class="barcode-notice {{ css_class }}" role="alert"><strong>{{ message }}</strong> <span>{{ suggestion }}</span></div>"#,
    ext = "html"
)]
struct NoticeTemplate<'a> {
    css_class: &'a str,
    message: &'a str,
    suggestion: &'a str,
}

/// Assemble the container for slots already sorted by index.
pub fn compose_container(slots: &[SlotView<'_>]) -> Result<String> {
    ContainerTemplate { slots }
        .render()
        .map_err(|e| StrichwerkError::Template(format!("barcode container: {e}")))
}

/// Visible message shown in place of the container.
pub fn compose_notice(human: &HumanError) -> Result<String> {
    NoticeTemplate {
        css_class: human.severity.css_class(),
        message: &human.message,
        suggestion: &human.suggestion,
    }
    .render()
    .map_err(|e| StrichwerkError::Template(format!("notice: {e}")))
}
