// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Print surface: a short-lived document holding a copy of the container.
//
// A surface is built synchronously, observed while its images settle, and
// then moved into the print command.  It is never reused; printing again
// opens a new one.

use std::cell::RefCell;
use std::rc::Rc;

use askama::Template;
use chrono::{DateTime, Utc};
use lol_html::{RewriteStrSettings, element, rewrite_str};
use tracing::debug;
use uuid::Uuid;

use strichwerk_core::error::{Result, StrichwerkError};

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{ title }}</title>
<style>
@page { margin: 8mm; }
body { margin: 0; font-family: sans-serif; }
.barcode-item { display: inline-block; margin: 4mm; page-break-inside: avoid; }
.barcode-error { color: #b00020; border: 1px dashed #b00020; padding: 2mm; }
</style>
</head>
<body>
{{ body|safe }}
</body>
</html>"#,
    ext = "html"
)]
struct PrintDocument<'a> {
    title: &'a str,
    body: &'a str,
}

/// Isolated rendering context for one print action.
#[derive(Debug)]
pub struct PrintSurface {
    id: Uuid,
    opened_at: DateTime<Utc>,
    document: String,
    images: Vec<String>,
}

impl PrintSurface {
    /// Open a surface whose entire body is `container`.
    pub fn open(container: &str) -> Result<Self> {
        let id = Uuid::new_v4();
        let title = format!("Barcode labels {}", &id.simple().to_string()[..8]);
        let document = PrintDocument {
            title: &title,
            body: container,
        }
        .render()
        .map_err(|e| StrichwerkError::Template(format!("print document: {e}")))?;
        let images = enumerate_images(container)?;

        debug!(surface = %id, images = images.len(), "print surface opened");
        Ok(Self {
            id,
            opened_at: Utc::now(),
            document,
            images,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Full HTML document handed to the print command.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// `src` of every embedded image, in document order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn into_document(self) -> String {
        self.document
    }
}

/// Collect the `src` of every `<img>` in `html`. Images without a usable
/// `src` never load or fail, so they are not tracked.
pub fn enumerate_images(html: &str) -> Result<Vec<String>> {
    let found: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("img[src]", {
                let found = Rc::clone(&found);
                move |el| {
                    if let Some(src) = el.get_attribute("src") {
                        let src = src.trim();
                        if !src.is_empty() {
                            found.borrow_mut().push(src.to_string());
                        }
                    }
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| StrichwerkError::Template(format!("scanning print surface: {e}")))?;

    let images = found.borrow_mut().drain(..).collect();
    Ok(images)
}

/// Whether `html` holds a rendered batch container rather than, say, an
/// input-error notice left in the same host.
pub fn contains_batch(html: &str) -> Result<bool> {
    let found = Rc::new(RefCell::new(false));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!("div.barcode-batch", {
                let found = Rc::clone(&found);
                move |_| {
                    *found.borrow_mut() = true;
                    Ok(())
                }
            })],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|e| StrichwerkError::Template(format!("scanning container: {e}")))?;

    let contains = *found.borrow();
    Ok(contains)
}
