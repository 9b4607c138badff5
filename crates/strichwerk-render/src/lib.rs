// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strichwerk render: collects the fragments of one batch, assembles them in
// slot order, and writes the result into the host surface unless a newer
// render has superseded it.

pub mod aggregator;
pub mod container;
pub mod controller;
pub mod host;

pub use aggregator::{Aggregator, BatchCommit, BatchState};
pub use controller::{RenderController, RenderOutcome};
pub use host::{FileHost, HostSurface, MemoryHost};
