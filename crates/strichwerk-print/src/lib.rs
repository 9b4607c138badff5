// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Strichwerk print: opens an isolated print surface around the rendered
// container, waits until every image in it has settled (loaded or broken),
// then hands it to the print command exactly once.

pub mod command;
pub mod gate;
pub mod loader;
pub mod settlement;
pub mod surface;

pub use command::{PrintCommand, SpoolPrinter, SystemPrintCommand};
pub use gate::{PrintGate, PrintReport};
pub use loader::{DataUriLoader, HttpResourceLoader, LoadState, ResourceLoader};
pub use settlement::SettlementCounter;
pub use surface::{PrintSurface, contains_batch};
