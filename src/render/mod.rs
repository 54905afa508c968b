// SPDX-License-Identifier: GPL-3.0-only

//! Outcome rendering
//!
//! [`view`] maps capture results onto fixed fragments; [`panel`] holds the
//! fragment currently shown and guards it against stale writes.

pub mod panel;
pub mod view;

pub use panel::{ResultPanel, Ticket};
pub use view::{Action, ResultView, SearchRow, format_amount};
