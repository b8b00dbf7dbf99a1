//! Cutting-plan engine for frame shops.
//!
//! Mouldings are cut from fixed-length bars with First-Fit Decreasing
//! ([`pack_bars`]); glass, backing and passe-partout are cut from sheets with
//! guillotine splits and best-short-side-fit ([`pack_sheets`]). Both return a
//! [`CuttingPlanResult`] listing each stock unit's cuts, the waste totals and
//! any piece too large for the stock.

pub mod aggregate;
pub mod bar;
pub mod config;
pub mod error;
pub mod guillotine;
pub mod render;
pub mod solver;
pub mod types;

pub use bar::pack_bars;
pub use error::{PlanError, Result};
pub use solver::{expand_demands, pack_sheets};
pub use types::{CutPiece, CuttingPlanResult, Demand, Layout, PlacedPiece, Stock};
