//! Desktop viewer for one-dimensional labeled arrays.
//!
//! ```text
//!  widgets ──RangeEvent──▶ RangeSynchronizer ──bounds──▶ PlotSurface
//!                                 ▲
//!  .nc / .json ──loader──▶ LabeledArray ──metadata──▶ side panel
//! ```

pub mod app;
pub mod cli;
pub mod data;
pub mod range;
pub mod state;
pub mod ui;
