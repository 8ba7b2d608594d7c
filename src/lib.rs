//! Analysis of TT-1 tokamak discharges.
//!
//! A [`ShotRecord`] collects the channels exported for one shot. Loading
//! `IP*`, `HCN*` and `IT1`/`IT2` channels derives the discharge window,
//! line density (`NE*`) and toroidal field (`BT0`) along the way; the
//! records can then be summarised or plotted side by side.
//!
//! ```no_run
//! use tt1_analysis::{plot_shots, PlotConfig, ShotRecord};
//!
//! let mut shot = ShotRecord::new(1234, "output");
//! shot.load_channels(["IP1", "HCN1", "IT1"])?;
//! let config = PlotConfig { save: true, ..PlotConfig::default() };
//! plot_shots(&[shot], &["IP1", "NE1", "BT0"], &config)?;
//! # Ok::<(), tt1_analysis::DischargeError>(())
//! ```

pub mod config;
pub mod discharge;

pub use config::Config;
pub use discharge::*;
