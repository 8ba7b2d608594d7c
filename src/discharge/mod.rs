// src/discharge/mod.rs
pub mod channel;
pub mod error;
pub mod loader;
pub mod plot;
pub mod quantities;
pub mod shot;
pub mod stats;
pub mod summary;
pub mod units;

pub use channel::Channel;
pub use error::{DischargeError, DischargeResult};
pub use loader::{channel_path, read_channel, ChannelFile};
pub use plot::{figure_file_name, plot_shots, render_png, Figure, PlotConfig};
pub use quantities::{Calculator, ChannelKind, DischargeWindow, PhysicsConstants, FIELD_CHANNEL};
pub use shot::{ShotRecord, ShotSummary, SummaryField};
pub use summary::{render_summary, SummaryFormat};
pub use units::{unit_for, UNSPECIFIED_UNIT};
