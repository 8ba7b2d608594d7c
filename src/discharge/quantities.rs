//! Derived quantities of a TT-1 discharge.
//!
//! - `HCN*` interferometer voltage -> line density `NE<n>` (5 V = 1.7e19 m^-3).
//! - `IT1`/`IT2` toroidal coil current -> toroidal field `BT0` (6500 A = 1.282 T).
//! - `IP*` plasma current -> discharge window where it exceeds 5 % of its maximum.
//!
//! Peaks are the mean of the samples above the 95th percentile.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::discharge::stats::peak_average;
use crate::discharge::{Channel, DischargeError, DischargeResult};

/// Name of the toroidal field channel derived from `IT1`/`IT2`.
pub const FIELD_CHANNEL: &str = "BT0";

/// Physical constants of the machine and its diagnostics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConstants {
    /// Density per volt of HCN interferometer signal (m^-3 / V).
    pub density_per_volt: f64,
    /// Toroidal field per amp of TF coil current (T / A).
    pub field_per_amp: f64,
    /// Fraction of the peak plasma current that marks the discharge.
    pub current_threshold_fraction: f64,
    /// Percentile above which samples count towards a peak value.
    pub peak_percentile: f64,
    /// Major radius (m).
    pub major_radius_m: f64,
    /// Minor radius (m).
    pub minor_radius_m: f64,
}

impl Default for PhysicsConstants {
    fn default() -> Self {
        Self {
            density_per_volt: 1.7e19 / 5.0,
            field_per_amp: 1.2820298031567656 / 6500.0,
            current_threshold_fraction: 0.05,
            peak_percentile: 95.0,
            major_radius_m: 0.65,
            minor_radius_m: 0.2,
        }
    }
}

/// Which derivation, if any, loading a channel triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    Density,
    Field,
    Current,
    Plain,
}

impl ChannelKind {
    pub fn of(name: &str) -> Self {
        if name.contains("HCN") {
            ChannelKind::Density
        } else if name.contains("IT1") || name.contains("IT2") {
            ChannelKind::Field
        } else if name.contains("IP") {
            ChannelKind::Current
        } else {
            ChannelKind::Plain
        }
    }
}

/// Interval (ms) during which the plasma current is above threshold.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct DischargeWindow {
    pub start: f64,
    pub end: f64,
}

impl DischargeWindow {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// `HCN1` -> `NE1`: the digit in fourth position names the chord.
pub fn density_channel_name(source: &str) -> DischargeResult<String> {
    source
        .chars()
        .nth(3)
        .and_then(|c| c.to_digit(10))
        .map(|chord| format!("NE{chord}"))
        .ok_or_else(|| DischargeError::InvalidChannelName {
            name: source.to_owned(),
            reason: "expected a chord digit after the HCN prefix".into(),
        })
}

#[derive(Clone, Debug, Default)]
pub struct Calculator {
    constants: PhysicsConstants,
}

impl Calculator {
    pub fn new(constants: PhysicsConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &PhysicsConstants {
        &self.constants
    }

    pub fn density(&self, volts: f64) -> f64 {
        volts * self.constants.density_per_volt
    }

    pub fn field(&self, coil_amps: f64) -> f64 {
        coil_amps.abs() * self.constants.field_per_amp
    }

    pub fn density_channel(&self, source: &Channel) -> DischargeResult<Channel> {
        let name = density_channel_name(source.name())?;
        Ok(source.map_values(name, |v| self.density(v)))
    }

    pub fn field_channel(&self, source: &Channel) -> Channel {
        source.map_values(FIELD_CHANNEL, |v| self.field(v))
    }

    pub fn peak(&self, channel: &Channel) -> Option<f64> {
        peak_average(channel.values(), self.constants.peak_percentile)
    }

    pub fn discharge_window(&self, current: &Channel) -> DischargeResult<DischargeWindow> {
        let max = current.max_value().unwrap_or(0.0);
        let threshold = max * self.constants.current_threshold_fraction;
        let mut above = current.points().filter(|(_, v)| *v > threshold);
        let first = above.next();
        let last = above.last().or(first);
        match (first, last) {
            (Some((start, _)), Some((end, _))) => {
                debug!(
                    "{}: threshold {threshold:.4e}, discharge {start} .. {end}",
                    current.name()
                );
                Ok(DischargeWindow { start, end })
            }
            _ => Err(DischargeError::NoDischargeDetected {
                channel: current.name().to_owned(),
                threshold,
            }),
        }
    }
}
