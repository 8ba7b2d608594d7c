use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::Serialize;

use crate::discharge::quantities::{Calculator, ChannelKind, DischargeWindow};
use crate::discharge::loader::{channel_path, read_channel};
use crate::discharge::{Channel, DischargeError, DischargeResult};

/// Scalar results derived while channels are loaded. `None` until the
/// channel they come from has been processed.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ShotSummary {
    pub discharge: Option<DischargeWindow>,
    pub peak_current: Option<f64>,
    pub peak_density: Option<f64>,
    pub average_density: Option<f64>,
    pub peak_field: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SummaryField {
    DischargeStart,
    DischargeEnd,
    DischargeDuration,
    PeakCurrent,
    PeakDensity,
    AverageDensity,
    PeakField,
}

impl SummaryField {
    pub const ALL: [SummaryField; 7] = [
        SummaryField::DischargeStart,
        SummaryField::DischargeEnd,
        SummaryField::DischargeDuration,
        SummaryField::PeakCurrent,
        SummaryField::PeakDensity,
        SummaryField::AverageDensity,
        SummaryField::PeakField,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SummaryField::DischargeStart => "Discharge start [ms]",
            SummaryField::DischargeEnd => "Discharge end [ms]",
            SummaryField::DischargeDuration => "Discharge duration [ms]",
            SummaryField::PeakCurrent => "Peak plasma current [A]",
            SummaryField::PeakDensity => "Peak density [m**-3]",
            SummaryField::AverageDensity => "Average density [m**-3]",
            SummaryField::PeakField => "Peak toroidal field [T]",
        }
    }
}

impl ShotSummary {
    pub fn discharge_duration(&self) -> Option<f64> {
        self.discharge.map(|w| w.duration())
    }

    pub fn get(&self, field: SummaryField) -> Option<f64> {
        match field {
            SummaryField::DischargeStart => self.discharge.map(|w| w.start),
            SummaryField::DischargeEnd => self.discharge.map(|w| w.end),
            SummaryField::DischargeDuration => self.discharge_duration(),
            SummaryField::PeakCurrent => self.peak_current,
            SummaryField::PeakDensity => self.peak_density,
            SummaryField::AverageDensity => self.average_density,
            SummaryField::PeakField => self.peak_field,
        }
    }

    pub fn require(&self, field: SummaryField) -> DischargeResult<f64> {
        self.get(field)
            .ok_or(DischargeError::UndefinedSummary(field.label()))
    }
}

/// Everything loaded for one discharge.
#[derive(Clone, Debug)]
pub struct ShotRecord {
    shot: u32,
    dir: PathBuf,
    acquired: Option<String>,
    date_checked: bool,
    channels: BTreeMap<String, Channel>,
    summary: ShotSummary,
    calculator: Calculator,
}

impl ShotRecord {
    /// Record for `<output_dir>/<shot>`.
    pub fn new(shot: u32, output_dir: impl AsRef<Path>) -> Self {
        Self::with_calculator(shot, output_dir, Calculator::default())
    }

    pub fn with_calculator(
        shot: u32,
        output_dir: impl AsRef<Path>,
        calculator: Calculator,
    ) -> Self {
        let dir = output_dir.as_ref().join(shot.to_string());
        info!("Shot {shot}: data in {}", dir.display());
        Self {
            shot,
            dir,
            acquired: None,
            date_checked: false,
            channels: BTreeMap::new(),
            summary: ShotSummary::default(),
            calculator,
        }
    }

    pub fn shot(&self) -> u32 {
        self.shot
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `Create` stamp of the first channel loaded into this record.
    pub fn acquired(&self) -> Option<&str> {
        self.acquired.as_deref()
    }

    pub fn summary(&self) -> &ShotSummary {
        &self.summary
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(String::as_str)
    }

    pub fn load_channel(&mut self, name: &str) -> DischargeResult<()> {
        let path = channel_path(&self.dir, name);
        info!("Shot {}: loading {name} from {}", self.shot, path.display());
        let file = read_channel(&path, name)?;
        self.insert_channel(file.channel, file.created)
    }

    /// Loads in order, stopping at the first failure. Channels loaded before
    /// the failure stay in place.
    pub fn load_channels<I, S>(&mut self, names: I) -> DischargeResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.load_channel(name.as_ref())?;
        }
        Ok(())
    }

    /// Stores a channel and runs whatever derivation its name triggers.
    /// Nothing is changed if the derivation fails.
    pub fn insert_channel(
        &mut self,
        channel: Channel,
        created: Option<String>,
    ) -> DischargeResult<()> {
        let mut summary = self.summary.clone();
        let mut derived = None;
        match ChannelKind::of(channel.name()) {
            ChannelKind::Density => {
                let density = self.calculator.density_channel(&channel)?;
                summary.peak_density = self.calculator.peak(&density);
                summary.average_density = summary
                    .discharge
                    .and_then(|w| density.window_mean(w.start, w.end));
                debug!(
                    "Shot {}: {} peak {:?}, mean over discharge {:?}",
                    self.shot,
                    density.name(),
                    summary.peak_density,
                    summary.average_density
                );
                derived = Some(density);
            }
            ChannelKind::Field => {
                let field = self.calculator.field_channel(&channel);
                summary.peak_field = self.calculator.peak(&field);
                debug!("Shot {}: peak field {:?}", self.shot, summary.peak_field);
                derived = Some(field);
            }
            ChannelKind::Current => {
                let window = self.calculator.discharge_window(&channel)?;
                // The density average belongs to the window it was taken over.
                if summary.discharge != Some(window) {
                    summary.average_density = None;
                }
                summary.discharge = Some(window);
                summary.peak_current = self.calculator.peak(&channel);
                info!(
                    "Shot {}: discharge {:.3} .. {:.3} ms ({:.3} ms)",
                    self.shot,
                    window.start,
                    window.end,
                    window.duration()
                );
            }
            ChannelKind::Plain => {}
        }

        if !self.date_checked {
            self.date_checked = true;
            self.acquired = created;
        }
        self.summary = summary;
        if let Some(derived) = derived {
            self.channels.insert(derived.name().to_owned(), derived);
        }
        self.channels.insert(channel.name().to_owned(), channel);
        Ok(())
    }

    pub fn require_channel(&self, name: &str) -> DischargeResult<&Channel> {
        self.channel(name).ok_or_else(|| DischargeError::MissingChannel {
            shot: self.shot,
            channel: name.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::discharge::loader::HEADER_LINES;

    fn write_channel(root: &Path, shot: u32, name: &str, create: &str, points: &[(f64, f64)]) {
        let dir = root.join(shot.to_string());
        fs::create_dir_all(&dir).unwrap();
        let mut text = format!("Create = {create}\n");
        text.push_str(&"# header\n".repeat(HEADER_LINES - 1));
        for (t, v) in points {
            text.push_str(&format!("{t} {v}\n"));
        }
        fs::write(dir.join(format!("{name}.txt")), text).unwrap();
    }

    fn current_trace() -> Vec<(f64, f64)> {
        [0.0, 0.0, 1.0, 6.0, 8.0, 6.0, 1.0, 0.0, 0.0]
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i as f64, v))
            .collect()
    }

    fn density_trace() -> Vec<(f64, f64)> {
        (0..9).map(|i| (i as f64, if (2..=6).contains(&i) { 1.0 } else { 0.0 })).collect()
    }

    #[test]
    fn current_then_density_defines_average() {
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 101, "IP1", "day one", &current_trace());
        write_channel(root.path(), 101, "HCN1", "day two", &density_trace());
        let mut shot = ShotRecord::new(101, root.path());
        shot.load_channels(["IP1", "HCN1"]).unwrap();

        let summary = shot.summary();
        assert_eq!(summary.discharge_duration(), Some(4.0));
        let avg = summary.average_density.unwrap();
        assert!((avg - 1.7e19 / 5.0).abs() / avg < 1e-12);
        assert!(shot.channel("NE1").is_some());
        assert_eq!(shot.acquired(), Some("day one"));
    }

    #[test]
    fn density_before_current_leaves_average_undefined() {
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 102, "IP1", "d", &current_trace());
        write_channel(root.path(), 102, "HCN2", "d", &density_trace());
        let mut shot = ShotRecord::new(102, root.path());
        shot.load_channels(["HCN2", "IP1"]).unwrap();

        let summary = shot.summary();
        assert!(summary.peak_density.is_some());
        assert_eq!(summary.average_density, None);
        assert!(matches!(
            summary.require(SummaryField::AverageDensity),
            Err(DischargeError::UndefinedSummary(_))
        ));
        assert_eq!(summary.require(SummaryField::DischargeStart).unwrap(), 2.0);
    }

    #[test]
    fn new_current_window_drops_old_density_average() {
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 106, "IP1", "d", &current_trace());
        let mut wider = current_trace();
        wider[1].1 = 5.0;
        write_channel(root.path(), 106, "IP2", "d", &wider);
        write_channel(root.path(), 106, "HCN1", "d", &density_trace());
        let mut shot = ShotRecord::new(106, root.path());
        shot.load_channels(["IP1", "HCN1"]).unwrap();
        assert!(shot.summary().average_density.is_some());

        shot.load_channel("IP1").unwrap();
        assert!(shot.summary().average_density.is_some());

        shot.load_channel("IP2").unwrap();
        assert_eq!(shot.summary().discharge.unwrap().start, 1.0);
        assert_eq!(shot.summary().average_density, None);
    }

    #[test]
    fn reloading_replaces_channel() {
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 103, "IT1", "d", &[(0.0, -6500.0), (1.0, -6500.0)]);
        let mut shot = ShotRecord::new(103, root.path());
        shot.load_channel("IT1").unwrap();
        let first = shot.channel("BT0").cloned().unwrap();
        shot.load_channel("IT1").unwrap();
        assert_eq!(shot.channel("BT0"), Some(&first));
        assert_eq!(shot.channel("IT1").unwrap().len(), 2);
        assert_eq!(shot.channel_names().collect::<Vec<_>>(), vec!["BT0", "IT1"]);
        let bt = shot.summary().peak_field.unwrap();
        assert!((bt - 1.2820298031567656).abs() < 1e-12);
    }

    #[test]
    fn failed_loads_leave_record_untouched() {
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 104, "HCN1", "d", &density_trace());
        write_channel(root.path(), 104, "IP1", "d", &[(0.0, 0.0), (1.0, 0.0)]);
        let mut shot = ShotRecord::new(104, root.path());
        shot.load_channel("HCN1").unwrap();
        let before = shot.summary().clone();

        assert!(matches!(
            shot.load_channel("IP1"),
            Err(DischargeError::NoDischargeDetected { .. })
        ));
        assert!(matches!(
            shot.load_channel("VL1"),
            Err(DischargeError::MissingFile { .. })
        ));
        assert_eq!(shot.summary(), &before);
        assert!(shot.channel("IP1").is_none());
        assert!(shot.channel("NE1").is_some());
    }

    #[test]
    fn noisy_baseline_does_not_widen_window() {
        let mut rng = StdRng::seed_from_u64(7);
        let trace: Vec<(f64, f64)> = (0..400)
            .map(|i| {
                let t = i as f64 * 0.5;
                let plateau = if (50.0..150.0).contains(&t) { 80e3 } else { 0.0 };
                (t, plateau + rng.gen_range(-1e3..1e3))
            })
            .collect();
        let root = tempfile::tempdir().unwrap();
        write_channel(root.path(), 105, "IP1", "d", &trace);
        let mut shot = ShotRecord::new(105, root.path());
        shot.load_channel("IP1").unwrap();
        let window = shot.summary().discharge.unwrap();
        assert_eq!(window.start, 50.0);
        assert_eq!(window.end, 149.5);
        let peak = shot.summary().peak_current.unwrap();
        assert!(peak > 79e3 && peak < 81e3);
    }
}
