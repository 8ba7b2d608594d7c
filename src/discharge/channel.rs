use ndarray::{s, Array1};

use crate::discharge::{DischargeError, DischargeResult};

/// Upper bound on the grid produced by [`Channel::resample`].
pub const MAX_RESAMPLED_POINTS: usize = 10_000_000;

/// One named signal of a shot: times in ms, strictly increasing.
#[derive(Clone, Debug, PartialEq)]
pub struct Channel {
    name: String,
    times: Array1<f64>,
    values: Array1<f64>,
}

impl Channel {
    pub fn new(name: impl Into<String>, times: Vec<f64>, values: Vec<f64>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self {
            name: name.into(),
            times: Array1::from_vec(times),
            values: Array1::from_vec(values),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn times(&self) -> &Array1<f64> {
        &self.times
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }

    pub fn max_value(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    /// New channel sharing this time base with every value passed through `f`.
    pub fn map_values(&self, name: impl Into<String>, f: impl Fn(f64) -> f64) -> Channel {
        Channel {
            name: name.into(),
            times: self.times.clone(),
            values: self.values.mapv(f),
        }
    }

    /// Mean of the samples with `start <= t <= end`.
    pub fn window_mean(&self, start: f64, end: f64) -> Option<f64> {
        let (sum, count) = self
            .points()
            .filter(|(t, _)| *t >= start && *t <= end)
            .fold((0.0, 0usize), |(sum, count), (_, v)| (sum + v, count + 1));
        (count > 0).then(|| sum / count as f64)
    }

    /// Keeps samples from the first `t >= t_init` up to (excluding) the first
    /// `t >= t_final`. A `t_final` past the last sample keeps the tail.
    pub fn clip(&self, t_init: f64, t_final: f64) -> Channel {
        let len = self.len();
        let start = self.times.iter().position(|t| *t >= t_init).unwrap_or(len);
        let end = self
            .times
            .iter()
            .position(|t| *t >= t_final)
            .unwrap_or(len)
            .max(start);
        Channel {
            name: self.name.clone(),
            times: self.times.slice(s![start..end]).to_owned(),
            values: self.values.slice(s![start..end]).to_owned(),
        }
    }

    /// Linear interpolation onto a uniform grid starting at the first sample.
    pub fn resample(&self, period: f64) -> DischargeResult<Channel> {
        if !period.is_finite() || period <= 0.0 {
            return Err(DischargeError::InvalidConfig(format!(
                "resample period must be positive, got {period}"
            )));
        }
        let len = self.len();
        if len < 2 {
            return Ok(self.clone());
        }
        let t0 = self.times[0];
        let span = ((self.times[len - 1] - t0) / period).floor();
        if !span.is_finite() || span >= MAX_RESAMPLED_POINTS as f64 {
            return Err(DischargeError::InvalidConfig(format!(
                "resample period {period} gives more than {MAX_RESAMPLED_POINTS} points"
            )));
        }
        let steps = span as usize;
        let mut times = Vec::with_capacity(steps + 1);
        let mut values = Vec::with_capacity(steps + 1);
        let mut seg = 0;
        for k in 0..=steps {
            let t = t0 + k as f64 * period;
            while seg + 2 < len && self.times[seg + 1] < t {
                seg += 1;
            }
            let (ta, tb) = (self.times[seg], self.times[seg + 1]);
            let (va, vb) = (self.values[seg], self.values[seg + 1]);
            let frac = ((t - ta) / (tb - ta)).clamp(0.0, 1.0);
            times.push(t);
            values.push(va + frac * (vb - va));
        }
        Ok(Channel::new(self.name.clone(), times, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Channel {
        Channel::new("IP1", vec![0.0, 1.0, 2.0, 3.0, 4.0], vec![0.0, 10.0, 20.0, 30.0, 40.0])
    }

    #[test]
    fn clip_keeps_half_open_window() {
        let clipped = ramp().clip(1.0, 3.0);
        assert_eq!(clipped.times().to_vec(), vec![1.0, 2.0]);
        assert_eq!(clipped.values().to_vec(), vec![10.0, 20.0]);
    }

    #[test]
    fn clip_past_the_end_keeps_tail() {
        let clipped = ramp().clip(2.5, 1000.0);
        assert_eq!(clipped.times().to_vec(), vec![3.0, 4.0]);
        assert!(ramp().clip(50.0, 100.0).is_empty());
    }

    #[test]
    fn resample_interpolates_linearly() {
        let channel = Channel::new("HCN1", vec![0.0, 1.0, 2.0], vec![0.0, 10.0, 20.0]);
        let resampled = channel.resample(0.5).unwrap();
        assert_eq!(resampled.times().to_vec(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        let values = resampled.values().to_vec();
        for (got, want) in values.iter().zip([0.0, 5.0, 10.0, 15.0, 20.0]) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!(matches!(
            channel.resample(0.0),
            Err(DischargeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn resample_refuses_oversized_grid() {
        let channel = Channel::new("VL1", vec![0.0, 1.0], vec![0.0, 1.0]);
        assert!(matches!(
            channel.resample(1e-300),
            Err(DischargeError::InvalidConfig(_))
        ));
        assert_eq!(channel.resample(1.0 / 1024.0).unwrap().len(), 1025);
    }

    #[test]
    fn window_mean_is_inclusive() {
        assert_eq!(ramp().window_mean(1.0, 3.0), Some(20.0));
        assert_eq!(ramp().window_mean(10.0, 20.0), None);
    }

    #[test]
    fn map_values_keeps_time_base() {
        let doubled = ramp().map_values("X", |v| v * 2.0);
        assert_eq!(doubled.name(), "X");
        assert_eq!(doubled.times(), ramp().times());
        assert_eq!(doubled.max_value(), Some(80.0));
    }
}
