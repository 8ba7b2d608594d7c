use log::warn;
use serde::{Deserialize, Serialize};

use crate::discharge::shot::{ShotRecord, SummaryField};
use crate::discharge::DischargeResult;

const UNDEFINED: &str = "n/a";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// `label, value` per line.
    Csv,
    /// Fixed-width columns, 4 significant figures.
    #[default]
    Aligned,
    Json,
}

#[derive(Debug, Serialize)]
struct SummaryReport<'a> {
    shot: u32,
    acquired: Option<&'a str>,
    discharge_start_ms: Option<f64>,
    discharge_end_ms: Option<f64>,
    discharge_duration_ms: Option<f64>,
    peak_current_a: Option<f64>,
    peak_density_m3: Option<f64>,
    average_density_m3: Option<f64>,
    peak_field_t: Option<f64>,
}

pub fn render_summary(shot: &ShotRecord, format: SummaryFormat) -> DischargeResult<String> {
    let summary = shot.summary();
    for field in SummaryField::ALL {
        if summary.get(field).is_none() {
            warn!("Shot {}: {} is undefined", shot.shot(), field.label());
        }
    }
    if format == SummaryFormat::Json {
        let report = SummaryReport {
            shot: shot.shot(),
            acquired: shot.acquired(),
            discharge_start_ms: summary.get(SummaryField::DischargeStart),
            discharge_end_ms: summary.get(SummaryField::DischargeEnd),
            discharge_duration_ms: summary.get(SummaryField::DischargeDuration),
            peak_current_a: summary.peak_current,
            peak_density_m3: summary.peak_density,
            average_density_m3: summary.average_density,
            peak_field_t: summary.peak_field,
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let mut rows = vec![
        ("Shot number".to_owned(), shot.shot().to_string()),
        ("Date".to_owned(), shot.acquired().unwrap_or(UNDEFINED).to_owned()),
    ];
    rows.extend(SummaryField::ALL.iter().map(|field| {
        let value = summary
            .get(*field)
            .map(|v| match format {
                SummaryFormat::Csv => v.to_string(),
                _ => format_significant(v, 4),
            })
            .unwrap_or_else(|| UNDEFINED.to_owned());
        (field.label().to_owned(), value)
    }));

    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0) + 2;
    let value_width = rows.iter().map(|(_, value)| value.len()).max().unwrap_or(0).max(12);
    let lines: Vec<String> = rows
        .into_iter()
        .map(|(label, value)| match format {
            SummaryFormat::Csv => format!("{label}, {value}"),
            _ => format!("{label:<label_width$}{value:>value_width$}"),
        })
        .collect();
    Ok(lines.join("\n"))
}

/// One-line digest drawn on the first plot panel.
pub fn caption(shot: &ShotRecord) -> String {
    let summary = shot.summary();
    let show = |v: Option<f64>| v.map_or_else(|| UNDEFINED.to_owned(), |v| format_significant(v, 4));
    format!(
        "#{}  dt = {} ms  Ip = {} A  ne = {} m**-3  Bt = {} T",
        shot.shot(),
        show(summary.discharge_duration()),
        show(summary.peak_current),
        show(summary.peak_density),
        show(summary.peak_field)
    )
}

/// `%g`-style formatting with `digits` significant figures.
pub fn format_significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let digits = digits.max(1);
    let sci = format!("{:.*e}", digits - 1, value);
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return sci;
    };
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= digits as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exp.abs())
    } else {
        let decimals = (digits as i32 - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_owned()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
