use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use log::info;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::discharge::summary::{caption, format_significant};
use crate::discharge::units::axis_label;
use crate::discharge::{DischargeError, DischargeResult, ShotRecord};

/// Pixels per inch of the rendered figure.
pub const DPI: f64 = 200.0;

/// Largest bitmap side, in pixels.
pub const MAX_SIDE_PX: f64 = 32_768.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub line_width: u32,
    /// Colors assigned to shots in order, reused round-robin.
    /// Accepts matplotlib letters (`r`, `k`, ...), names or `#rrggbb`.
    pub colors: Vec<String>,
    /// Start of the plotted window (ms).
    pub t_init: f64,
    /// End of the plotted window (ms).
    pub t_final: f64,
    pub grid: bool,
    /// Figure width (inches).
    pub width: f64,
    /// Height of one panel (inches).
    pub panel_height: f64,
    /// Resample every trace to this period (ms) before drawing.
    pub resample_period: Option<f64>,
    pub show_units: bool,
    pub save: bool,
    pub print_summary: bool,
    pub output_dir: PathBuf,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            line_width: 1,
            colors: ["r", "g", "b", "c", "m", "y", "k"]
                .into_iter()
                .map(String::from)
                .collect(),
            t_init: 0.0,
            t_final: 1000.0,
            grid: true,
            width: 8.0,
            panel_height: 1.2,
            resample_period: None,
            show_units: true,
            save: false,
            print_summary: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl PlotConfig {
    pub fn palette(&self) -> DischargeResult<Vec<RGBColor>> {
        if self.colors.is_empty() {
            return Err(DischargeError::InvalidConfig(
                "color palette must hold at least one color".into(),
            ));
        }
        self.colors.iter().map(|c| parse_color(c)).collect()
    }

    /// Bitmap size for `panels` stacked panels.
    pub fn pixel_size(&self, panels: usize) -> DischargeResult<(u32, u32)> {
        let width = (self.width * DPI).round();
        let height = (self.panel_height * DPI * panels as f64).round();
        if !(width >= 1.0 && height >= 1.0) {
            return Err(DischargeError::InvalidConfig(format!(
                "figure size {}x{} in is too small",
                self.width, self.panel_height
            )));
        }
        if width > MAX_SIDE_PX || height > MAX_SIDE_PX {
            return Err(DischargeError::InvalidConfig(format!(
                "figure of {width}x{height} px exceeds {MAX_SIDE_PX} px per side"
            )));
        }
        Ok((width as u32, height as u32))
    }
}

pub fn parse_color(spec: &str) -> DischargeResult<RGBColor> {
    let color = match spec.trim() {
        "r" | "red" => RED,
        "g" | "green" => RGBColor(0, 128, 0),
        "b" | "blue" => BLUE,
        "c" | "cyan" => RGBColor(0, 191, 191),
        "m" | "magenta" => RGBColor(191, 0, 191),
        "y" | "yellow" => RGBColor(191, 191, 0),
        "k" | "black" => BLACK,
        "w" | "white" => WHITE,
        hex if hex.len() == 7 && hex.is_ascii() && hex.starts_with('#') => {
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
            match (channel(1..3), channel(3..5), channel(5..7)) {
                (Ok(r), Ok(g), Ok(b)) => RGBColor(r, g, b),
                _ => return Err(DischargeError::InvalidConfig(format!("bad color {spec:?}"))),
            }
        }
        _ => return Err(DischargeError::InvalidConfig(format!("unknown color {spec:?}"))),
    };
    Ok(color)
}

/// One shot's samples inside a panel.
#[derive(Clone, Debug)]
pub struct Trace {
    pub shot: u32,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

#[derive(Clone, Debug)]
pub struct Panel {
    pub label: String,
    pub traces: Vec<Trace>,
}

/// Clips (and optionally resamples) every requested channel of every shot.
pub fn prepare_panels<S: AsRef<str>>(
    shots: &[ShotRecord],
    channels: &[S],
    config: &PlotConfig,
) -> DischargeResult<Vec<Panel>> {
    if shots.is_empty() {
        return Err(DischargeError::EmptySelection("no shots given"));
    }
    if channels.is_empty() {
        return Err(DischargeError::EmptySelection("no channels given"));
    }
    let palette = palette_checked(config)?;
    channels
        .iter()
        .map(|name| -> DischargeResult<Panel> {
            let name = name.as_ref();
            let traces = shots
                .iter()
                .enumerate()
                .map(|(idx, shot)| -> DischargeResult<Trace> {
                    let mut channel = shot
                        .require_channel(name)?
                        .clip(config.t_init, config.t_final);
                    if let Some(period) = config.resample_period {
                        channel = channel.resample(period)?;
                    }
                    Ok(Trace {
                        shot: shot.shot(),
                        color: palette[idx % palette.len()],
                        points: channel.points().collect(),
                    })
                })
                .collect::<DischargeResult<Vec<_>>>()?;
            Ok(Panel {
                label: axis_label(name, config.show_units),
                traces,
            })
        })
        .collect()
}

fn palette_checked(config: &PlotConfig) -> DischargeResult<Vec<RGBColor>> {
    let palette = config.palette()?;
    if let Some(period) = config.resample_period {
        if !period.is_finite() || period <= 0.0 {
            return Err(DischargeError::InvalidConfig(format!(
                "resample period must be positive, got {period}"
            )));
        }
    }
    Ok(palette)
}

/// `DischargePlots_<shot>_<shot>.png`
pub fn figure_file_name(shots: &[ShotRecord]) -> String {
    let suffix: Vec<String> = shots.iter().map(|s| s.shot().to_string()).collect();
    format!("DischargePlots_{}.png", suffix.join("_"))
}

pub struct Figure {
    pub png: Vec<u8>,
    pub saved_to: Option<PathBuf>,
}

/// Renders the stacked panels and writes them out when `config.save` is set.
pub fn plot_shots<S: AsRef<str>>(
    shots: &[ShotRecord],
    channels: &[S],
    config: &PlotConfig,
) -> DischargeResult<Figure> {
    let shot_list: Vec<String> = shots.iter().map(|s| s.shot().to_string()).collect();
    let channel_list: Vec<&str> = channels.iter().map(|c| c.as_ref()).collect();
    info!("Total number of discharges: {} ({})", shots.len(), shot_list.join(", "));
    info!("Total variables to plot: {} ({})", channels.len(), channel_list.join(", "));

    let png = render_png(shots, channels, config)?;
    let saved_to = if config.save {
        fs::create_dir_all(&config.output_dir)?;
        let path = config.output_dir.join(figure_file_name(shots));
        fs::write(&path, &png)?;
        info!("Save figure to: {}", path.display());
        Some(path)
    } else {
        None
    };
    Ok(Figure { png, saved_to })
}

pub fn render_png<S: AsRef<str>>(
    shots: &[ShotRecord],
    channels: &[S],
    config: &PlotConfig,
) -> DischargeResult<Vec<u8>> {
    let panels = prepare_panels(shots, channels, config)?;
    let (width, height) = config.pixel_size(panels.len())?;
    let (x_min, x_max) = time_range(&panels, config);
    let tick_format = |v: &f64| format_significant(*v, 3);
    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|px| px.checked_mul(3))
        .ok_or_else(|| DischargeError::Plot("figure too large for memory".into()))?;
    let mut buffer = vec![0u8; len];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE)?;
        let areas = root.split_evenly((panels.len(), 1));
        let last = panels.len() - 1;
        for (idx, (area, panel)) in areas.iter().zip(&panels).enumerate() {
            let (y_min, y_max) = value_range(panel);
            let mut chart = ChartBuilder::on(area)
                .margin(8)
                .set_label_area_size(LabelAreaPosition::Left, 110)
                .set_label_area_size(LabelAreaPosition::Bottom, if idx == last { 50 } else { 25 })
                .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

            let mut mesh = chart.configure_mesh();
            mesh.y_desc(panel.label.as_str())
                .y_labels(5)
                .y_label_formatter(&tick_format)
                .light_line_style(&BLACK.mix(0.05));
            if idx == last {
                mesh.x_desc("time [ms]");
            }
            if !config.grid {
                mesh.disable_mesh();
            }
            mesh.draw()?;

            for trace in &panel.traces {
                let color = trace.color;
                chart
                    .draw_series(LineSeries::new(
                        trace.points.iter().copied(),
                        color.stroke_width(config.line_width),
                    ))?
                    .label(trace.shot.to_string())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }

            if idx == 0 {
                chart
                    .configure_series_labels()
                    .position(SeriesLabelPosition::UpperRight)
                    .background_style(&WHITE.mix(0.8))
                    .border_style(&WHITE)
                    .draw()?;
                if config.print_summary {
                    for (row, (shot, trace)) in shots.iter().zip(&panel.traces).enumerate() {
                        area.draw(&Text::new(
                            caption(shot),
                            (120, 10 + 16 * row as i32),
                            ("sans-serif", 13).into_font().color(&trace.color),
                        ))?;
                    }
                }
            }
        }
        root.present()?;
    }
    encode_png(&buffer, width, height)
}

fn time_range(panels: &[Panel], config: &PlotConfig) -> (f64, f64) {
    let times = panels
        .iter()
        .flat_map(|p| &p.traces)
        .flat_map(|t| t.points.iter().map(|(x, _)| *x));
    let (lo, hi) = bounds(times).unwrap_or((config.t_init, config.t_final));
    pad_flat(lo, hi)
}

fn value_range(panel: &Panel) -> (f64, f64) {
    let values = panel
        .traces
        .iter()
        .flat_map(|t| t.points.iter().map(|(_, y)| *y));
    let (lo, hi) = bounds(values).unwrap_or((0.0, 1.0));
    let margin = (hi - lo) * 0.05;
    pad_flat(lo - margin, hi + margin)
}

fn bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    values.fold(None, |acc, v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

// Plotters needs a non-empty range.
fn pad_flat(lo: f64, hi: f64) -> (f64, f64) {
    if (hi - lo).abs() <= f64::EPSILON * lo.abs().max(1.0) {
        let pad = (lo.abs() * 0.1).max(1.0);
        (lo - pad, hi + pad)
    } else {
        (lo, hi)
    }
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> DischargeResult<Vec<u8>> {
    let image = ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, buffer.to_vec())
        .ok_or_else(|| DischargeError::Plot("failed to allocate image buffer".into()))?;
    let mut output = Vec::new();
    DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut output), ImageFormat::Png)?;
    Ok(output)
}
