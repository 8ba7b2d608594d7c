use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::discharge::{Channel, DischargeError, DischargeResult};

/// Free-form metadata lines at the top of every exported channel file.
pub const HEADER_LINES: usize = 8;

/// A parsed channel file.
#[derive(Clone, Debug)]
pub struct ChannelFile {
    pub channel: Channel,
    /// Text after `Create =` in the header, if any.
    pub created: Option<String>,
}

pub fn channel_path(shot_dir: &Path, channel: &str) -> PathBuf {
    shot_dir.join(format!("{channel}.txt"))
}

pub fn read_channel(path: &Path, channel: &str) -> DischargeResult<ChannelFile> {
    let text = fs::read_to_string(path).map_err(|err| match err.kind() {
        ErrorKind::NotFound => DischargeError::MissingFile {
            path: path.to_path_buf(),
        },
        _ => DischargeError::Io(err),
    })?;
    parse_channel(path, channel, &text)
}

pub fn parse_channel(path: &Path, channel: &str, text: &str) -> DischargeResult<ChannelFile> {
    let malformed = |line: usize, reason: String| DischargeError::MalformedData {
        path: path.to_path_buf(),
        line,
        reason,
    };
    let mut lines = text.lines().enumerate();
    let mut created = None;
    for (_, line) in lines.by_ref().take(HEADER_LINES) {
        if created.is_none() {
            created = creation_stamp(line);
        }
    }
    let mut times = Vec::new();
    let mut values = Vec::new();
    for (idx, line) in lines {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        let [t, v] = fields.as_slice() else {
            return Err(malformed(
                line_no,
                format!("expected 2 columns, found {}", fields.len()),
            ));
        };
        let t: f64 = t
            .parse()
            .map_err(|_| malformed(line_no, format!("time {t:?} is not a number")))?;
        let v: f64 = v
            .parse()
            .map_err(|_| malformed(line_no, format!("value {v:?} is not a number")))?;
        if !t.is_finite() || !v.is_finite() {
            return Err(malformed(
                line_no,
                format!("non-finite sample ({t}, {v})"),
            ));
        }
        if let Some(prev) = times.last() {
            if !(t > *prev) {
                return Err(malformed(
                    line_no,
                    format!("time {t} does not follow {prev}"),
                ));
            }
        }
        times.push(t);
        values.push(v);
    }
    if times.is_empty() {
        return Err(malformed(
            HEADER_LINES,
            "no samples after the header".into(),
        ));
    }
    Ok(ChannelFile {
        channel: Channel::new(channel, times, values),
        created,
    })
}

fn creation_stamp(line: &str) -> Option<String> {
    let (key, value) = line.split_once('=')?;
    if !key.trim_end().ends_with("Create") {
        return None;
    }
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_owned())
}
