/// Marker for channels whose unit is not known.
pub const UNSPECIFIED_UNIT: &str = "a.u.";

// First match wins, so specific patterns go before the generic ones.
const UNIT_RULES: &[(&str, &str)] = &[
    ("IP", "A"),
    ("IT", "A"),
    ("IOH", "A"),
    ("HCN", "V"),
    ("VL", "V"),
    ("BT", "T"),
    ("NE", "m**-3"),
];

pub fn unit_for(channel: &str) -> &'static str {
    UNIT_RULES
        .iter()
        .find(|(pattern, _)| channel.contains(pattern))
        .map(|(_, unit)| *unit)
        .unwrap_or(UNSPECIFIED_UNIT)
}

/// Axis label such as `IP1 [A]`; unknown units leave the bare name.
pub fn axis_label(channel: &str, with_unit: bool) -> String {
    match unit_for(channel) {
        unit if with_unit && unit != UNSPECIFIED_UNIT => format!("{channel} [{unit}]"),
        _ => channel.to_owned(),
    }
}
