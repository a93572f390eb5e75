use crossbeam::channel::Sender;

use crate::geo::point::GeoPoint;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Lat,
    Lon,
    Depth,
    Angle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// No numeric prefix; the value was replaced by 0.
    FellBackToZero,
    /// A numeric prefix was read and the rest of the field ignored.
    IgnoredTrailing,
}

/// A lenient-read event. Never changes what the parser returns.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseWarning {
    /// 1-based line number in the source text.
    pub line: usize,
    pub field: FieldKind,
    pub raw: String,
    pub kind: WarningKind,
}

enum FieldValue {
    Exact(f64),
    Partial(f64),
    Unparsable,
}

/// Reads point-per-line `lat lon depth` text.
///
/// Fields are separated by runs of whitespace and/or commas. Depth is optional.
/// Anything that does not read as a number becomes 0; if a diagnostics sender is
/// attached, every such coercion is also reported on it.
#[derive(Clone, Default)]
pub struct CoordinateParser {
    diagnostics: Option<Sender<ParseWarning>>,
}

impl CoordinateParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_diagnostics(diagnostics: Sender<ParseWarning>) -> Self {
        Self {
            diagnostics: Some(diagnostics),
        }
    }

    pub fn parse(&self, text: &str) -> Vec<GeoPoint> {
        text.lines()
            .enumerate()
            .filter_map(|(idx, line)| {
                let line = line.trim();
                if line.is_empty() {
                    return None;
                }
                Some(self.parse_line(idx + 1, line))
            })
            .collect()
    }

    /// Dip/strike text field. Blank means 0 without a warning.
    pub fn parse_angle(&self, text: &str) -> f64 {
        let text = text.trim();
        if text.is_empty() {
            return 0.0;
        }
        self.read_field(0, FieldKind::Angle, text)
    }

    fn parse_line(&self, line_no: usize, line: &str) -> GeoPoint {
        let fields = split_fields(line);
        let field = |i: usize, kind: FieldKind| match fields.get(i) {
            Some(raw) => self.read_field(line_no, kind, raw),
            None if kind == FieldKind::Depth => 0.0,
            None => {
                self.report(line_no, kind, "", WarningKind::FellBackToZero);
                0.0
            }
        };

        let lat = field(0, FieldKind::Lat);
        let lon = field(1, FieldKind::Lon);
        let depth = field(2, FieldKind::Depth);
        GeoPoint::new(lat, lon, depth)
    }

    fn read_field(&self, line_no: usize, kind: FieldKind, raw: &str) -> f64 {
        match read_number(raw) {
            FieldValue::Exact(v) => v,
            FieldValue::Partial(v) => {
                self.report(line_no, kind, raw, WarningKind::IgnoredTrailing);
                v
            }
            FieldValue::Unparsable => {
                self.report(line_no, kind, raw, WarningKind::FellBackToZero);
                0.0
            }
        }
    }

    fn report(&self, line: usize, field: FieldKind, raw: &str, kind: WarningKind) {
        tracing::debug!(line, ?field, raw, ?kind, "lenient numeric read");
        if let Some(tx) = &self.diagnostics {
            let _ = tx.send(ParseWarning {
                line,
                field,
                raw: raw.to_string(),
                kind,
            });
        }
    }
}

pub fn parse_angle(text: &str) -> f64 {
    CoordinateParser::new().parse_angle(text)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn split_fields(line: &str) -> Vec<&str> {
    let mut fields: Vec<&str> = line.split(is_separator).filter(|f| !f.is_empty()).collect();
    // a leading separator still yields an empty first field
    if line.starts_with(is_separator) {
        fields.insert(0, "");
    }
    fields
}

/// Longest numeric prefix of `raw`: `[+-]digits[.digits][(e|E)[+-]digits]`.
fn read_number(raw: &str) -> FieldValue {
    let bytes = raw.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return FieldValue::Unparsable;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match raw[..end].parse::<f64>() {
        Ok(v) if fits_scene(v) && end == raw.len() => FieldValue::Exact(v),
        Ok(v) if fits_scene(v) => FieldValue::Partial(v),
        _ => FieldValue::Unparsable,
    }
}

/// Scene coordinates are `f32`; anything that would narrow to infinity counts
/// as unreadable.
fn fits_scene(v: f64) -> bool {
    v.is_finite() && v.abs() <= f32::MAX as f64
}
