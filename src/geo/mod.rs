pub mod parser;
pub mod point;

pub use parser::{CoordinateParser, FieldKind, ParseWarning, WarningKind, parse_angle};
pub use point::{FaultTrace, GeoPoint, narrow, project};
