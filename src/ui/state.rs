use crossbeam::channel::Receiver;

use crate::config::ViewerConfig;
use crate::geo::{CoordinateParser, FaultTrace, ParseWarning};
use crate::math::{Mechanism, OrientationParams};
use crate::renderer::RebuildOutcome;

/// Which text block a warning came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeBlock {
    Upper,
    Lower,
    Orientation,
}

/// The raw form, kept as typed so edits round-trip exactly.
pub struct UiState {
    pub upper_text: String,
    pub lower_text: String,
    pub dip_text: String,
    pub strike_text: String,
    pub mechanism: String,
    pub mechanisms: Vec<String>,

    pub vsync_enabled: bool,
    pub show_help: bool,

    pub warnings: Vec<(EdgeBlock, ParseWarning)>,
    pub last_outcome: Option<RebuildOutcome>,
    pub last_error: Option<String>,
}

impl UiState {
    pub fn from_config(config: &ViewerConfig) -> Self {
        let initial = &config.initial;
        Self {
            upper_text: initial.upper_edge.clone(),
            lower_text: initial.lower_edge.clone(),
            dip_text: initial.dip.clone(),
            strike_text: initial.strike.clone(),
            mechanism: initial.mechanism.clone(),
            mechanisms: config.mechanisms.clone(),

            vsync_enabled: config.vsync,
            show_help: true,

            warnings: Vec::new(),
            last_outcome: None,
            last_error: None,
        }
    }

    /// Parses the form one block at a time, draining `diagnostics` after each
    /// so every warning is tagged with the block it came from.
    pub fn parse_tagged(
        &mut self,
        parser: &CoordinateParser,
        diagnostics: &Receiver<ParseWarning>,
    ) -> (FaultTrace, OrientationParams) {
        self.warnings.clear();
        let drain = |block: EdgeBlock, warnings: &mut Vec<(EdgeBlock, ParseWarning)>| {
            warnings.extend(diagnostics.try_iter().map(|w| (block, w)));
        };

        let upper = parser.parse(&self.upper_text);
        drain(EdgeBlock::Upper, &mut self.warnings);
        let lower = parser.parse(&self.lower_text);
        drain(EdgeBlock::Lower, &mut self.warnings);
        let params = OrientationParams::new(
            parser.parse_angle(&self.dip_text),
            parser.parse_angle(&self.strike_text),
            Mechanism::from_label(&self.mechanism),
        );
        drain(EdgeBlock::Orientation, &mut self.warnings);

        (FaultTrace::new(upper, lower), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{FieldKind, WarningKind};
    use crossbeam::channel::unbounded;

    #[test]
    fn default_form_is_a_subduction_trace() {
        let (_tx, rx) = unbounded();
        let mut state = UiState::from_config(&ViewerConfig::default());
        let (trace, params) = state.parse_tagged(&CoordinateParser::new(), &rx);
        assert_eq!(trace.upper_edge.len(), 3);
        assert_eq!(trace.lower_edge.len(), 2);
        assert_eq!(params.mechanism, Mechanism::Subduction);
        assert_eq!(params.dip_angle_deg, 30.0);
    }

    #[test]
    fn warnings_are_tagged_by_block() {
        let (tx, rx) = unbounded();
        let parser = CoordinateParser::with_diagnostics(tx);
        let mut state = UiState::from_config(&ViewerConfig::default());
        state.upper_text = "1 2 3".into();
        state.lower_text = "x 2 3".into();
        state.dip_text = "steep".into();

        let (trace, params) = state.parse_tagged(&parser, &rx);
        assert_eq!(trace.lower_edge[0].lat, 0.0);
        assert_eq!(params.dip_angle_deg, 0.0);

        assert_eq!(state.warnings.len(), 2);
        assert_eq!(state.warnings[0].0, EdgeBlock::Lower);
        assert_eq!(state.warnings[0].1.field, FieldKind::Lat);
        assert_eq!(state.warnings[1].0, EdgeBlock::Orientation);
        assert_eq!(state.warnings[1].1.kind, WarningKind::FellBackToZero);
    }

    #[test]
    fn unknown_mechanism_label_is_default() {
        let mut state = UiState::from_config(&ViewerConfig::default());
        state.mechanism = "Subduction Interface".into();
        let (_tx, rx) = unbounded();
        let (_, params) = state.parse_tagged(&CoordinateParser::new(), &rx);
        assert_eq!(params.mechanism, Mechanism::Default);
    }
}
