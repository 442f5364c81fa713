//! Marker (stain name) matching.

use super::patterns::MARKER_LINE;
use super::FieldRule;
use crate::models::label::FieldRole;

/// Matches a line made up entirely of letters, digits and hyphens.
///
/// The pattern also accepts bare sample or case number lines. Lines already
/// used by another field are not excluded, so on a label whose sample number
/// line comes first the marker resolves to that same line.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerRule;

impl FieldRule for MarkerRule {
    fn role(&self) -> FieldRole {
        FieldRole::Marker
    }

    fn match_line<'t>(&self, text: &'t str) -> Option<&'t str> {
        MARKER_LINE.is_match(text).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::label::{Observation, ObservationSet};

    #[test]
    fn test_whole_line_only() {
        assert_eq!(MarkerRule.match_line("CD3"), Some("CD3"));
        assert_eq!(MarkerRule.match_line("XYZ-7"), Some("XYZ-7"));
        assert_eq!(MarkerRule.match_line("HE stain"), None);
        assert_eq!(MarkerRule.match_line("Ki"), None);
        assert_eq!(MarkerRule.match_line("CD3."), None);
    }

    #[test]
    fn test_overlaps_other_fields() {
        let set: ObservationSet = vec![
            Observation::new("12-345", 0.9),
            Observation::new("CD68", 0.8),
        ]
        .into();

        let marker = MarkerRule.find(&set).unwrap();
        assert_eq!(marker.value, "12-345");
        assert_eq!(marker.confidence, 0.9);
    }
}
