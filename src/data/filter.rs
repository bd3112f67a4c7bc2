use crate::data::point::AccidentPoint;
use serde::{Deserialize, Serialize};

/// The dashboard filter selection a batch of points was fetched for.
///
/// The controller compares contexts for equality only: a different selection
/// means the next successful load re-fits the view. Road and state also narrow
/// the bounds-fit so the map frames the selected highway or UF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterContext {
    #[serde(alias = "ano")]
    pub year: Option<String>,
    #[serde(alias = "uf")]
    pub state: Option<String>,
    #[serde(alias = "br")]
    pub road: Option<String>,
    #[serde(alias = "tipo")]
    pub accident_type: Option<String>,
    #[serde(alias = "classificacao")]
    pub classification: Option<String>,
}

impl FilterContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_year(mut self, year: impl Into<String>) -> Self {
        self.year = Some(year.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_road(mut self, road: impl Into<String>) -> Self {
        self.road = Some(road.into());
        self
    }

    pub fn with_accident_type(mut self, accident_type: impl Into<String>) -> Self {
        self.accident_type = Some(accident_type.into());
        self
    }

    pub fn with_classification(mut self, classification: impl Into<String>) -> Self {
        self.classification = Some(classification.into());
        self
    }

    /// Points the bounds-fit should frame.
    ///
    /// The road filter is applied first, then the state filter; each step is
    /// skipped when it would leave nothing to frame.
    pub fn focus_points<'a>(&self, points: &[&'a AccidentPoint]) -> Vec<&'a AccidentPoint> {
        let mut focus: Vec<&'a AccidentPoint> = points.to_vec();

        if let Some(road) = non_empty(&self.road) {
            let on_road: Vec<_> = focus
                .iter()
                .copied()
                .filter(|p| p.details.road == road)
                .collect();
            if !on_road.is_empty() {
                focus = on_road;
            }
        }

        if let Some(state) = non_empty(&self.state) {
            let in_state: Vec<_> = focus
                .iter()
                .copied()
                .filter(|p| p.details.state == state)
                .collect();
            if !in_state.is_empty() {
                focus = in_state;
            }
        }

        focus
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
