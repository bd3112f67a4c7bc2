use crate::core::geo::LatLng;
use crate::ui::style::MarkerSeverity;
use crate::Result;
use serde::{Deserialize, Serialize};

/// One observed accident as delivered by the data-fetch layer.
///
/// The backend speaks Portuguese (`mortos`, `feridos`, `tipo_acidente`, ...);
/// those names are accepted as aliases so a `/mapas/pontos` payload
/// deserializes directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentPoint {
    /// Opaque identifier, unique within a fetch batch
    pub id: u64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default, alias = "mortos")]
    pub fatalities: u32,
    #[serde(default, alias = "feridos")]
    pub injuries: u32,
    /// Descriptive fields, passed through to popups untouched
    #[serde(flatten)]
    pub details: AccidentDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccidentDetails {
    #[serde(alias = "tipo_acidente")]
    pub accident_type: String,
    #[serde(alias = "causa_acidente")]
    pub cause: String,
    #[serde(alias = "br")]
    pub road: String,
    pub km: Option<f64>,
    #[serde(alias = "municipio")]
    pub municipality: String,
    #[serde(alias = "uf")]
    pub state: String,
    #[serde(alias = "condicao_metereologica")]
    pub weather: String,
    #[serde(alias = "data")]
    pub date: String,
    #[serde(alias = "hora")]
    pub time: String,
    #[serde(alias = "classificacao_acidente")]
    pub classification: String,
}

impl AccidentPoint {
    pub fn new(id: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            latitude: Some(latitude),
            longitude: Some(longitude),
            fatalities: 0,
            injuries: 0,
            details: AccidentDetails::default(),
        }
    }

    /// A record that arrived without coordinates
    pub fn unlocated(id: u64) -> Self {
        Self {
            id,
            latitude: None,
            longitude: None,
            fatalities: 0,
            injuries: 0,
            details: AccidentDetails::default(),
        }
    }

    pub fn with_casualties(mut self, fatalities: u32, injuries: u32) -> Self {
        self.fatalities = fatalities;
        self.injuries = injuries;
        self
    }

    pub fn with_details(mut self, details: AccidentDetails) -> Self {
        self.details = details;
        self
    }

    /// Coordinates as a `LatLng`, when both are present
    pub fn position(&self) -> Option<LatLng> {
        Some(LatLng::new(self.latitude?, self.longitude?))
    }

    pub fn has_fatalities(&self) -> bool {
        self.fatalities > 0
    }

    pub fn severity(&self) -> MarkerSeverity {
        MarkerSeverity::for_counts(self.fatalities, self.injuries)
    }

    /// Parses a JSON array of points as served by the backend
    pub fn parse_batch(json: &str) -> Result<Vec<AccidentPoint>> {
        Ok(serde_json::from_str(json)?)
    }
}
