use crate::data::point::AccidentPoint;
use crate::ui::style::{Color, MarkerSeverity};
use std::fmt::Write;

/// One `label: value` line of a popup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupRow {
    pub label: &'static str,
    pub value: String,
}

impl PopupRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Text shown when a single accident marker is opened.
///
/// Rows are grouped the way the dashboard lays them out: location details,
/// a tinted casualty box, then cause and weather.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupContent {
    pub title: String,
    pub severity: MarkerSeverity,
    pub details: Vec<PopupRow>,
    pub casualties: Vec<PopupRow>,
    pub notes: Vec<PopupRow>,
}

impl PopupContent {
    pub fn for_point(point: &AccidentPoint) -> Self {
        let d = &point.details;
        let title = if d.accident_type.trim().is_empty() {
            "Acidente".to_string()
        } else {
            d.accident_type.clone()
        };

        let location = match d.km {
            Some(km) if km.is_finite() => format!("BR-{} km {:.1}", d.road, km),
            _ => format!("BR-{}", d.road),
        };

        Self {
            title,
            severity: point.severity(),
            details: vec![
                PopupRow::new("Data", format_date(&d.date)),
                PopupRow::new("Hora", d.time.clone()),
                PopupRow::new("Local", location),
                PopupRow::new("Município", d.municipality.clone()),
                PopupRow::new("UF", d.state.clone()),
            ],
            casualties: vec![
                PopupRow::new("Mortos", point.fatalities.to_string()),
                PopupRow::new("Feridos", point.injuries.to_string()),
            ],
            notes: vec![
                PopupRow::new("Causa", d.cause.clone()),
                PopupRow::new("Condição", d.weather.clone()),
            ],
        }
    }

    pub fn header_color(&self) -> Color {
        self.severity.header_color()
    }

    /// Tint behind the casualty rows
    pub fn casualty_background(&self) -> Color {
        self.severity.background_color()
    }

    /// All rows in display order
    pub fn rows(&self) -> impl Iterator<Item = &PopupRow> {
        self.details
            .iter()
            .chain(self.casualties.iter())
            .chain(self.notes.iter())
    }

    pub fn to_plain_text(&self) -> String {
        let mut text = self.title.clone();
        for row in self.rows() {
            let _ = write!(text, "\n{}: {}", row.label, row.value);
        }
        text
    }
}

/// `yyyy-mm-dd[...]` as `dd/mm/yyyy`; anything else is shown as received
fn format_date(raw: &str) -> String {
    let date = raw.get(..10).unwrap_or(raw);
    let mut parts = date.split('-');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(y), Some(m), Some(d), None)
            if y.len() == 4 && m.len() == 2 && d.len() == 2
                && [y, m, d].iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) =>
        {
            format!("{d}/{m}/{y}")
        }
        _ => raw.to_string(),
    }
}
