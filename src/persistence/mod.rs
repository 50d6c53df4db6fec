//! JSON persistence for circuits.
//!
//! A circuit is saved as a versioned envelope carrying the circuit data and
//! the editing settings. Loading validates the envelope, then restores the
//! data invariants that hand-edited files may break.

mod document;
mod format;

pub use document::Document;
pub use format::*;

use thiserror::Error;
use tracing::debug;

use crate::model::{CircuitData, Settings};

use document::Header;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("invalid file magic (expected {MAGIC})")]
    InvalidMagic,
    #[error("unsupported version: expected {expected}, found {found}")]
    UnsupportedVersion { expected: u32, found: u32 },
    #[error("malformed circuit file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes a circuit and its settings to JSON bytes.
pub fn serialize(circuit: &CircuitData, settings: &Settings) -> Result<Vec<u8>, PersistenceError> {
    let doc = Document::new(circuit.clone(), *settings);
    Ok(serde_json::to_vec_pretty(&doc)?)
}

pub fn serialize_to_string(
    circuit: &CircuitData,
    settings: &Settings,
) -> Result<String, PersistenceError> {
    let doc = Document::new(circuit.clone(), *settings);
    Ok(serde_json::to_string_pretty(&doc)?)
}

/// Deserializes a circuit saved by [`serialize`]. Cross-sections come back
/// open and settings come back sanitized.
pub fn deserialize(data: &[u8]) -> Result<(CircuitData, Settings), PersistenceError> {
    let header: Header = serde_json::from_slice(data)?;
    check_header(&header)?;
    let doc: Document = serde_json::from_slice(data)?;
    Ok(restore(doc))
}

pub fn deserialize_from_str(text: &str) -> Result<(CircuitData, Settings), PersistenceError> {
    deserialize(text.as_bytes())
}

fn check_header(header: &Header) -> Result<(), PersistenceError> {
    if header.magic != MAGIC {
        return Err(PersistenceError::InvalidMagic);
    }
    if header.version != FILE_VERSION {
        return Err(PersistenceError::UnsupportedVersion {
            expected: FILE_VERSION,
            found: header.version,
        });
    }
    Ok(())
}

fn restore(doc: Document) -> (CircuitData, Settings) {
    let mut circuit = doc.circuit;
    circuit.enforce_invariants();
    debug!(
        curves = circuit.curves.len(),
        roads = circuit.roads.len(),
        "circuit loaded"
    );
    (circuit, doc.settings.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Float3;
    use crate::model::{
        CircuitCurveData, CircuitPointData, CurveData, CurveId, PointData, RailingData, RoadData,
        RoadId,
    };

    fn make_test_circuit() -> CircuitData {
        let points: Vec<CircuitPointData> = [
            Float3::ZERO,
            Float3::new(0.0, 0.0, 10.0),
            Float3::new(5.0, 1.0, 20.0),
        ]
        .into_iter()
        .map(|p| CircuitPointData::from(PointData::new(p)))
        .collect();
        let mut curve = CurveData::new(points, false);
        curve.apply_auto_tangents(1.0 / 3.0);
        curve.points[1].point.independent_controls = Some(true);

        let mut road = RoadData::new(RoadId(2), CurveId(1), 0, 1);
        road.bridge.enabled = true;
        road.railings.push(RailingData::default());

        CircuitData {
            curves: vec![CircuitCurveData {
                id: CurveId(1),
                curve,
            }],
            roads: vec![road],
            next_id: 3,
        }
    }

    #[test]
    fn serialize_deserialize_circuit() {
        let circuit = make_test_circuit();
        let mut settings = Settings::default();
        settings.independent_control_points = true;
        settings.waypoints.quality = 80.0;

        let bytes = serialize(&circuit, &settings).unwrap();
        let (restored, restored_settings) = deserialize(&bytes).unwrap();
        assert_eq!(restored, circuit);
        assert_eq!(restored_settings, settings);
    }

    #[test]
    fn serialize_deserialize_empty_circuit() {
        let text = serialize_to_string(&CircuitData::new(), &Settings::default()).unwrap();
        let (restored, _) = deserialize_from_str(&text).unwrap();
        assert!(restored.curves.is_empty());
        assert!(restored.roads.is_empty());
    }

    #[test]
    fn magic_is_written() {
        let text = serialize_to_string(&CircuitData::new(), &Settings::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["magic"], "KEXR");
        assert_eq!(value["version"], FILE_VERSION);
    }

    #[test]
    fn invalid_magic_returns_error() {
        let text = r#"{"magic":"KEXD","version":1,"circuit":{}}"#;
        assert!(matches!(
            deserialize_from_str(text),
            Err(PersistenceError::InvalidMagic)
        ));
    }

    #[test]
    fn newer_version_returns_error() {
        let text = r#"{"magic":"KEXR","version":9,"circuit":{}}"#;
        assert!(matches!(
            deserialize_from_str(text),
            Err(PersistenceError::UnsupportedVersion {
                expected: 1,
                found: 9
            })
        ));
    }

    #[test]
    fn truncated_data_returns_error() {
        let bytes = serialize(&make_test_circuit(), &Settings::default()).unwrap();
        let result = deserialize(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(PersistenceError::Json(_))));
    }

    #[test]
    fn reload_forces_cross_sections_open() {
        let mut circuit = make_test_circuit();
        circuit.curves[0].curve.points[0].cross_section.is_closed = true;
        circuit.curves[0].curve.points[2].point.up = Float3::ZERO;

        let bytes = serialize(&circuit, &Settings::default()).unwrap();
        let (restored, _) = deserialize(&bytes).unwrap();
        let points = &restored.curves[0].curve.points;
        assert!(points.iter().all(|p| !p.cross_section.is_closed));
        assert_eq!(points[2].point.up, Float3::UP);
    }

    #[test]
    fn missing_settings_use_defaults() {
        let text = r#"{"magic":"KEXR","version":1,"circuit":{}}"#;
        let (circuit, settings) = deserialize_from_str(text).unwrap();
        assert_eq!(circuit.next_id, 1);
        assert_eq!(settings, Settings::default());
    }
}
