use crate::domain::{GeoRegion, GeoRegionError, NewGeoRegion, TriggerOn};
use crate::persistence::LoadedRegions;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// On-disk shape of a single region. Fields are keyed by name and unknown keys are ignored,
/// so records written by a newer version still load.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRegion {
    latitude: f64,
    longitude: f64,
    radius: f64,
    identifier: String,
    note: String,
    // Older records were written with a misspelled key
    #[serde(alias = "eventTYpe")]
    event_type: TriggerOn,
}

impl From<&GeoRegion> for SerializedRegion {
    fn from(region: &GeoRegion) -> Self {
        SerializedRegion {
            latitude: region.center().latitude(),
            longitude: region.center().longitude(),
            radius: region.radius(),
            identifier: region.identifier().to_string(),
            note: region.note().to_string(),
            event_type: region.trigger_on(),
        }
    }
}

impl TryFrom<SerializedRegion> for GeoRegion {
    type Error = GeoRegionError;

    fn try_from(record: SerializedRegion) -> Result<Self, Self::Error> {
        GeoRegion::try_from(NewGeoRegion {
            identifier: record.identifier,
            latitude: record.latitude,
            longitude: record.longitude,
            radius: record.radius,
            note: record.note,
            trigger_on: record.event_type,
        })
    }
}

pub fn encode(regions: &[GeoRegion]) -> Result<Vec<u8>, serde_json::Error> {
    let records = regions.iter().map(SerializedRegion::from).collect::<Vec<_>>();
    serde_json::to_vec_pretty(&records)
}

/// Decodes a slot. Only a slot that is not a list at all is an error; records that fail to decode are skipped.
pub fn decode(bytes: &[u8]) -> Result<LoadedRegions, serde_json::Error> {
    let records = serde_json::from_slice::<Vec<Value>>(bytes)?;

    let mut regions = Vec::with_capacity(records.len());
    let mut skipped = 0;
    for (index, record) in records.into_iter().enumerate() {
        match decode_record(record) {
            Ok(region) => regions.push(region),
            Err(error) => {
                skipped += 1;
                warn!(index, "⚠️ Skipping persisted region #{}: {}", index, error);
            }
        }
    }

    Ok(LoadedRegions::new(regions, skipped))
}

fn decode_record(record: Value) -> Result<GeoRegion, DecodeError> {
    let serialized = serde_json::from_value::<SerializedRegion>(record)?;
    Ok(GeoRegion::try_from(serialized)?)
}

#[derive(Error, Debug)]
enum DecodeError {
    #[error("malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("invalid region: {0}")]
    Invalid(#[from] GeoRegionError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Coordinate;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn region(identifier: &str, trigger_on: TriggerOn) -> GeoRegion {
        GeoRegion::new(
            identifier.to_string(),
            Coordinate::new(51.8615899, 4.3580323).unwrap(),
            150.25,
            "Office".to_string(),
            trigger_on,
        )
        .unwrap()
    }

    #[test]
    fn encodes_every_field_by_name() {
        let bytes = encode(&[region("office", TriggerOn::OnExit)]).unwrap();
        let value = serde_json::from_slice::<Value>(&bytes).unwrap();

        assert_eq!(
            value,
            json!([{
                "latitude": 51.8615899,
                "longitude": 4.3580323,
                "radius": 150.25,
                "identifier": "office",
                "note": "Office",
                "eventType": "On Exit"
            }])
        );
    }

    #[test]
    fn decodes_what_was_encoded_in_order() {
        let regions = vec![
            region("b", TriggerOn::OnEntry),
            region("a", TriggerOn::OnExit),
            region("c", TriggerOn::OnEntry),
        ];

        let loaded = decode(&encode(&regions).unwrap()).unwrap();

        assert_eq!(loaded, LoadedRegions::new(regions, 0));
    }

    #[test]
    fn skips_malformed_records_and_keeps_the_rest_in_order() {
        let bytes = serde_json::to_vec(&json!([
            { "latitude": 1.0, "longitude": 2.0, "radius": 10.0, "identifier": "first", "note": "", "eventType": "On Entry" },
            { "latitude": "north", "identifier": "broken" },
            { "latitude": 95.0, "longitude": 2.0, "radius": 10.0, "identifier": "out-of-range", "note": "", "eventType": "On Entry" },
            42,
            { "latitude": 3.0, "longitude": 4.0, "radius": 20.0, "identifier": "second", "note": "x", "eventType": "On Exit" }
        ]))
        .unwrap();

        let loaded = decode(&bytes).unwrap();

        let identifiers = loaded.regions().iter().map(GeoRegion::identifier).collect::<Vec<_>>();
        assert_eq!(identifiers, vec!["first", "second"]);
        assert_eq!(loaded.skipped(), 3);
    }

    #[rstest]
    #[case::current_key(json!({ "latitude": 1.0, "longitude": 2.0, "radius": 10.0, "identifier": "id", "note": "", "eventType": "On Exit" }))]
    #[case::legacy_key(json!({ "latitude": 1.0, "longitude": 2.0, "radius": 10.0, "identifier": "id", "note": "", "eventTYpe": "On Exit" }))]
    #[case::unknown_fields(json!({ "latitude": 1.0, "longitude": 2.0, "radius": 10.0, "identifier": "id", "note": "", "eventType": "On Exit", "color": "#ff0000" }))]
    fn decodes_tolerated_record_shapes(#[case] record: Value) {
        let loaded = decode(&serde_json::to_vec(&json!([record])).unwrap()).unwrap();

        assert_eq!(loaded.skipped(), 0);
        assert_eq!(loaded.regions()[0].trigger_on(), TriggerOn::OnExit);
    }

    #[test]
    fn fails_when_the_slot_is_not_a_list() {
        assert!(decode(br#"{"savedItems": []}"#).is_err());
        assert!(decode(b"not json").is_err());
    }
}
