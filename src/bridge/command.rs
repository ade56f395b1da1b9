use crate::domain::{NewGeoRegion, TriggerOn};
use serde::Deserialize;

#[derive(Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    RequestPermission,
    AddGeotification(GeotificationFields),
    RemoveGeotification { identifier: String },
    List,
    Count,
    Synchronize,
    Echo {
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct GeotificationFields {
    latitude: f64,
    longitude: f64,
    radius: f64,
    #[serde(default)]
    note: String,
    #[serde(rename = "type")]
    trigger_on: TriggerOn,
    identifier: String,
}

impl From<GeotificationFields> for NewGeoRegion {
    fn from(fields: GeotificationFields) -> Self {
        NewGeoRegion {
            identifier: fields.identifier,
            latitude: fields.latitude,
            longitude: fields.longitude,
            radius: fields.radius,
            note: fields.note,
            trigger_on: fields.trigger_on,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::{Value, json};

    #[rstest]
    #[case::request_permission(json!({ "action": "requestPermission" }), Command::RequestPermission)]
    #[case::list(json!({ "action": "list", "id": 7 }), Command::List)]
    #[case::remove(json!({ "action": "removeGeotification", "identifier": "home" }), Command::RemoveGeotification { identifier: "home".to_string() })]
    #[case::echo(json!({ "action": "echo", "message": "hi" }), Command::Echo { message: "hi".to_string() })]
    #[case::echo_without_message(json!({ "action": "echo" }), Command::Echo { message: "".to_string() })]
    fn parses_commands(#[case] json: Value, #[case] expected: Command) {
        assert_eq!(serde_json::from_value::<Command>(json).unwrap(), expected);
    }

    #[rstest]
    #[case::camel_case("onExit", TriggerOn::OnExit)]
    #[case::label("On Entry", TriggerOn::OnEntry)]
    fn parses_the_flat_add_fields(#[case] trigger: &str, #[case] expected: TriggerOn) {
        let json = json!({
            "action": "addGeotification",
            "latitude": 37.0,
            "longitude": -122.0,
            "radius": 500,
            "type": trigger,
            "identifier": "home"
        });

        let Command::AddGeotification(fields) = serde_json::from_value::<Command>(json).unwrap() else {
            panic!("expected an addGeotification command");
        };
        let candidate = NewGeoRegion::from(fields);

        assert_eq!(candidate.trigger_on, expected);
        assert_eq!(candidate.radius, 500.0);
        assert_eq!(candidate.note, "");
    }

    #[test]
    fn rejects_an_unknown_action() {
        let err = serde_json::from_value::<Command>(json!({ "action": "dance" })).expect_err("expected an error but got Ok");
        assert!(err.to_string().contains("unknown variant"), "unexpected message: {}", err);
    }

    #[test]
    fn rejects_an_unknown_trigger_type() {
        let json = json!({ "action": "addGeotification", "latitude": 1.0, "longitude": 2.0, "radius": 3.0, "type": "onDwell", "identifier": "x" });
        assert!(serde_json::from_value::<Command>(json).is_err());
    }
}
