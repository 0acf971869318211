use vexi_machine_core::fixtures::{blend_machine, button_machine, listener_scene};
use vexi_machine_core::StateMachineDef;

fn roundtrip(def: &StateMachineDef) -> StateMachineDef {
    let json = serde_json::to_string(def).unwrap();
    serde_json::from_str(&json).unwrap()
}

#[test]
fn definitions_survive_a_json_roundtrip() {
    let (def, _) = button_machine();
    assert_eq!(roundtrip(&def), *def);

    let (def, _) = blend_machine();
    assert_eq!(roundtrip(&def), *def);

    let (def, _) = listener_scene();
    assert_eq!(roundtrip(&def), *def);
}

#[test]
fn omitted_optional_fields_default() {
    let json = r#"{
        "name": "minimal",
        "layers": [
            {
                "name": "main",
                "states": ["Entry"],
                "transitions": [[]]
            }
        ]
    }"#;
    let def: StateMachineDef = serde_json::from_str(json).unwrap();
    assert!(def.inputs.is_empty());
    assert!(def.timelines.is_empty());
    assert!(def.listeners.is_empty());
    assert!(def.validate().is_ok());
}
