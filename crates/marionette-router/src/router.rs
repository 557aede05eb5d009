//! The command action table.
//!
//! One entry per external action. Every handler validates its whole
//! payload before any control message is queued, so a rejected command
//! never leaves partial state behind. Success results echo the effective
//! values back to the caller.

use marionette_model::asset::ModelDescriptor;
use marionette_model::session::ModelSession;
use marionette_types::{
    CommandEnvelope, CommandResult, ConfigValue, ControlMessage, InstantConfigKey, MotionRequest,
    SequenceSelector,
};
use serde_json::{Map, Value};
use tracing::debug;

use crate::extract;

/// Failure message for actions that need a loaded model.
pub const MODEL_UNAVAILABLE: &str = "model is not available";

/// Failure message for actions outside the table.
pub const UNKNOWN_ACTION: &str = "Unknown action";

/// Control messages plus the fields to echo on success.
struct Routed {
    messages: Vec<ControlMessage>,
    details: Map<String, Value>,
}

impl Routed {
    fn one(message: ControlMessage, details: Map<String, Value>) -> Self {
        Self {
            messages: vec![message],
            details,
        }
    }
}

/// Handler shape an action resolves to.
enum Action {
    /// Starts an asynchronous load; works with or without an active model.
    LoadModel,
    /// Reads the active model's control surface.
    ModelInfo,
    /// Validates the payload into control messages for the active model.
    Messages(fn(&Map<String, Value>) -> Result<Routed, String>),
}

fn resolve(action: &str) -> Option<Action> {
    let handler = match action {
        "loadModel" => Action::LoadModel,
        "getModelInfo" => Action::ModelInfo,
        "setParameter" => Action::Messages(set_parameter),
        "setParameters" => Action::Messages(set_parameters),
        "playMotion" => Action::Messages(play_motion),
        "playRandomMotion" => Action::Messages(play_random_motion),
        "stopMotion" => Action::Messages(stop_motion),
        "setExpression" => Action::Messages(set_expression),
        "setPart" => Action::Messages(set_part),
        "setParts" => Action::Messages(set_parts),
        "setAutoBreath" => Action::Messages(set_auto_breath),
        "setAutoEyeBlink" => Action::Messages(set_auto_eye_blink),
        "setTrackMouse" => Action::Messages(set_track_mouse),
        "setFocus" => Action::Messages(set_focus),
        "setCamera" => Action::Messages(set_camera),
        "playSequence" => Action::Messages(play_sequence),
        "stopSequence" => Action::Messages(stop_sequence),
        "setBodyGroup" => Action::Messages(set_bodygroup),
        "setSkin" => Action::Messages(set_skin),
        "setSequenceSpeed" => Action::Messages(set_sequence_speed),
        "setSequenceLoop" => Action::Messages(set_sequence_loop),
        _ => return None,
    };
    Some(handler)
}

/// Route one command envelope against the session.
///
/// Rejections carry no side effects: an unknown action, a missing model,
/// or an invalid payload each return a failure with zero control
/// messages queued. A success means the command was accepted and its
/// messages queued for the next tick, not that the scene has already
/// changed.
pub fn route(envelope: &CommandEnvelope, session: &mut ModelSession) -> CommandResult {
    let Some(action) = resolve(&envelope.action) else {
        debug!(action = %envelope.action, "unknown action");
        return CommandResult::fail(UNKNOWN_ACTION);
    };

    match action {
        Action::LoadModel => load_model(&envelope.data, session),
        Action::ModelInfo => model_info(session),
        Action::Messages(handler) => {
            if !session.is_active() {
                return CommandResult::fail(MODEL_UNAVAILABLE);
            }
            match handler(&envelope.data) {
                Ok(routed) => {
                    for message in routed.messages {
                        session.enqueue(message);
                    }
                    CommandResult::ok_with(&envelope.action, routed.details)
                }
                Err(message) => CommandResult::fail(message),
            }
        }
    }
}

fn load_model(data: &Map<String, Value>, session: &mut ModelSession) -> CommandResult {
    let Ok(descriptor) =
        serde_json::from_value::<ModelDescriptor>(Value::Object(data.clone()))
    else {
        return CommandResult::fail("name, modelType, and entranceFile are required");
    };

    let mut details = Map::new();
    details.insert("name".to_owned(), Value::from(descriptor.name.clone()));
    session.request_load(descriptor);
    CommandResult::ok_with("loadModel", details)
}

fn model_info(session: &ModelSession) -> CommandResult {
    let Some(info) = session.control_info() else {
        return CommandResult::fail(MODEL_UNAVAILABLE);
    };
    match serde_json::to_value(info) {
        Ok(Value::Object(details)) => CommandResult::ok_with("getModelInfo", details),
        Ok(_) | Err(_) => CommandResult::fail("model info is not serializable"),
    }
}

fn set_parameter(data: &Map<String, Value>) -> Result<Routed, String> {
    let (Some(id), Some(value)) = (
        extract::str_field(data, "parameterId"),
        extract::f64_field(data, "value"),
    ) else {
        return Err("parameterId and value are required".to_owned());
    };

    let mut details = Map::new();
    details.insert("parameterId".to_owned(), Value::from(id));
    details.insert("value".to_owned(), Value::from(value));
    Ok(Routed::one(
        ControlMessage::SetParameter {
            parameter_id: id.to_owned(),
            value,
        },
        details,
    ))
}

fn set_parameters(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(entries) = extract::array_field(data, "parameters") else {
        return Err("parameters must be an array".to_owned());
    };

    // Validate the whole batch before queueing anything. Entries may
    // address the parameter as `parameterId` or the shorter `id`.
    let mut messages = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry
            .get("parameterId")
            .or_else(|| entry.get("id"))
            .and_then(Value::as_str);
        let (Some(id), Some(value)) = (id, entry.get("value").and_then(Value::as_f64)) else {
            return Err("each parameter entry requires parameterId and value".to_owned());
        };
        messages.push(ControlMessage::SetParameter {
            parameter_id: id.to_owned(),
            value,
        });
    }

    let mut details = Map::new();
    details.insert("count".to_owned(), Value::from(messages.len()));
    Ok(Routed { messages, details })
}

fn play_motion(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(group) = extract::str_field(data, "group") else {
        return Err("group is required".to_owned());
    };
    let index = extract::u32_field(data, "index");
    let file = extract::str_field(data, "file");

    let mut details = Map::new();
    details.insert("group".to_owned(), Value::from(group));
    if let Some(index) = index {
        details.insert("index".to_owned(), Value::from(index));
    }
    Ok(Routed::one(
        ControlMessage::PlayMotion {
            motion: MotionRequest {
                group: Some(group.to_owned()),
                index,
                file: file.map(str::to_owned),
                random: false,
            },
        },
        details,
    ))
}

fn play_random_motion(data: &Map<String, Value>) -> Result<Routed, String> {
    let group = extract::str_field(data, "group");

    let mut details = Map::new();
    if let Some(group) = group {
        details.insert("group".to_owned(), Value::from(group));
    }
    Ok(Routed::one(
        ControlMessage::PlayMotion {
            motion: MotionRequest::random(group.map(str::to_owned)),
        },
        details,
    ))
}

fn stop_motion(_data: &Map<String, Value>) -> Result<Routed, String> {
    Ok(Routed::one(
        ControlMessage::PlayMotion {
            motion: MotionRequest::stop(),
        },
        Map::new(),
    ))
}

fn set_expression(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(expression) = extract::str_field(data, "expression") else {
        return Err("expression is required".to_owned());
    };

    let mut details = Map::new();
    details.insert("expression".to_owned(), Value::from(expression));
    Ok(Routed::one(
        ControlMessage::SetExpression {
            expression: expression.to_owned(),
        },
        details,
    ))
}

fn set_part(data: &Map<String, Value>) -> Result<Routed, String> {
    let (Some(id), Some(value)) = (
        extract::str_field(data, "partId"),
        extract::f64_field(data, "value"),
    ) else {
        return Err("partId and value are required".to_owned());
    };

    let mut details = Map::new();
    details.insert("partId".to_owned(), Value::from(id));
    details.insert("value".to_owned(), Value::from(value));
    Ok(Routed::one(
        ControlMessage::SetPart {
            part_id: id.to_owned(),
            value,
        },
        details,
    ))
}

fn set_parts(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(entries) = extract::array_field(data, "parts") else {
        return Err("parts must be an array".to_owned());
    };

    let mut messages = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = entry
            .get("partId")
            .or_else(|| entry.get("id"))
            .and_then(Value::as_str);
        let (Some(id), Some(value)) = (id, entry.get("value").and_then(Value::as_f64)) else {
            return Err("each part entry requires partId and value".to_owned());
        };
        messages.push(ControlMessage::SetPart {
            part_id: id.to_owned(),
            value,
        });
    }

    let mut details = Map::new();
    details.insert("count".to_owned(), Value::from(messages.len()));
    Ok(Routed { messages, details })
}

fn toggle(data: &Map<String, Value>, key: InstantConfigKey) -> Result<Routed, String> {
    let Some(enabled) = extract::bool_field(data, "enabled") else {
        return Err("enabled is required".to_owned());
    };

    let mut details = Map::new();
    details.insert("enabled".to_owned(), Value::from(enabled));
    Ok(Routed::one(
        ControlMessage::ChangeInstantConfig {
            name: key,
            value: ConfigValue::Bool(enabled),
        },
        details,
    ))
}

fn set_auto_breath(data: &Map<String, Value>) -> Result<Routed, String> {
    toggle(data, InstantConfigKey::AutoBreath)
}

fn set_auto_eye_blink(data: &Map<String, Value>) -> Result<Routed, String> {
    toggle(data, InstantConfigKey::AutoEyeBlink)
}

fn set_track_mouse(data: &Map<String, Value>) -> Result<Routed, String> {
    toggle(data, InstantConfigKey::TrackMouse)
}

fn set_focus(data: &Map<String, Value>) -> Result<Routed, String> {
    let (Some(x), Some(y)) = (
        extract::f64_field(data, "x"),
        extract::f64_field(data, "y"),
    ) else {
        return Err("x and y are required".to_owned());
    };

    let mut details = Map::new();
    details.insert("x".to_owned(), Value::from(x));
    details.insert("y".to_owned(), Value::from(y));
    Ok(Routed::one(ControlMessage::SetFocus { x, y }, details))
}

fn set_camera(data: &Map<String, Value>) -> Result<Routed, String> {
    let (Some(yaw), Some(pitch), Some(distance)) = (
        extract::f64_field(data, "yaw"),
        extract::f64_field(data, "pitch"),
        extract::f64_field(data, "distance"),
    ) else {
        return Err("yaw, pitch, and distance are required".to_owned());
    };

    let mut details = Map::new();
    details.insert("yaw".to_owned(), Value::from(yaw));
    details.insert("pitch".to_owned(), Value::from(pitch));
    details.insert("distance".to_owned(), Value::from(distance));
    Ok(Routed::one(
        ControlMessage::SetCamera {
            yaw,
            pitch,
            distance,
        },
        details,
    ))
}

fn play_sequence(data: &Map<String, Value>) -> Result<Routed, String> {
    let selector = if let Some(index) = extract::usize_field(data, "sequenceIndex") {
        SequenceSelector::Index(index)
    } else if let Some(name) = extract::str_field(data, "sequenceName") {
        SequenceSelector::Name(name.to_owned())
    } else {
        return Err("sequenceIndex or sequenceName is required".to_owned());
    };

    let mut details = Map::new();
    match &selector {
        SequenceSelector::Index(index) => {
            details.insert("sequenceIndex".to_owned(), Value::from(*index));
        }
        SequenceSelector::Name(name) => {
            details.insert("sequenceName".to_owned(), Value::from(name.as_str()));
        }
    }
    Ok(Routed::one(
        ControlMessage::PlaySequence { selector },
        details,
    ))
}

fn stop_sequence(_data: &Map<String, Value>) -> Result<Routed, String> {
    Ok(Routed::one(ControlMessage::StopSequence, Map::new()))
}

fn set_bodygroup(data: &Map<String, Value>) -> Result<Routed, String> {
    let (Some(index), Some(value)) = (
        extract::usize_field(data, "bodyGroupIndex"),
        extract::u32_field(data, "value"),
    ) else {
        return Err("bodyGroupIndex and value are required".to_owned());
    };

    let mut details = Map::new();
    details.insert("bodyGroupIndex".to_owned(), Value::from(index));
    details.insert("value".to_owned(), Value::from(value));
    Ok(Routed::one(
        ControlMessage::SetBodygroup { index, value },
        details,
    ))
}

fn set_skin(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(index) = extract::usize_field(data, "skinIndex") else {
        return Err("skinIndex is required".to_owned());
    };

    let mut details = Map::new();
    details.insert("skinIndex".to_owned(), Value::from(index));
    Ok(Routed::one(ControlMessage::SetSkin { index }, details))
}

fn set_sequence_speed(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(speed) = extract::f64_field(data, "speed") else {
        return Err("speed is required".to_owned());
    };
    // Echo the clamped value actually applied.
    let effective = speed.max(0.0);

    let mut details = Map::new();
    details.insert("speed".to_owned(), Value::from(effective));
    Ok(Routed::one(
        ControlMessage::ChangeInstantConfig {
            name: InstantConfigKey::AnimationSpeed,
            value: ConfigValue::Number(effective),
        },
        details,
    ))
}

fn set_sequence_loop(data: &Map<String, Value>) -> Result<Routed, String> {
    let Some(looping) = extract::bool_field(data, "loop") else {
        return Err("loop is required".to_owned());
    };

    let mut details = Map::new();
    details.insert("loop".to_owned(), Value::from(looping));
    Ok(Routed::one(
        ControlMessage::ChangeInstantConfig {
            name: InstantConfigKey::LoopAnimation,
            value: ConfigValue::Bool(looping),
        },
        details,
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marionette_model::asset::{
        AssetSource, ModelAsset, ModelControlInfo, ModelKind, SceneHandle, SequenceInfo,
    };
    use marionette_model::error::ModelError;
    use marionette_model::manager::ModelManager;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    struct StubSource;

    impl AssetSource for StubSource {
        fn load(&self, descriptor: &ModelDescriptor) -> Result<ModelAsset, ModelError> {
            Ok(ModelAsset {
                scene: SceneHandle::new(1),
                parameters: vec!["Mouth".to_owned(), "EyeL".to_owned()],
                parts: vec!["PartArmL".to_owned()],
                motions: BTreeMap::new(),
                sequences: match descriptor.kind {
                    ModelKind::Skeletal => vec![SequenceInfo {
                        name: Some("walk".to_owned()),
                        frame_count: 60,
                        fps: Some(30.0),
                    }],
                    _ => Vec::new(),
                },
                bodygroups: vec!["head".to_owned()],
                skin_count: 2,
                nodes: Vec::new(),
            })
        }
    }

    fn active_session(kind: ModelKind) -> ModelSession {
        let descriptor = ModelDescriptor {
            name: "test".to_owned(),
            kind,
            entrance_file: PathBuf::from("/models/test.json"),
        };
        let mut session = ModelSession::new();
        session.request_load(descriptor.clone());
        let (generation, _) = session.take_load_request().unwrap();
        let loaded = ModelManager::load(&StubSource, &descriptor).unwrap();
        session.complete_load(generation, Ok(loaded));
        session
    }

    fn envelope(action: &str, data: &str) -> CommandEnvelope {
        CommandEnvelope::with_data(action, serde_json::from_str(data).unwrap())
    }

    fn mouth_value(session: &ModelSession) -> Option<f64> {
        match session.manager() {
            Some(ModelManager::Puppet(puppet)) => puppet.parameter("Mouth"),
            _ => None,
        }
    }

    fn camera_yaw(session: &ModelSession) -> Option<f64> {
        match session.manager() {
            Some(ModelManager::Mesh(mesh)) => Some(mesh.camera().yaw),
            _ => None,
        }
    }

    #[test]
    fn unknown_action_is_rejected() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(&CommandEnvelope::new("danceBattle"), &mut session);
        assert_eq!(result.error(), Some(UNKNOWN_ACTION));
    }

    #[test]
    fn model_required_actions_fail_without_model() {
        let mut session = ModelSession::new();
        let result = route(
            &envelope("setParameter", r#"{"parameterId":"Mouth","value":1.0}"#),
            &mut session,
        );
        assert_eq!(result.error(), Some(MODEL_UNAVAILABLE));

        // Nothing queued: draining applies nothing once a model loads.
        session.drain();
    }

    #[test]
    fn set_parameter_echoes_and_applies() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(
            &envelope("setParameter", r#"{"parameterId":"Mouth","value":0.7}"#),
            &mut session,
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("success"), Some(&Value::Bool(true)));
        assert_eq!(
            json.get("parameterId").and_then(Value::as_str),
            Some("Mouth")
        );

        session.drain();
        assert_eq!(mouth_value(&session), Some(0.7));
    }

    #[test]
    fn set_parameter_missing_field_is_rejected() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(
            &envelope("setParameter", r#"{"parameterId":"Mouth"}"#),
            &mut session,
        );
        assert_eq!(result.error(), Some("parameterId and value are required"));
    }

    #[test]
    fn batch_applies_in_order() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(
            &envelope(
                "setParameters",
                r#"{"parameters":[
                    {"parameterId":"Mouth","value":1.0},
                    {"parameterId":"Mouth","value":0.3}
                ]}"#,
            ),
            &mut session,
        );
        assert!(result.is_success());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("count").and_then(Value::as_u64), Some(2));

        session.drain();
        assert_eq!(mouth_value(&session), Some(0.3));
    }

    #[test]
    fn batch_accepts_short_id_key() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(
            &envelope(
                "setParameters",
                r#"{"parameters":[
                    {"id":"Mouth","value":1.0},
                    {"id":"Mouth","value":0.3}
                ]}"#,
            ),
            &mut session,
        );
        assert!(result.is_success());

        session.drain();
        assert_eq!(mouth_value(&session), Some(0.3));
    }

    #[test]
    fn invalid_batch_entry_rejects_whole_batch() {
        let mut session = active_session(ModelKind::Puppet);
        route(
            &envelope("setParameter", r#"{"parameterId":"Mouth","value":0.5}"#),
            &mut session,
        );
        session.drain();

        let result = route(
            &envelope(
                "setParameters",
                r#"{"parameters":[
                    {"parameterId":"Mouth","value":1.0},
                    {"parameterId":"EyeL"}
                ]}"#,
            ),
            &mut session,
        );
        assert!(!result.is_success());

        // The valid leading entry was not applied either.
        session.drain();
        assert_eq!(mouth_value(&session), Some(0.5));
    }

    #[test]
    fn load_model_works_without_active_model() {
        let mut session = ModelSession::new();
        let result = route(
            &envelope(
                "loadModel",
                r#"{"name":"akari","modelType":"skeletal","entranceFile":"/models/akari.mdl"}"#,
            ),
            &mut session,
        );
        assert!(result.is_success());

        let (_, descriptor) = session.take_load_request().unwrap();
        assert_eq!(descriptor.name, "akari");
        assert_eq!(descriptor.kind, ModelKind::Skeletal);
    }

    #[test]
    fn load_model_rejects_bad_descriptor() {
        let mut session = ModelSession::new();
        let result = route(&envelope("loadModel", r#"{"name":"akari"}"#), &mut session);
        assert!(!result.is_success());
        assert!(session.take_load_request().is_none());
    }

    #[test]
    fn model_info_reflects_active_model() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(&CommandEnvelope::new("getModelInfo"), &mut session);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("success"), Some(&Value::Bool(true)));
        assert!(json.get("parameters").is_some());
    }

    #[test]
    fn play_sequence_accepts_index_or_name() {
        let mut session = active_session(ModelKind::Skeletal);
        assert!(route(
            &envelope("playSequence", r#"{"sequenceIndex":0}"#),
            &mut session
        )
        .is_success());
        assert!(route(
            &envelope("playSequence", r#"{"sequenceName":"walk"}"#),
            &mut session
        )
        .is_success());
        assert!(!route(&envelope("playSequence", "{}"), &mut session).is_success());
    }

    #[test]
    fn sequence_speed_echoes_clamped_value() {
        let mut session = active_session(ModelKind::Skeletal);
        let result = route(
            &envelope("setSequenceSpeed", r#"{"speed":-2.0}"#),
            &mut session,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("speed").and_then(Value::as_f64), Some(0.0));
    }

    #[test]
    fn set_camera_reframes_mesh() {
        let mut session = active_session(ModelKind::Mesh);
        let result = route(
            &envelope("setCamera", r#"{"yaw":1.2,"pitch":-0.3,"distance":5.0}"#),
            &mut session,
        );
        assert!(result.is_success());
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json.get("distance").and_then(Value::as_f64), Some(5.0));

        session.drain();
        let yaw = camera_yaw(&session).unwrap();
        assert!((yaw - 1.2).abs() < f64::EPSILON);
    }

    #[test]
    fn set_camera_requires_all_components() {
        let mut session = active_session(ModelKind::Mesh);
        let result = route(
            &envelope("setCamera", r#"{"yaw":1.2,"pitch":-0.3}"#),
            &mut session,
        );
        assert_eq!(result.error(), Some("yaw, pitch, and distance are required"));
    }

    #[test]
    fn toggle_requires_enabled() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(&envelope("setAutoBreath", "{}"), &mut session);
        assert_eq!(result.error(), Some("enabled is required"));

        assert!(route(
            &envelope("setAutoBreath", r#"{"enabled":false}"#),
            &mut session
        )
        .is_success());
    }

    #[test]
    fn stop_motion_needs_no_payload() {
        let mut session = active_session(ModelKind::Puppet);
        let result = route(&CommandEnvelope::new("stopMotion"), &mut session);
        assert!(result.is_success());
    }
}
