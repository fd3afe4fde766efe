//! Wire envelopes for the volume and compute endpoints.
//!
//! Both services wrap their payloads in a single-key object named after the
//! resource, so every request and response goes through one of these
//! envelopes.

use serde::{Deserialize, Serialize};

use crate::api::{ServerRecord, VolumeParams, VolumeRecord, VolumeStatus};

#[derive(Serialize)]
pub(crate) struct CreateVolumeBody<'a> {
    pub volume: &'a VolumeParams,
}

#[derive(Deserialize)]
pub(crate) struct VolumeEnvelope {
    pub volume: VolumeWire,
}

#[derive(Deserialize)]
pub(crate) struct VolumeWire {
    pub id: String,
    pub status: VolumeStatus,
    #[serde(default)]
    pub availability_zone: Option<String>,
}

impl From<VolumeWire> for VolumeRecord {
    fn from(value: VolumeWire) -> Self {
        Self {
            id: value.id,
            status: value.status,
            availability_zone: value.availability_zone,
        }
    }
}

#[derive(Deserialize)]
pub(crate) struct ServerEnvelope {
    pub server: ServerWire,
}

#[derive(Deserialize)]
pub(crate) struct ServerWire {
    pub id: String,
    // The compute API namespaces the zone under an extension key.
    #[serde(rename = "OS-EXT-AZ:availability_zone", default)]
    pub availability_zone: Option<String>,
}

impl From<ServerWire> for ServerRecord {
    fn from(value: ServerWire) -> Self {
        Self {
            id: value.id,
            availability_zone: value.availability_zone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_body_nests_params_under_volume_key() {
        let params = VolumeParams {
            display_name: String::from("volume-abc"),
            display_description: Some(String::new()),
            size: 2,
            ..VolumeParams::default()
        };
        let json = serde_json::to_value(CreateVolumeBody { volume: &params }).expect("serialise");
        assert_eq!(json["volume"]["display_name"], "volume-abc");
        assert_eq!(json["volume"]["size"], 2);
    }

    #[test]
    fn volume_envelope_decodes_status_and_zone() {
        let parsed: VolumeEnvelope = serde_json::from_str(
            r#"{"volume":{"id":"v-foobar","status":"creating","availability_zone":"az-1"}}"#,
        )
        .expect("decode");
        let record = VolumeRecord::from(parsed.volume);
        assert_eq!(record.id, "v-foobar");
        assert_eq!(record.status, VolumeStatus::Creating);
        assert_eq!(record.availability_zone.as_deref(), Some("az-1"));
    }

    #[test]
    fn volume_envelope_tolerates_missing_zone() {
        let parsed: VolumeEnvelope =
            serde_json::from_str(r#"{"volume":{"id":"v-foobar","status":"available"}}"#)
                .expect("decode");
        assert_eq!(parsed.volume.availability_zone, None);
    }

    #[test]
    fn server_envelope_decodes_extension_zone_key() {
        let parsed: ServerEnvelope = serde_json::from_str(
            r#"{"server":{"id":"i-test","OS-EXT-AZ:availability_zone":"foobar-land"}}"#,
        )
        .expect("decode");
        let record = ServerRecord::from(parsed.server);
        assert_eq!(record.id, "i-test");
        assert_eq!(record.availability_zone.as_deref(), Some("foobar-land"));
    }
}
