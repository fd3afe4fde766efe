//! Cloud API seam for volume and server operations.
//!
//! The adapter in [`crate::disk`] talks to the remote cloud exclusively
//! through the [`CloudApi`] trait so tests can substitute a scripted double
//! for the HTTP client in [`crate::openstack`].

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Parameters sent with a volume-create call.
///
/// Optional fields are omitted from the serialised request body entirely so
/// the remote API applies its own defaults.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct VolumeParams {
    /// Display name, generated uniquely per call (`volume-<unique>`).
    pub display_name: String,
    /// Display description; present but empty for data disks, omitted for
    /// boot disks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    /// Requested size in GiB, already rounded up from the caller's MiB value.
    pub size: u64,
    /// Provider volume type, when the caller's options request one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    /// Source image reference for boot volumes.
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    /// Availability zone, when zone policy attaches one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
}

/// Status reported by the remote volume backend.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(from = "String")]
pub enum VolumeStatus {
    /// The volume is being allocated.
    Creating,
    /// The volume is ready for attachment.
    Available,
    /// Allocation failed on the provider side.
    Error,
    /// The volume is being removed.
    Deleting,
    /// Any status value this crate does not interpret.
    Unknown(String),
}

impl VolumeStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "creating",
            Self::Available => "available",
            Self::Error => "error",
            Self::Deleting => "deleting",
            Self::Unknown(value) => value.as_str(),
        }
    }
}

impl std::fmt::Display for VolumeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for VolumeStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "creating" => Self::Creating,
            "available" => Self::Available,
            "error" => Self::Error,
            "deleting" => Self::Deleting,
            _ => Self::Unknown(value),
        }
    }
}

/// Read-only snapshot of a remote volume.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VolumeRecord {
    /// Provider-assigned volume identifier.
    pub id: String,
    /// Current status reported by the provider.
    pub status: VolumeStatus,
    /// Zone the volume landed in, when the provider reports one.
    pub availability_zone: Option<String>,
}

/// Read-only snapshot of a remote server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerRecord {
    /// Provider-assigned server identifier.
    pub id: String,
    /// Zone the server is running in, when the provider reports one.
    pub availability_zone: Option<String>,
}

/// Caller-supplied disk options, decoded from the orchestrator's cloud
/// properties mapping.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct DiskOptions {
    /// Provider volume type (mapping key `type`). Unset leaves the field out
    /// of the create call so the provider default applies.
    #[serde(rename = "type", default)]
    pub volume_type: Option<String>,
}

impl DiskOptions {
    /// Decodes options from a raw properties mapping. Unknown keys are
    /// ignored, matching the orchestrator contract.
    ///
    /// # Errors
    ///
    /// Returns the decode error when a recognised key carries a value of the
    /// wrong shape (for example a non-string `type`).
    pub fn from_properties(properties: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(properties)
    }
}

/// Future returned by cloud API operations.
pub type ApiFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface onto the remote volume and compute backends.
pub trait CloudApi {
    /// Provider specific error type returned by the API client.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issues one volume-create call and returns the created resource.
    fn create_volume<'a>(
        &'a self,
        params: &'a VolumeParams,
    ) -> ApiFuture<'a, VolumeRecord, Self::Error>;

    /// Fetches the current state of a volume; `None` when the provider no
    /// longer knows the identifier.
    fn get_volume<'a>(
        &'a self,
        volume_id: &'a str,
    ) -> ApiFuture<'a, Option<VolumeRecord>, Self::Error>;

    /// Requests deletion of a volume.
    fn delete_volume<'a>(&'a self, volume_id: &'a str) -> ApiFuture<'a, (), Self::Error>;

    /// Fetches a server, primarily for availability-zone inheritance.
    fn get_server<'a>(&'a self, server_id: &'a str) -> ApiFuture<'a, ServerRecord, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_params_omit_unset_optional_fields() {
        let params = VolumeParams {
            display_name: String::from("volume-1"),
            display_description: Some(String::new()),
            size: 2,
            ..VolumeParams::default()
        };
        let json = serde_json::to_value(&params).expect("serialise");
        assert_eq!(json["display_name"], "volume-1");
        assert_eq!(json["display_description"], "");
        assert_eq!(json["size"], 2);
        assert!(json.get("volume_type").is_none());
        assert!(json.get("imageRef").is_none());
        assert!(json.get("availability_zone").is_none());
    }

    #[test]
    fn volume_params_rename_image_ref_on_the_wire() {
        let params = VolumeParams {
            display_name: String::from("volume-1"),
            size: 2,
            image_ref: Some(String::from("image-uuid")),
            ..VolumeParams::default()
        };
        let json = serde_json::to_value(&params).expect("serialise");
        assert_eq!(json["imageRef"], "image-uuid");
        assert!(json.get("image_ref").is_none());
        assert!(json.get("display_description").is_none());
    }

    #[test]
    fn volume_status_maps_known_and_unknown_values() {
        assert_eq!(VolumeStatus::from(String::from("available")), VolumeStatus::Available);
        assert_eq!(VolumeStatus::from(String::from("creating")), VolumeStatus::Creating);
        let odd = VolumeStatus::from(String::from("backing-up"));
        assert_eq!(odd, VolumeStatus::Unknown(String::from("backing-up")));
        assert_eq!(odd.as_str(), "backing-up");
    }

    #[test]
    fn disk_options_decode_type_and_ignore_unknown_keys() {
        let options = DiskOptions::from_properties(serde_json::json!({
            "type": "vstore",
            "unrelated": 42,
        }))
        .expect("decode");
        assert_eq!(options.volume_type.as_deref(), Some("vstore"));

        let empty = DiskOptions::from_properties(serde_json::json!({})).expect("decode");
        assert_eq!(empty, DiskOptions::default());
    }
}
