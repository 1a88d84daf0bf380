use crate::core::{Event, Signal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// External events understood by the job pipeline.
///
/// Serializes as `{"type": "ASSET_CREATED", "assetId": "a1"}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum JobEvent {
    #[serde(rename = "CREATE_ASSET")]
    CreateAsset,

    #[serde(rename = "ASSET_CREATED", rename_all = "camelCase")]
    AssetCreated { asset_id: String },

    #[serde(rename = "UPLOAD_ASSET")]
    UploadAsset,

    #[serde(rename = "ASSET_UPLOADED", rename_all = "camelCase")]
    AssetUploaded { upload_url: String },

    #[serde(rename = "EMAIL_CLIENT")]
    EmailClient,

    #[serde(rename = "EMAIL_SENT")]
    EmailSent,

    #[serde(rename = "ERROR")]
    Error { message: String },

    #[serde(rename = "RETRY")]
    Retry,
}

impl Event for JobEvent {
    fn name(&self) -> &str {
        match self {
            Self::CreateAsset => "CREATE_ASSET",
            Self::AssetCreated { .. } => "ASSET_CREATED",
            Self::UploadAsset => "UPLOAD_ASSET",
            Self::AssetUploaded { .. } => "ASSET_UPLOADED",
            Self::EmailClient => "EMAIL_CLIENT",
            Self::EmailSent => "EMAIL_SENT",
            Self::Error { .. } => "ERROR",
            Self::Retry => "RETRY",
        }
    }
}

fn output_field(signal: &Signal<JobEvent>, field: &str) -> Option<String> {
    signal
        .output()
        .and_then(|output| output.get(field))
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Asset id carried by `ASSET_CREATED` or a create step's output.
pub(crate) fn created_asset(signal: &Signal<JobEvent>) -> Option<String> {
    match signal {
        Signal::Event(JobEvent::AssetCreated { asset_id }) => Some(asset_id.clone()),
        _ => output_field(signal, "assetId"),
    }
}

/// Upload URL carried by `ASSET_UPLOADED` or an upload step's output.
pub(crate) fn uploaded_url(signal: &Signal<JobEvent>) -> Option<String> {
    match signal {
        Signal::Event(JobEvent::AssetUploaded { upload_url }) => Some(upload_url.clone()),
        _ => output_field(signal, "uploadUrl"),
    }
}

/// Failure message carried by `ERROR` or a failed step.
pub(crate) fn failure_message(signal: &Signal<JobEvent>) -> Option<String> {
    match signal {
        Signal::Event(JobEvent::Error { message }) => Some(message.clone()),
        Signal::Error { error } => Some(error.message().to_string()),
        _ => None,
    }
}
