use serde::{Deserialize, Serialize};

crate::state_enum! {
    /// Stages of the create → upload → email job.
    pub enum JobState {
        Idle => "idle",
        CreatingAsset => "creatingAsset",
        UploadingAsset => "uploadingAsset",
        EmailingClient => "emailingClient",
        Error => "error",
        Done => "done",
    }
    final: [Done]
    error: [Error]
}

/// Progress recorded by the job. Each field is set once its stage succeeds,
/// which is what lets a retry pick up where the job failed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobContext {
    pub asset_id: Option<String>,
    pub upload_url: Option<String>,
    pub email_sent: bool,
    /// Message of the most recent failure, cleared on retry
    pub error: Option<String>,
}

impl JobContext {
    /// The stage a retry should resume at, if any work is left.
    pub fn resume_point(&self) -> Option<JobState> {
        if self.asset_id.is_none() {
            Some(JobState::CreatingAsset)
        } else if self.upload_url.is_none() {
            Some(JobState::UploadingAsset)
        } else if !self.email_sent {
            Some(JobState::EmailingClient)
        } else {
            None
        }
    }
}
