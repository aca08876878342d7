use domain::meeting::MeetingFilter;
use domain::meeting_status::MeetingStatus;
use domain::meetings;
use domain::Id;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub(crate) struct IndexParams {
    /// Filter by lifecycle status
    #[param(value_type = Option<String>)]
    pub(crate) status: Option<MeetingStatus>,
    /// Filter by assigned agent
    pub(crate) agent_id: Option<Id>,
    /// Filter by a name substring
    pub(crate) name: Option<String>,
}

impl From<IndexParams> for MeetingFilter {
    fn from(params: IndexParams) -> Self {
        MeetingFilter {
            status: params.status,
            agent_id: params.agent_id,
            name: params.name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::meeting::CreateParams)]
pub(crate) struct CreateParams {
    pub(crate) name: String,
    pub(crate) agent_id: Id,
}

impl CreateParams {
    /// Builds the entity model for creation; generated fields are filled in
    /// by the entity layer.
    pub(crate) fn into_model(self, user_id: Id) -> meetings::Model {
        meetings::Model {
            id: Id::default(),
            user_id,
            agent_id: self.agent_id,
            name: self.name,
            call_id: None,
            status: MeetingStatus::Upcoming,
            started_at: None,
            ended_at: None,
            duration_seconds: None,
            participants_count: None,
            recording_url: None,
            transcript: None,
            summary: None,
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::meeting::UpdateParams)]
pub(crate) struct UpdateParams {
    pub(crate) name: String,
    pub(crate) agent_id: Id,
}

impl UpdateParams {
    pub(crate) fn apply_to(self, mut model: meetings::Model) -> meetings::Model {
        model.name = self.name;
        model.agent_id = self.agent_id;
        model
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::meeting::ChatMessageParams)]
pub(crate) struct ChatMessageParams {
    /// The user's question about the meeting
    pub(crate) message: String,
}
