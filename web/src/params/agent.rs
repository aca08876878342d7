use domain::agent_status::AgentStatus;
use domain::agents;
use domain::Id;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::agent::CreateParams)]
pub(crate) struct CreateParams {
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) description: Option<String>,
}

impl CreateParams {
    pub(crate) fn into_model(self, user_id: Id) -> agents::Model {
        agents::Model {
            id: Id::default(),
            user_id,
            name: self.name,
            instructions: self.instructions,
            description: self.description,
            status: AgentStatus::Active,
            created_at: Default::default(),
            updated_at: Default::default(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(as = params::agent::UpdateParams)]
pub(crate) struct UpdateParams {
    pub(crate) name: String,
    pub(crate) instructions: String,
    pub(crate) description: Option<String>,
    #[schema(value_type = String)]
    pub(crate) status: AgentStatus,
}

impl UpdateParams {
    pub(crate) fn apply_to(self, mut model: agents::Model) -> agents::Model {
        model.name = self.name;
        model.instructions = self.instructions;
        model.description = self.description;
        model.status = self.status;
        model
    }
}
