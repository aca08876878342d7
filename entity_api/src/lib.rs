use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};

pub use entity::{agents, chat_messages, meetings, Id};

pub mod agent;
pub mod chat_message;
pub mod error;
pub mod meeting;

/// Seeds a local database with a demo user's agents and meetings for
/// development. The demo user ID is fixed so an authenticating gateway (or
/// curl with an `x-user-id` header) can address the data.
pub async fn seed_database(db: &DatabaseConnection) {
    let now = Utc::now();
    let demo_user: Id = Id::parse_str("8d57923e-17d0-4bbc-9da9-3f9f034e4a93").unwrap();

    let note_taker = agents::ActiveModel {
        user_id: Set(demo_user),
        name: Set("Note Taker".to_owned()),
        instructions: Set(
            "You are a diligent meeting note taker. Capture decisions, owners, and deadlines."
                .to_owned(),
        ),
        description: Set(Some("Captures structured notes".to_owned())),
        status: Set(entity::agent_status::AgentStatus::Active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();

    agents::ActiveModel {
        user_id: Set(demo_user),
        name: Set("Sales Coach".to_owned()),
        instructions: Set(
            "You are a sales coach. Track objections raised and commitments made.".to_owned(),
        ),
        description: Set(None),
        status: Set(entity::agent_status::AgentStatus::Active),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();

    meetings::ActiveModel {
        user_id: Set(demo_user),
        agent_id: Set(note_taker.id.clone().unwrap()),
        name: Set("Weekly sync".to_owned()),
        status: Set(entity::meeting_status::MeetingStatus::Upcoming),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();

    meetings::ActiveModel {
        user_id: Set(demo_user),
        agent_id: Set(note_taker.id.clone().unwrap()),
        name: Set("Q3 planning".to_owned()),
        status: Set(entity::meeting_status::MeetingStatus::Upcoming),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
        ..Default::default()
    }
    .save(db)
    .await
    .unwrap();
}
