use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("CREATE SCHEMA IF NOT EXISTS meetai")
            .await?;

        // Create agent_status enum
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE meetai.agent_status AS ENUM (
                    'active',
                    'inactive',
                    'archived'
                )",
            )
            .await?;

        // Create meeting_status enum
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE meetai.meeting_status AS ENUM (
                    'upcoming',
                    'active',
                    'processing',
                    'completed',
                    'cancelled'
                )",
            )
            .await?;

        // Create chat_role enum
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE TYPE meetai.chat_role AS ENUM (
                    'user',
                    'assistant'
                )",
            )
            .await?;

        // Create agents table
        let create_agents_sql = r#"
            CREATE TABLE IF NOT EXISTS meetai.agents (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL,
                name VARCHAR(255) NOT NULL,
                instructions TEXT NOT NULL,
                description VARCHAR(1024),
                status meetai.agent_status NOT NULL DEFAULT 'active',
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_agents_sql)
            .await?;

        // Create meetings table
        let create_meetings_sql = r#"
            CREATE TABLE IF NOT EXISTS meetai.meetings (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL,
                agent_id UUID NOT NULL
                    REFERENCES meetai.agents(id) ON DELETE NO ACTION,
                name VARCHAR(255) NOT NULL,
                call_id VARCHAR(255),
                status meetai.meeting_status NOT NULL DEFAULT 'upcoming',
                started_at TIMESTAMPTZ,
                ended_at TIMESTAMPTZ,
                duration_seconds INTEGER,
                participants_count INTEGER,
                recording_url TEXT,
                transcript TEXT,
                summary TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_meetings_sql)
            .await?;

        // Webhook events are matched by call id; listings scan by owner.
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_meetings_call_id
                     ON meetai.meetings (call_id)",
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_meetings_user_id_created_at
                     ON meetai.meetings (user_id, created_at DESC)",
            )
            .await?;

        // Create chat_messages table
        let create_chat_messages_sql = r#"
            CREATE TABLE IF NOT EXISTS meetai.chat_messages (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                meeting_id UUID NOT NULL
                    REFERENCES meetai.meetings(id) ON DELETE CASCADE,
                user_id UUID,
                role meetai.chat_role NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_chat_messages_sql)
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_chat_messages_meeting_id_created_at
                     ON meetai.chat_messages (meeting_id, created_at)",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS meetai.chat_messages")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS meetai.meetings")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS meetai.agents")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS meetai.chat_role")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS meetai.meeting_status")
            .await?;
        manager
            .get_connection()
            .execute_unprepared("DROP TYPE IF EXISTS meetai.agent_status")
            .await?;

        Ok(())
    }
}
