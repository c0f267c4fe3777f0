//! # Channel Settings Repository
//!
//! Credentials and property identity for the channel manager account.
//! Read-only to the core; the pusher re-fetches this row on every push so a
//! credential rotation takes effect without a restart.

use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::DbResult;
use bridge_core::ChannelSettings;

/// Repository for channel manager credentials.
#[derive(Debug, Clone)]
pub struct ChannelSettingsRepository {
    pool: SqlitePool,
}

impl ChannelSettingsRepository {
    /// Creates a new ChannelSettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ChannelSettingsRepository { pool }
    }

    /// Loads the settings row for a channel, if configured.
    pub async fn find(&self, channel: &str) -> DbResult<Option<ChannelSettings>> {
        let settings = sqlx::query_as::<_, ChannelSettings>(
            r#"
            SELECT id, channel, api_user, api_pass, property_id
            FROM channel_settings
            WHERE channel = ?1
            LIMIT 1
            "#,
        )
        .bind(channel)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings)
    }

    /// Inserts or replaces the settings for a channel (ops/seeding).
    pub async fn upsert(
        &self,
        channel: &str,
        api_user: &str,
        api_pass: &str,
        property_id: Option<&str>,
    ) -> DbResult<ChannelSettings> {
        let settings = ChannelSettings {
            id: Uuid::new_v4().to_string(),
            channel: channel.to_string(),
            api_user: api_user.to_string(),
            api_pass: api_pass.to_string(),
            property_id: property_id.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO channel_settings (id, channel, api_user, api_pass, property_id)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (channel) DO UPDATE SET
                api_user = excluded.api_user,
                api_pass = excluded.api_pass,
                property_id = excluded.property_id
            "#,
        )
        .bind(&settings.id)
        .bind(&settings.channel)
        .bind(&settings.api_user)
        .bind(&settings.api_pass)
        .bind(&settings.property_id)
        .execute(&self.pool)
        .await?;

        Ok(settings)
    }
}
