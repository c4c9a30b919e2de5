//! Create incident table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Incident::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Incident::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Incident::UserId).string_len(64).not_null())
                    .col(ColumnDef::new(Incident::ActorId).string_len(64).not_null())
                    .col(ColumnDef::new(Incident::GuildId).string_len(64).not_null())
                    .col(ColumnDef::new(Incident::Action).string_len(32).not_null())
                    .col(ColumnDef::new(Incident::Reason).text().not_null())
                    .col(
                        ColumnDef::new(Incident::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Incident::DurationMs).big_integer())
                    .col(ColumnDef::new(Incident::ConcludedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Incident::Conclusion).string_len(16))
                    .to_owned(),
            )
            .await?;

        // Index: (concluded_at, action) - startup scan of active time-bounded incidents
        manager
            .create_index(
                Index::create()
                    .name("idx_incident_active")
                    .table(Incident::Table)
                    .col(Incident::ConcludedAt)
                    .col(Incident::Action)
                    .to_owned(),
            )
            .await?;

        // Index: (guild_id, user_id) - per-member history
        manager
            .create_index(
                Index::create()
                    .name("idx_incident_guild_user")
                    .table(Incident::Table)
                    .col(Incident::GuildId)
                    .col(Incident::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Incident::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Incident {
    Table,
    Id,
    UserId,
    ActorId,
    GuildId,
    Action,
    Reason,
    IssuedAt,
    DurationMs,
    ConcludedAt,
    Conclusion,
}
