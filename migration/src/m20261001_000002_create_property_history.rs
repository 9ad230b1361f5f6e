use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(PropertyHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PropertyHistory::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PropertyHistory::PropertyId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PropertyHistory::Value)
                            .decimal_len(16, 2)
                            .not_null(),
                    )
                    .col(ColumnDef::new(PropertyHistory::Loan).decimal_len(16, 2).null())
                    .col(ColumnDef::new(PropertyHistory::NetValue).decimal_len(16, 2).null())
                    .col(
                        ColumnDef::new(PropertyHistory::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // History never outlives its property
        manager
            .create_foreign_key(
                ForeignKey::create()
                    .name("fk_property_history_property_id")
                    .from(PropertyHistory::Table, PropertyHistory::PropertyId)
                    .to(Properties::Table, Properties::Id)
                    .on_delete(ForeignKeyAction::Cascade)
                    .to_owned(),
            )
            .await?;

        // Windowed reads: (property_id, recorded_at)
        manager
            .create_index(
                Index::create()
                    .name("idx_property_history_property_time")
                    .table(PropertyHistory::Table)
                    .col(PropertyHistory::PropertyId)
                    .col(PropertyHistory::RecordedAt)
                    .to_owned(),
            )
            .await?;

        // Portfolio-wide windowed reads
        manager
            .create_index(
                Index::create()
                    .name("idx_property_history_recorded_at")
                    .table(PropertyHistory::Table)
                    .col(PropertyHistory::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PropertyHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum PropertyHistory {
    Table,
    Id,
    PropertyId,
    Value,
    Loan,
    NetValue,
    RecordedAt,
}

#[derive(Iden)]
enum Properties {
    Table,
    Id,
}
