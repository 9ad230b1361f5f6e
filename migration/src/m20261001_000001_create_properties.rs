use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Properties::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Properties::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Properties::Url).text().null().unique_key())
                    .col(ColumnDef::new(Properties::Address).text().not_null())
                    .col(ColumnDef::new(Properties::Nickname).string().null())
                    .col(
                        ColumnDef::new(Properties::PropertyType)
                            .string_len(16)
                            .not_null()
                            .default("investment"),
                    )
                    .col(ColumnDef::new(Properties::DwellingType).string_len(64).null())
                    .col(ColumnDef::new(Properties::ImageUrl).text().null())
                    .col(ColumnDef::new(Properties::Bedrooms).integer().null())
                    .col(ColumnDef::new(Properties::Bathrooms).integer().null())
                    .col(ColumnDef::new(Properties::Parking).integer().null())
                    .col(ColumnDef::new(Properties::Suburb).string().null())
                    .col(ColumnDef::new(Properties::State).string_len(8).null())
                    .col(ColumnDef::new(Properties::Postcode).string_len(8).null())
                    // Money columns: 14 integer digits, cents precision
                    .col(ColumnDef::new(Properties::CurrentValue).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Properties::PreviousValue).decimal_len(16, 2).null())
                    .col(ColumnDef::new(Properties::OutstandingLoan).decimal_len(16, 2).null())
                    .col(
                        ColumnDef::new(Properties::MonthlyLoanRepayment)
                            .decimal_len(16, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(Properties::RentAmount).decimal_len(16, 2).null())
                    .col(
                        ColumnDef::new(Properties::RentFrequency)
                            .string_len(16)
                            .not_null()
                            .default("monthly"),
                    )
                    .col(ColumnDef::new(Properties::YearlyExpenses).decimal_len(16, 2).null())
                    .col(
                        ColumnDef::new(Properties::Status)
                            .string_len(16)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Properties::LastUpdated)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Properties::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_properties_created_at")
                    .table(Properties::Table)
                    .col((Properties::CreatedAt, IndexOrder::Desc))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_properties_property_type")
                    .table(Properties::Table)
                    .col(Properties::PropertyType)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Properties::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Properties {
    Table,
    Id,
    Url,
    Address,
    Nickname,
    PropertyType,
    DwellingType,
    ImageUrl,
    Bedrooms,
    Bathrooms,
    Parking,
    Suburb,
    State,
    Postcode,
    CurrentValue,
    PreviousValue,
    OutstandingLoan,
    MonthlyLoanRepayment,
    RentAmount,
    RentFrequency,
    YearlyExpenses,
    Status,
    LastUpdated,
    CreatedAt,
}
