use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Cinema::Table)
                    .if_not_exists()
                    .col(pk_auto(Cinema::CinemaId))
                    .col(string_len(Cinema::Name, 255).not_null())
                    .col(string_len(Cinema::Location, 255).not_null())
                    .col(string_len_null(Cinema::OpeningHours, 100))
                    .col(
                        timestamp_with_time_zone(Cinema::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Cinema::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Cinema {
    Table,
    CinemaId,
    Name,
    Location,
    OpeningHours,
    CreatedAt,
}
