use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Admin::Table)
                    .if_not_exists()
                    .col(pk_auto(Admin::Id))
                    .col(string_len(Admin::Email, 255).not_null().unique_key())
                    .col(string_len(Admin::Password, 255).not_null())
                    .col(string_len(Admin::Role, 32).not_null().default("admin"))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OtpCode::Table)
                    .if_not_exists()
                    .col(pk_auto(OtpCode::Id))
                    .col(string_len(OtpCode::PhoneNumber, 32).not_null())
                    .col(string_len(OtpCode::CodeHash, 64).not_null())
                    .col(timestamp_with_time_zone(OtpCode::ExpiresAt).not_null())
                    .col(boolean(OtpCode::Consumed).not_null().default(false))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_otp_code_phone")
                    .table(OtpCode::Table)
                    .col(OtpCode::PhoneNumber)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OtpCode::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Admin::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Admin {
    Table,
    Id,
    Email,
    Password,
    Role,
}

#[derive(DeriveIden)]
enum OtpCode {
    Table,
    Id,
    PhoneNumber,
    CodeHash,
    ExpiresAt,
    Consumed,
}
