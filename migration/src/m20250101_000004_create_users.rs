use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string_len(Users::Name, 255).not_null())
                    .col(string_len(Users::Username, 50).not_null().unique_key())
                    .col(string_len(Users::Email, 255).not_null().unique_key())
                    .col(date_null(Users::Dob))
                    .col(string_len_null(Users::PhoneNumber, 32).unique_key())
                    .col(
                        timestamp_with_time_zone(Users::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Credentials rows carry a password hash; OAuth rows carry the provider's subject id
        manager
            .create_table(
                Table::create()
                    .table(AuthProvider::Table)
                    .if_not_exists()
                    .col(pk_auto(AuthProvider::Id))
                    .col(integer(AuthProvider::UserId).not_null())
                    .col(string_len(AuthProvider::Provider, 32).not_null())
                    .col(string_len_null(AuthProvider::ProviderId, 255))
                    .col(string_len_null(AuthProvider::Password, 255))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_provider_user")
                            .from(AuthProvider::Table, AuthProvider::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_auth_provider_subject")
                    .table(AuthProvider::Table)
                    .col(AuthProvider::Provider)
                    .col(AuthProvider::ProviderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthProvider::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Users {
    Table,
    Id,
    Name,
    Username,
    Email,
    Dob,
    PhoneNumber,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum AuthProvider {
    Table,
    Id,
    UserId,
    Provider,
    ProviderId,
    Password,
}
