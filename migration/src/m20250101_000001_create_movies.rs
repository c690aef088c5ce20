use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movie::Table)
                    .if_not_exists()
                    .col(pk_auto(Movie::MovieId))
                    .col(string_len(Movie::Title, 255).not_null())
                    .col(string_len(Movie::Description, 255).not_null().default(""))
                    .col(date(Movie::ReleaseDate).not_null())
                    .col(date_null(Movie::EndDate))
                    .col(integer(Movie::Duration).not_null())
                    .col(string_len(Movie::Genre, 10).not_null())
                    .col(string_len(Movie::Rating, 25).not_null())
                    .col(boolean(Movie::Iscomingsoon).not_null().default(false))
                    .col(text(Movie::Posterurl).not_null())
                    .col(text(Movie::Trailerurl).not_null())
                    .col(
                        timestamp_with_time_zone(Movie::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_release_date")
                    .table(Movie::Table)
                    .col(Movie::ReleaseDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Movie::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Movie {
    Table,
    MovieId,
    Title,
    Description,
    ReleaseDate,
    EndDate,
    Duration,
    Genre,
    Rating,
    Iscomingsoon,
    Posterurl,
    Trailerurl,
    CreatedAt,
}
