use sea_orm_migration::{prelude::*, schema::*};

use super::m20250101_000001_create_movies::Movie;
use super::m20250101_000002_create_cinemas::Cinema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Showtime::Table)
                    .if_not_exists()
                    .col(pk_auto(Showtime::ShowtimeId))
                    .col(integer(Showtime::MovieId).not_null())
                    .col(integer_null(Showtime::CinemaId))
                    .col(date(Showtime::ShowDate).not_null())
                    .col(timestamp_with_time_zone(Showtime::StartTime).not_null())
                    .col(integer(Showtime::Runtime).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_showtime_movie")
                            .from(Showtime::Table, Showtime::MovieId)
                            .to(Movie::Table, Movie::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_showtime_cinema")
                            .from(Showtime::Table, Showtime::CinemaId)
                            .to(Cinema::Table, Cinema::CinemaId)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_showtime_movie_date")
                    .table(Showtime::Table)
                    .col(Showtime::MovieId)
                    .col(Showtime::ShowDate)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Showtime::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Showtime {
    Table,
    ShowtimeId,
    MovieId,
    CinemaId,
    ShowDate,
    StartTime,
    Runtime,
}
