use sea_orm_migration::{prelude::*, schema::*};

use super::m20250101_000001_create_movies::Movie;
use super::m20250101_000004_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Favorite::Table)
                    .if_not_exists()
                    .col(pk_auto(Favorite::Id))
                    .col(integer(Favorite::UserId).not_null())
                    .col(integer(Favorite::MovieId).not_null())
                    .col(
                        timestamp_with_time_zone(Favorite::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_user")
                            .from(Favorite::Table, Favorite::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_favorite_movie")
                            .from(Favorite::Table, Favorite::MovieId)
                            .to(Movie::Table, Movie::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_favorite_user_movie")
                    .table(Favorite::Table)
                    .col(Favorite::UserId)
                    .col(Favorite::MovieId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(pk_auto(Comment::Id))
                    .col(integer(Comment::MovieId).not_null())
                    .col(integer(Comment::UserId).not_null())
                    .col(string_len(Comment::Content, 1000).not_null())
                    .col(integer(Comment::Likes).not_null().default(0))
                    .col(integer(Comment::Dislikes).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Comment::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_movie")
                            .from(Comment::Table, Comment::MovieId)
                            .to(Movie::Table, Movie::MovieId)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_user")
                            .from(Comment::Table, Comment::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Favorite::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Favorite {
    Table,
    Id,
    UserId,
    MovieId,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Comment {
    Table,
    Id,
    MovieId,
    UserId,
    Content,
    Likes,
    Dislikes,
    CreatedAt,
}
