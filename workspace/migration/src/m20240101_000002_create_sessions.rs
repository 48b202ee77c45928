use crate::entity_iden::EntityIden;
use model::entities::prelude::*;
use model::entities::{session, user};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Session::table())
                    .if_not_exists()
                    .col(string_len(Session::column(session::Column::Token), 64).primary_key())
                    .col(integer(Session::column(session::Column::UserId)))
                    .col(timestamp_with_time_zone(Session::column(
                        session::Column::CreatedAt,
                    )))
                    .col(timestamp_with_time_zone(Session::column(
                        session::Column::ExpiresAt,
                    )))
                    .foreign_key(
                        ForeignKey::create()
                            .name(Session::foreign_key_name(session::Column::UserId))
                            .from(Session::table(), Session::column(session::Column::UserId))
                            .to(User::table(), User::column(user::Column::Id))
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Session lookups by owner happen on logout-everywhere and password changes
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_user_id")
                    .table(Session::table())
                    .col(Session::column(session::Column::UserId))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Session::table()).to_owned())
            .await
    }
}
