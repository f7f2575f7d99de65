use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m202602140002_create_ticket_actions"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Alias::new("ticket_actions"))
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alias::new("id"))
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("ticket_id"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Alias::new("kind"))
                            .enumeration(
                                Alias::new("action_kind"),
                                vec![
                                    Alias::new("open"),
                                    Alias::new("comment"),
                                    Alias::new("close_with_comment"),
                                    Alias::new("close_without_comment"),
                                    Alias::new("reopen"),
                                    Alias::new("assign"),
                                    Alias::new("set_priority"),
                                    Alias::new("mass_close"),
                                ],
                            )
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("message")).text())
                    .col(ColumnDef::new(Alias::new("actor")).text().not_null())
                    .col(
                        ColumnDef::new(Alias::new("epoch_seconds"))
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Alias::new("server")).text())
                    .col(ColumnDef::new(Alias::new("world")).text())
                    .col(ColumnDef::new(Alias::new("x")).integer())
                    .col(ColumnDef::new(Alias::new("y")).integer())
                    .col(ColumnDef::new(Alias::new("z")).integer())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Alias::new("ticket_actions"), Alias::new("ticket_id"))
                            .to(Alias::new("tickets"), Alias::new("id"))
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ticket_actions_ticket_id")
                    .table(Alias::new("ticket_actions"))
                    .col(Alias::new("ticket_id"))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Alias::new("ticket_actions")).to_owned())
            .await
    }
}
