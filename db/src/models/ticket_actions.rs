use sea_orm::DeriveActiveEnum;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ticket_actions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub ticket_id: i64,

    pub kind: ActionKind,
    pub message: Option<String>,
    /// Encoded `Creator` reference of whoever performed the action.
    pub actor: String,
    pub epoch_seconds: i64,

    pub server: Option<String>,
    pub world: Option<String>,
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub z: Option<i32>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "action_kind")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ActionKind {
    #[sea_orm(string_value = "open")]
    Open,

    #[sea_orm(string_value = "comment")]
    Comment,

    #[sea_orm(string_value = "close_with_comment")]
    CloseWithComment,

    #[sea_orm(string_value = "close_without_comment")]
    CloseWithoutComment,

    #[sea_orm(string_value = "reopen")]
    Reopen,

    #[sea_orm(string_value = "assign")]
    Assign,

    #[sea_orm(string_value = "set_priority")]
    SetPriority,

    #[sea_orm(string_value = "mass_close")]
    MassClose,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tickets::Entity",
        from = "Column::TicketId",
        to = "super::tickets::Column::Id"
    )]
    Ticket,
}

impl Related<super::tickets::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ticket.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
