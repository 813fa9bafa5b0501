//! Contact-message entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "contact_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::ContactMessage {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            subject: model.subject,
            message: model.message,
            created_at: model.created_at.into(),
        }
    }
}

impl From<quill_core::domain::ContactMessage> for ActiveModel {
    fn from(msg: quill_core::domain::ContactMessage) -> Self {
        Self {
            id: Set(msg.id),
            name: Set(msg.name),
            email: Set(msg.email),
            subject: Set(msg.subject),
            message: Set(msg.message),
            created_at: Set(msg.created_at.into()),
        }
    }
}
