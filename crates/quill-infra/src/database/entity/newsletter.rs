//! Newsletter-signup entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "newsletter_signups")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for quill_core::domain::NewsletterSignup {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            created_at: model.created_at.into(),
        }
    }
}

impl From<quill_core::domain::NewsletterSignup> for ActiveModel {
    fn from(signup: quill_core::domain::NewsletterSignup) -> Self {
        Self {
            id: Set(signup.id),
            email: Set(signup.email),
            created_at: Set(signup.created_at.into()),
        }
    }
}
