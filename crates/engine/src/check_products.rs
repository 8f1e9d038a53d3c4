//! Line items of a check.
//!
//! Decimal values are stored as their exact textual representation so the
//! scale entered by the merchant survives the round trip.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, LineItem, util::parse_decimal};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "check_products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub check_id: i64,
    pub name: String,
    pub price: String,
    pub quantity: String,
    pub total: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::checks::Entity",
        from = "Column::CheckId",
        to = "super::checks::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Checks,
}

impl Related<super::checks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn new(check_id: i64, item: &LineItem, now: DateTimeUtc) -> Self {
        Self {
            id: ActiveValue::NotSet,
            check_id: ActiveValue::Set(check_id),
            name: ActiveValue::Set(item.name.clone()),
            price: ActiveValue::Set(item.price.to_string()),
            quantity: ActiveValue::Set(item.quantity.to_string()),
            total: ActiveValue::Set(item.total.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for LineItem {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            price: parse_decimal(&model.price, "price")?,
            quantity: parse_decimal(&model.quantity, "quantity")?,
            total: parse_decimal(&model.total, "total")?,
            name: model.name,
        })
    }
}
