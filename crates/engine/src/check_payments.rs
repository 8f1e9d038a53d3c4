//! The payment settling a check. Every check has exactly one.

use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{EngineError, Payment, PaymentType, util::parse_decimal};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "check_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub check_id: i64,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub amount: String,
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
    pub(crate) fn new(check_id: i64, payment: &Payment, now: DateTimeUtc) -> Self {
        Self {
            id: ActiveValue::NotSet,
            check_id: ActiveValue::Set(check_id),
            kind: ActiveValue::Set(payment.kind.as_str().to_string()),
            amount: ActiveValue::Set(payment.amount.to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        }
    }
}

impl TryFrom<Model> for Payment {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            kind: PaymentType::try_from(model.kind.as_str())?,
            amount: parse_decimal(&model.amount, "payment amount")?,
        })
    }
}
