//! Fiscal checks (receipts).
//!
//! A [`Check`] is issued by a user and carries one or more [`LineItem`]s and a
//! single [`Payment`]. Totals are derived when the check is created:
//!
//! - every line total is `price * quantity`
//! - the check total is the sum of the line totals
//! - the rest (change) is `payment.amount - total`, possibly negative

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Card,
}

impl PaymentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
        }
    }
}

impl TryFrom<&str> for PaymentType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            other => Err(EngineError::InvalidInput(format!(
                "invalid payment type: {other}"
            ))),
        }
    }
}

/// One product entry on a check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: Decimal,
    pub total: Decimal,
}

impl LineItem {
    /// Builds a line item computing its total as `price * quantity`.
    ///
    /// Fails with [`EngineError::InvalidAmount`] when the product overflows.
    pub fn new(
        name: impl Into<String>,
        price: Decimal,
        quantity: Decimal,
    ) -> Result<Self, EngineError> {
        let total = price.checked_mul(quantity).ok_or_else(|| {
            EngineError::InvalidAmount(format!("line total overflows: {price} x {quantity}"))
        })?;
        Ok(Self {
            name: name.into(),
            price,
            quantity,
            total,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Payment {
    pub kind: PaymentType,
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Check {
    pub id: i64,
    pub user_id: i64,
    pub items: Vec<LineItem>,
    pub payment: Payment,
    pub comment: Option<String>,
    pub total: Decimal,
    pub rest: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product as submitted by the merchant, before totals are computed.
#[derive(Clone, Debug)]
pub struct LineItemNew {
    pub name: String,
    pub price: Decimal,
    pub quantity: Decimal,
}

#[derive(Clone, Debug)]
pub struct CheckNew {
    pub items: Vec<LineItemNew>,
    pub payment: Payment,
    pub comment: Option<String>,
}

/// `checks` table.
///
/// `total_minor` mirrors `total` rounded to cents; it exists so range filters
/// and ordering can run in SQL.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "checks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub comment: Option<String>,
    pub total: String,
    pub total_minor: i64,
    pub rest: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Users,
    #[sea_orm(has_many = "super::check_products::Entity")]
    Products,
    #[sea_orm(has_one = "super::check_payments::Entity")]
    Payment,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::check_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::check_payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_is_price_times_quantity() {
        let item = LineItem::new("Bread", Decimal::new(25, 1), Decimal::TWO).unwrap();
        assert_eq!(item.total.to_string(), "5.0");
    }

    #[test]
    fn overflowing_line_total_is_rejected() {
        let err = LineItem::new("Gold", Decimal::MAX, Decimal::TWO).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
