use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*, sea_query::Query,
};

use crate::{
    Check, CheckNew, DEFAULT_MAX_SYMBOLS, EngineError, LineItem, Merchant, Payment, PaymentType,
    Receipt, ResultEngine, check_payments, check_products, checks, markup, users,
    util::{normalize_optional_text, normalize_required_text, parse_decimal, to_minor},
};

use super::{Engine, with_tx};

/// Largest page `list_checks` returns.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    CreatedAt,
    CreatedAtDesc,
}

/// Filters and pagination for listing checks.
///
/// Both `created_at` and `total` bounds are inclusive. Total bounds are
/// compared at cent precision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckFilter {
    pub limit: u64,
    pub offset: u64,
    pub order_by: OrderBy,
    pub created_at_gte: Option<DateTime<Utc>>,
    pub created_at_lte: Option<DateTime<Utc>>,
    pub total_gte: Option<Decimal>,
    pub total_lte: Option<Decimal>,
    pub payment_type: Option<PaymentType>,
}

impl Default for CheckFilter {
    fn default() -> Self {
        Self {
            limit: MAX_PAGE_SIZE,
            offset: 0,
            order_by: OrderBy::default(),
            created_at_gte: None,
            created_at_lte: None,
            total_gte: None,
            total_lte: None,
            payment_type: None,
        }
    }
}

/// One page of checks plus the number of checks matching the filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckPage {
    pub total: u64,
    pub results: Vec<Check>,
}

fn validate_filter(filter: &CheckFilter) -> ResultEngine<()> {
    if filter.limit == 0 || filter.limit > MAX_PAGE_SIZE {
        return Err(EngineError::InvalidInput(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

/// Turns the filter into the list of predicates applied to `checks`.
fn filter_condition(user_id: i64, filter: &CheckFilter) -> ResultEngine<Condition> {
    let mut condition = Condition::all().add(checks::Column::UserId.eq(user_id));

    if let Some(from) = filter.created_at_gte {
        condition = condition.add(checks::Column::CreatedAt.gte(from));
    }
    if let Some(to) = filter.created_at_lte {
        condition = condition.add(checks::Column::CreatedAt.lte(to));
    }
    if let Some(total) = filter.total_gte {
        condition = condition.add(checks::Column::TotalMinor.gte(to_minor(total)?));
    }
    if let Some(total) = filter.total_lte {
        condition = condition.add(checks::Column::TotalMinor.lte(to_minor(total)?));
    }
    if let Some(kind) = filter.payment_type {
        condition = condition.add(
            checks::Column::Id.in_subquery(
                Query::select()
                    .column(check_payments::Column::CheckId)
                    .from(check_payments::Entity)
                    .and_where(check_payments::Column::Kind.eq(kind.as_str()))
                    .to_owned(),
            ),
        );
    }

    Ok(condition)
}

/// Loads items and payments for `models` with one query each, keeping order.
async fn hydrate<C: ConnectionTrait>(db: &C, models: Vec<checks::Model>) -> ResultEngine<Vec<Check>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<i64> = models.iter().map(|model| model.id).collect();

    let mut items: HashMap<i64, Vec<LineItem>> = HashMap::new();
    for product in check_products::Entity::find()
        .filter(check_products::Column::CheckId.is_in(ids.clone()))
        .order_by_asc(check_products::Column::Id)
        .all(db)
        .await?
    {
        let check_id = product.check_id;
        items
            .entry(check_id)
            .or_default()
            .push(LineItem::try_from(product)?);
    }

    let mut payments: HashMap<i64, Payment> = HashMap::new();
    for payment in check_payments::Entity::find()
        .filter(check_payments::Column::CheckId.is_in(ids))
        .all(db)
        .await?
    {
        let check_id = payment.check_id;
        payments.insert(check_id, Payment::try_from(payment)?);
    }

    models
        .into_iter()
        .map(|model| {
            let payment = payments.remove(&model.id).ok_or_else(|| {
                EngineError::KeyNotFound(format!("payment for check {} not found", model.id))
            })?;
            Ok(Check {
                id: model.id,
                user_id: model.user_id,
                items: items.remove(&model.id).unwrap_or_default(),
                payment,
                comment: model.comment,
                total: parse_decimal(&model.total, "total")?,
                rest: parse_decimal(&model.rest, "rest")?,
                created_at: model.created_at,
                updated_at: model.updated_at,
            })
        })
        .collect()
}

impl Engine {
    /// Issues a new check for `user_id`.
    ///
    /// Line totals, the check total and the change are computed here; an
    /// underpaid check gets a negative change.
    pub async fn create_check(&self, user_id: i64, new: CheckNew) -> ResultEngine<Check> {
        if new.items.is_empty() {
            return Err(EngineError::InvalidInput(
                "a check needs at least one product".to_string(),
            ));
        }
        let items = new
            .items
            .iter()
            .map(|item| {
                let name = normalize_required_text(&item.name, "product name")?;
                LineItem::new(name, item.price, item.quantity)
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        let total = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, item| acc.checked_add(item.total))
            .ok_or_else(|| EngineError::InvalidAmount("check total overflows".to_string()))?;
        let rest = new
            .payment
            .amount
            .checked_sub(total)
            .ok_or_else(|| EngineError::InvalidAmount("change overflows".to_string()))?;
        let total_minor = to_minor(total)?;
        let comment = normalize_optional_text(new.comment.as_deref());

        with_tx!(self, |db_tx| {
            if users::Entity::find_by_id(user_id).one(&db_tx).await?.is_none() {
                return Err(EngineError::KeyNotFound(
                    "User with provided data not found".to_string(),
                ));
            }

            let now = Utc::now();
            let check = checks::ActiveModel {
                id: ActiveValue::NotSet,
                user_id: ActiveValue::Set(user_id),
                comment: ActiveValue::Set(comment.clone()),
                total: ActiveValue::Set(total.to_string()),
                total_minor: ActiveValue::Set(total_minor),
                rest: ActiveValue::Set(rest.to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await?;

            for item in &items {
                check_products::ActiveModel::new(check.id, item, now)
                    .insert(&db_tx)
                    .await?;
            }
            check_payments::ActiveModel::new(check.id, &new.payment, now)
                .insert(&db_tx)
                .await?;

            Ok(Check {
                id: check.id,
                user_id,
                items,
                payment: new.payment,
                comment,
                total,
                rest,
                created_at: now,
                updated_at: now,
            })
        })
    }

    /// Lists the checks of `user_id` matching `filter`.
    ///
    /// `total` counts every matching check, ignoring `limit` and `offset`.
    pub async fn list_checks(&self, user_id: i64, filter: &CheckFilter) -> ResultEngine<CheckPage> {
        validate_filter(filter)?;
        let condition = filter_condition(user_id, filter)?;

        with_tx!(self, |db_tx| {
            let total = checks::Entity::find()
                .filter(condition.clone())
                .count(&db_tx)
                .await?;

            let query = checks::Entity::find().filter(condition);
            let query = match filter.order_by {
                OrderBy::CreatedAt => query
                    .order_by_asc(checks::Column::CreatedAt)
                    .order_by_asc(checks::Column::Id),
                OrderBy::CreatedAtDesc => query
                    .order_by_desc(checks::Column::CreatedAt)
                    .order_by_desc(checks::Column::Id),
            };
            let models = query
                .limit(filter.limit)
                .offset(filter.offset)
                .all(&db_tx)
                .await?;

            let results = hydrate(&db_tx, models).await?;
            Ok(CheckPage { total, results })
        })
    }

    /// Return a check by id, if it exists.
    pub async fn check(&self, check_id: i64) -> ResultEngine<Option<Check>> {
        let Some(model) = checks::Entity::find_by_id(check_id)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        Ok(hydrate(&self.database, vec![model]).await?.pop())
    }

    /// Builds the printable receipt of a check together with the issuer's
    /// printer width.
    pub async fn receipt(&self, check_id: i64) -> ResultEngine<Option<(Receipt, i64)>> {
        let Some((model, user)) = checks::Entity::find_by_id(check_id)
            .find_also_related(users::Entity)
            .one(&self.database)
            .await?
        else {
            return Ok(None);
        };
        let user = user.ok_or_else(|| {
            EngineError::KeyNotFound(format!("issuer of check {check_id} not found"))
        })?;
        let Some(check) = hydrate(&self.database, vec![model]).await?.pop() else {
            return Ok(None);
        };

        let width = user
            .check_symbols
            .map(i64::from)
            .unwrap_or(DEFAULT_MAX_SYMBOLS);
        let receipt = Receipt {
            merchant: Merchant {
                first_name: user.first_name,
                last_name: user.last_name,
            },
            items: check.items,
            payment: check.payment,
            total: check.total,
            rest: check.rest,
            comment: check.comment,
            created_at: check.created_at.naive_utc(),
        };
        Ok(Some((receipt, width)))
    }

    /// Lays out a stored check. A missing check renders to no lines.
    ///
    /// `width` overrides the issuer's configured printer width.
    pub async fn render_receipt(
        &self,
        check_id: i64,
        width: Option<i64>,
    ) -> ResultEngine<Vec<String>> {
        let receipt = self.receipt(check_id).await?;
        let max_symbols = width
            .or(receipt.as_ref().map(|(_, width)| *width))
            .unwrap_or(DEFAULT_MAX_SYMBOLS);
        markup::format(receipt.as_ref().map(|(receipt, _)| receipt), max_symbols)
    }
}
