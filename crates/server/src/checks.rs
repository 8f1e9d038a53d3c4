//! Check issuing, listing and public receipt rendering.

use api_types::{
    PaymentType,
    check::{
        CheckFilter, CheckListResponse, CheckNew, CheckView, OrderBy, PaymentView, ProductView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Html,
};
use chrono::Utc;
use engine::{Check, User, markup};

use crate::{ServerError, server::ServerState};

fn payment_type(kind: PaymentType) -> engine::PaymentType {
    match kind {
        PaymentType::Cash => engine::PaymentType::Cash,
        PaymentType::Card => engine::PaymentType::Card,
    }
}

fn payment_type_view(kind: engine::PaymentType) -> PaymentType {
    match kind {
        engine::PaymentType::Cash => PaymentType::Cash,
        engine::PaymentType::Card => PaymentType::Card,
    }
}

fn check_view(state: &ServerState, check: Check) -> CheckView {
    CheckView {
        id: check.id,
        products: check
            .items
            .into_iter()
            .map(|item| ProductView {
                name: item.name,
                price: item.price,
                quantity: item.quantity,
                total: item.total,
            })
            .collect(),
        payment: PaymentView {
            kind: payment_type_view(check.payment.kind),
            amount: check.payment.amount,
        },
        comment: check.comment,
        total: check.total,
        rest: check.rest,
        created_at: check.created_at.fixed_offset(),
        updated_at: check.updated_at.fixed_offset(),
        url: state.options.check_url(check.id),
    }
}

fn engine_filter(query: CheckFilter) -> engine::CheckFilter {
    let defaults = engine::CheckFilter::default();
    engine::CheckFilter {
        limit: query.limit.unwrap_or(defaults.limit),
        offset: query.offset.unwrap_or(defaults.offset),
        order_by: match query.order_by {
            OrderBy::CreatedAt => engine::OrderBy::CreatedAt,
            OrderBy::CreatedAtDesc => engine::OrderBy::CreatedAtDesc,
        },
        created_at_gte: query.created_at_gte.map(|at| at.with_timezone(&Utc)),
        created_at_lte: query.created_at_lte.map(|at| at.with_timezone(&Utc)),
        total_gte: query.total_gte,
        total_lte: query.total_lte,
        payment_type: query.payment_type.map(payment_type),
    }
}

fn html_page(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Check</title>\n\
         <style>body {{ font-family: monospace; white-space: nowrap; }}</style>\n\
         </head>\n<body>\n{body}\n</body>\n</html>\n"
    )
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<CheckFilter>,
) -> Result<Json<CheckListResponse>, ServerError> {
    let page = state
        .engine
        .list_checks(user.id, &engine_filter(query))
        .await?;

    Ok(Json(CheckListResponse {
        total: page.total,
        results: page
            .results
            .into_iter()
            .map(|check| check_view(&state, check))
            .collect(),
    }))
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<CheckNew>,
) -> Result<(StatusCode, Json<CheckView>), ServerError> {
    let check = state
        .engine
        .create_check(
            user.id,
            engine::CheckNew {
                items: payload
                    .products
                    .into_iter()
                    .map(|product| engine::LineItemNew {
                        name: product.name,
                        price: product.price,
                        quantity: product.quantity,
                    })
                    .collect(),
                payment: engine::Payment {
                    kind: payment_type(payload.payment.kind),
                    amount: payload.payment.amount,
                },
                comment: payload.comment,
            },
        )
        .await?;
    tracing::info!(check_id = check.id, user_id = user.id, "check created");

    Ok((StatusCode::CREATED, Json(check_view(&state, check))))
}

/// Public HTML rendering of a check, laid out at the issuer's printer width.
pub async fn detail(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<Html<String>, ServerError> {
    let lines = state.engine.render_receipt(id, None).await?;
    Ok(Html(html_page(&markup::render_html(&lines))))
}

pub async fn text(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> Result<String, ServerError> {
    let lines = state.engine.render_receipt(id, None).await?;
    Ok(markup::render_text(&lines))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_uses_engine_defaults() {
        let filter = engine_filter(CheckFilter::default());
        assert_eq!(filter, engine::CheckFilter::default());
    }

    #[test]
    fn html_page_wraps_body() {
        let page = html_page("a<br>b");
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<body>\na<br>b\n</body>"));
    }
}
