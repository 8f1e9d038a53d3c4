use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    Cash,
    Card,
}

pub mod user {
    use super::*;

    /// Request body for `POST /users/signup`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignUp {
        pub username: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub phone_number: Option<String>,
        pub email: Option<String>,
        pub password1: String,
        pub password2: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SignIn {
        pub username: String,
        pub password: String,
    }

    /// Access and refresh tokens returned by every authentication endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TokenPair {
        pub access_token: String,
        pub refresh_token: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserView {
        pub id: i64,
        pub username: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub phone_number: Option<String>,
        pub email: Option<String>,
        pub check_symbols: Option<i32>,
    }

    /// Partial update of the user profile. Absent fields are left untouched.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct UserUpdate {
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub phone_number: Option<String>,
        pub email: Option<String>,
        /// Printer width used when rendering receipts.
        pub check_symbols: Option<i32>,
    }
}

pub mod check {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductNew {
        pub name: String,
        pub price: Decimal,
        pub quantity: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentNew {
        #[serde(rename = "type")]
        pub kind: PaymentType,
        pub amount: Decimal,
    }

    /// Request body for `POST /checks/create`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckNew {
        pub products: Vec<ProductNew>,
        pub payment: PaymentNew,
        pub comment: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ProductView {
        pub name: String,
        pub price: Decimal,
        pub quantity: Decimal,
        pub total: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PaymentView {
        #[serde(rename = "type")]
        pub kind: PaymentType,
        pub amount: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckView {
        pub id: i64,
        pub products: Vec<ProductView>,
        pub payment: PaymentView,
        pub comment: Option<String>,
        pub total: Decimal,
        pub rest: Decimal,
        pub created_at: DateTime<FixedOffset>,
        pub updated_at: DateTime<FixedOffset>,
        /// Public link to the rendered receipt.
        pub url: String,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub enum OrderBy {
        #[default]
        #[serde(rename = "created_at")]
        CreatedAt,
        #[serde(rename = "-created_at")]
        CreatedAtDesc,
    }

    /// Query string accepted by `GET /checks`.
    ///
    /// `limit` defaults to 100 and must be in `1..=100`; `offset` defaults to 0.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CheckFilter {
        pub limit: Option<u64>,
        pub offset: Option<u64>,
        pub order_by: OrderBy,
        pub created_at_gte: Option<DateTime<FixedOffset>>,
        pub created_at_lte: Option<DateTime<FixedOffset>>,
        pub total_gte: Option<Decimal>,
        pub total_lte: Option<Decimal>,
        pub payment_type: Option<PaymentType>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CheckListResponse {
        pub total: u64,
        pub results: Vec<CheckView>,
    }
}

#[cfg(test)]
mod tests {
    use super::check::*;
    use super::*;

    #[test]
    fn payment_type_uses_type_key() {
        let payment: PaymentNew =
            serde_json::from_str(r#"{"type": "card", "amount": "12.50"}"#).unwrap();
        assert_eq!(payment.kind, PaymentType::Card);
        assert_eq!(payment.amount.to_string(), "12.50");
    }

    #[test]
    fn order_by_accepts_descending_prefix() {
        let filter: CheckFilter = serde_json::from_str(r#"{"order_by": "-created_at"}"#).unwrap();
        assert_eq!(filter.order_by, OrderBy::CreatedAtDesc);
        assert!(filter.limit.is_none());
    }
}
