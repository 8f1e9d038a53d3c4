//! Fiscal receipts engine.
//!
//! The engine owns the data model (users, checks, their line items and
//! payments), authentication and the fixed-width receipt layout in
//! [`markup`]. Storage goes through sea-orm; callers only see plain domain
//! types.

pub use auth::{AuthConfig, TokenPair};
pub use checks::{Check, CheckNew, LineItem, LineItemNew, Payment, PaymentType};
pub use error::EngineError;
pub use markup::{DEFAULT_MAX_SYMBOLS, MAX_CHECK_SYMBOLS, Merchant, Receipt};
pub use ops::{CheckFilter, CheckPage, Engine, EngineBuilder, OrderBy};
pub use users::{User, UserNew, UserUpdate};

pub mod auth;
pub mod markup;

mod check_payments;
mod check_products;
mod checks;
mod error;
mod ops;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
