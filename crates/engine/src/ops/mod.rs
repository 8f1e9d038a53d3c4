use sea_orm::DatabaseConnection;

use crate::{AuthConfig, ResultEngine};

mod checks;
mod users;

pub use checks::{CheckFilter, CheckPage, OrderBy};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    auth: AuthConfig,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Token signing settings in use.
    pub fn auth_config(&self) -> &AuthConfig {
        &self.auth
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    auth: AuthConfig,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Secret used to sign refresh tokens
    pub fn secret_key(mut self, secret_key: impl Into<String>) -> EngineBuilder {
        self.auth.secret_key = secret_key.into();
        self
    }

    /// Lifetime of access tokens
    pub fn access_token_ttl(mut self, ttl: chrono::TimeDelta) -> EngineBuilder {
        self.auth.access_ttl = ttl;
        self
    }

    /// Lifetime of refresh tokens
    pub fn refresh_token_ttl(mut self, ttl: chrono::TimeDelta) -> EngineBuilder {
        self.auth.refresh_ttl = ttl;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.auth.secret_key.is_empty() {
            return Err(crate::EngineError::InvalidConfig(
                "secret key must not be empty".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            auth: self.auth,
        })
    }
}
