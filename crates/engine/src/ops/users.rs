use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, SqlErr, TransactionTrait, prelude::*};

use crate::{
    EngineError, MAX_CHECK_SYMBOLS, ResultEngine, TokenPair, User, UserNew, UserUpdate, auth, users,
    util::{normalize_optional_text, normalize_required_text, validate_email},
};

use super::{Engine, with_tx};

const USER_NOT_FOUND: &str = "User with provided data not found";

fn validate_check_symbols(check_symbols: Option<i32>) -> ResultEngine<()> {
    if let Some(symbols) = check_symbols
        && (symbols <= 0 || i64::from(symbols) > MAX_CHECK_SYMBOLS)
    {
        return Err(EngineError::InvalidInput(format!(
            "check_symbols must be between 1 and {MAX_CHECK_SYMBOLS}"
        )));
    }
    Ok(())
}

/// Maps the `users.username` unique violation to [`EngineError::ExistingKey`].
fn username_taken(err: DbErr, username: &str) -> EngineError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => EngineError::ExistingKey(format!(
            "User with username \"{username}\" already exists"
        )),
        _ => EngineError::from(err),
    }
}

impl Engine {
    /// Registers a new user and returns their first token pair.
    pub async fn create_user(&self, new: UserNew) -> ResultEngine<TokenPair> {
        let username = normalize_required_text(&new.username, "username")?;
        if new.password1.is_empty() || new.password1 != new.password2 {
            return Err(EngineError::InvalidInput(
                "passwords do not match".to_string(),
            ));
        }
        let email = normalize_optional_text(new.email.as_deref());
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let user: ResultEngine<User> = with_tx!(self, |db_tx| {
            let now = Utc::now();
            let model = users::ActiveModel {
                id: ActiveValue::NotSet,
                username: ActiveValue::Set(username.clone()),
                password: ActiveValue::Set(auth::hash_password(&new.password1)),
                first_name: ActiveValue::Set(normalize_optional_text(new.first_name.as_deref())),
                last_name: ActiveValue::Set(normalize_optional_text(new.last_name.as_deref())),
                email: ActiveValue::Set(email),
                phone_number: ActiveValue::Set(normalize_optional_text(
                    new.phone_number.as_deref(),
                )),
                check_symbols: ActiveValue::Set(None),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            }
            .insert(&db_tx)
            .await
            .map_err(|err| username_taken(err, &username))?;
            Ok(User::from(model))
        });

        auth::issue_tokens(&user?, &self.auth, Utc::now())
    }

    /// Checks credentials and returns a fresh token pair.
    ///
    /// Unknown users and wrong passwords are reported the same way.
    pub async fn sign_in(&self, username: &str, password: &str) -> ResultEngine<TokenPair> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username.trim()))
            .one(&self.database)
            .await?
            .map(User::from)
            .filter(|user| auth::verify_password(password, &user.password))
            .ok_or_else(|| EngineError::KeyNotFound(USER_NOT_FOUND.to_string()))?;

        auth::issue_tokens(&user, &self.auth, Utc::now())
    }

    /// Return a user by id.
    pub async fn user(&self, user_id: i64) -> ResultEngine<User> {
        users::Entity::find_by_id(user_id)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::KeyNotFound(USER_NOT_FOUND.to_string()))
    }

    /// Resolves the user owning a valid access token.
    ///
    /// The token is signed with the user's password hash, so the issuer is
    /// read first and the signature checked against that user's key.
    pub async fn authenticate(&self, access_token: &str) -> ResultEngine<User> {
        let claims = auth::decode_unverified(access_token)?;
        let user = users::Entity::find_by_id(claims.iss)
            .one(&self.database)
            .await?
            .map(User::from)
            .ok_or_else(|| EngineError::Unauthorized("unknown token issuer".to_string()))?;

        auth::verify(access_token, user.password.as_bytes(), Utc::now())?;
        Ok(user)
    }

    /// Trades a valid refresh token for a new token pair.
    pub async fn refresh(&self, refresh_token: &str) -> ResultEngine<TokenPair> {
        let claims = auth::verify(refresh_token, self.auth.secret_key.as_bytes(), Utc::now())
            .map_err(|_| {
                EngineError::KeyNotFound("Invalid or expired refresh token.".to_string())
            })?;
        let user = self.user(claims.iss).await.map_err(|err| match err {
            EngineError::KeyNotFound(_) => EngineError::KeyNotFound(
                "User not found for the provided refresh token.".to_string(),
            ),
            other => other,
        })?;

        auth::issue_tokens(&user, &self.auth, Utc::now())
    }

    /// Patches the profile fields present in `update`.
    ///
    /// Blank strings clear the stored value.
    pub async fn update_user(&self, user_id: i64, update: UserUpdate) -> ResultEngine<User> {
        validate_check_symbols(update.check_symbols)?;
        if let Some(email) = normalize_optional_text(update.email.as_deref()) {
            validate_email(&email)?;
        }

        with_tx!(self, |db_tx| {
            let model = users::Entity::find_by_id(user_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(USER_NOT_FOUND.to_string()))?;

            let mut user: users::ActiveModel = model.into();
            if let Some(first_name) = update.first_name.as_deref() {
                user.first_name = ActiveValue::Set(normalize_optional_text(Some(first_name)));
            }
            if let Some(last_name) = update.last_name.as_deref() {
                user.last_name = ActiveValue::Set(normalize_optional_text(Some(last_name)));
            }
            if let Some(phone_number) = update.phone_number.as_deref() {
                user.phone_number = ActiveValue::Set(normalize_optional_text(Some(phone_number)));
            }
            if let Some(email) = update.email.as_deref() {
                user.email = ActiveValue::Set(normalize_optional_text(Some(email)));
            }
            if let Some(check_symbols) = update.check_symbols {
                user.check_symbols = ActiveValue::Set(Some(check_symbols));
            }
            user.updated_at = ActiveValue::Set(Utc::now());

            let model = user.update(&db_tx).await?;
            Ok(User::from(model))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_symbols_must_fit_the_printer_range() {
        assert!(validate_check_symbols(None).is_ok());
        assert!(validate_check_symbols(Some(32)).is_ok());
        assert!(validate_check_symbols(Some(1)).is_ok());
        assert!(validate_check_symbols(Some(500)).is_ok());
        assert!(validate_check_symbols(Some(501)).is_err());
        assert!(validate_check_symbols(Some(i32::MAX)).is_err());
        assert!(validate_check_symbols(Some(0)).is_err());
        assert!(validate_check_symbols(Some(-5)).is_err());
    }
}
