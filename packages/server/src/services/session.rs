use chrono::{DateTime, Duration, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::*;
use tracing::{info, warn};
use url::form_urlencoded;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::mailer::{Mailer, password_reset_mail};
use crate::models::auth::RegisterRequest;
use crate::utils::jwt::TokenService;
use crate::utils::{hash, tokens};

/// Access and refresh tokens handed to a client.
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub user: user::Model,
}

/// Issues, rotates and revokes credentials.
pub struct SessionManager<'a, C: ConnectionTrait> {
    conn: &'a C,
    tokens: &'a TokenService,
    config: &'a AuthConfig,
}

impl<'a, C: ConnectionTrait> SessionManager<'a, C> {
    pub fn new(conn: &'a C, tokens: &'a TokenService, config: &'a AuthConfig) -> Self {
        Self {
            conn,
            tokens,
            config,
        }
    }

    /// Case-insensitive lookup by email.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        let user = user::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(user::Column::Email)))
                    .eq(email.trim().to_lowercase()),
            )
            .one(self.conn)
            .await?;
        Ok(user)
    }

    pub async fn register(&self, payload: &RegisterRequest) -> Result<user::Model, AppError> {
        let email = payload.email.trim().to_lowercase();

        if self.find_by_email(&email).await?.is_some() {
            return Err(AppError::EmailTaken);
        }

        let hash = hash::hash_password(&payload.password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

        let new_user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(email),
            password_hash: Set(hash),
            display_name: Set(payload.display_name.trim().to_string()),
            bio: Set(None),
            experience: Set(0),
            avatar_key: Set(None),
            refresh_token: Set(None),
            refresh_token_expires_at: Set(None),
            password_reset_hash: Set(None),
            password_reset_expires_at: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        new_user.insert(self.conn).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Registration race condition: unique constraint caught on insert");
                AppError::EmailTaken
            }
            _ => AppError::from(e),
        })
    }

    /// Verify credentials and open a new session, replacing any previous one.
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IssuedSession, AppError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        let is_valid = hash::verify_password(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
        if !is_valid {
            return Err(AppError::InvalidCredentials);
        }

        let refresh_token = tokens::generate_refresh_token();
        let mut active: user::ActiveModel = user.into();
        active.refresh_token = Set(Some(refresh_token.clone()));
        active.refresh_token_expires_at = Set(Some(self.refresh_expiry()));
        let user = active.update(self.conn).await?;

        self.issue(user, refresh_token)
    }

    /// Exchange a refresh token for a new access/refresh pair.
    ///
    /// The presented token stops working as soon as this succeeds.
    pub async fn rotate(&self, presented: &str) -> Result<IssuedSession, AppError> {
        let user = user::Entity::find()
            .filter(user::Column::RefreshToken.eq(presented))
            .one(self.conn)
            .await?
            .ok_or(AppError::SessionExpired)?;

        match user.refresh_token_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(AppError::SessionExpired),
        }

        let refresh_token = tokens::generate_refresh_token();
        let result = user::Entity::update_many()
            .col_expr(
                user::Column::RefreshToken,
                Expr::value(Some(refresh_token.clone())),
            )
            .col_expr(
                user::Column::RefreshTokenExpiresAt,
                Expr::value(Some(self.refresh_expiry())),
            )
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::RefreshToken.eq(presented))
            .exec(self.conn)
            .await?;

        // Someone else rotated the same token first.
        if result.rows_affected == 0 {
            return Err(AppError::SessionExpired);
        }

        self.issue(user, refresh_token)
    }

    /// Start a password reset. Succeeds silently for unknown emails.
    pub async fn issue_password_reset(
        &self,
        email: &str,
        mailer: &dyn Mailer,
    ) -> Result<(), AppError> {
        let Some(user) = self.find_by_email(email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        let token = tokens::generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(self.config.password_reset_minutes);

        let mut active: user::ActiveModel = user.clone().into();
        active.password_reset_hash = Set(Some(token.digest));
        active.password_reset_expires_at = Set(Some(expires_at));
        active.update(self.conn).await?;

        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("email", &user.email)
            .append_pair("token", &token.encoded)
            .finish();
        let link = format!("{}?{query}", self.config.reset_link_base);
        let mail = password_reset_mail(&user.email, &link, self.config.password_reset_minutes);
        if let Err(e) = mailer.send(mail).await {
            warn!(user_id = %user.id, error = %e, "Failed to send password reset email");
        }
        Ok(())
    }

    /// Finish a password reset. Every failure is reported as `ResetFailed`.
    pub async fn consume_password_reset(
        &self,
        email: &str,
        encoded_token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let user = self
            .find_by_email(email)
            .await?
            .ok_or(AppError::ResetFailed)?;
        let digest = tokens::reset_token_digest(encoded_token).ok_or(AppError::ResetFailed)?;

        let matches = user.password_reset_hash.as_deref() == Some(digest.as_str());
        let fresh = user
            .password_reset_expires_at
            .is_some_and(|expires_at| expires_at > Utc::now());
        if !matches || !fresh {
            return Err(AppError::ResetFailed);
        }

        let hash = hash::hash_password(new_password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

        // Clearing the digest in the same statement makes the token single-use.
        let result = user::Entity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(hash))
            .col_expr(user::Column::PasswordResetHash, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::PasswordResetExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .col_expr(user::Column::RefreshToken, Expr::value(Option::<String>::None))
            .col_expr(
                user::Column::RefreshTokenExpiresAt,
                Expr::value(Option::<DateTime<Utc>>::None),
            )
            .filter(user::Column::Id.eq(user.id))
            .filter(user::Column::PasswordResetHash.eq(digest))
            .exec(self.conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::ResetFailed);
        }
        info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    fn refresh_expiry(&self) -> DateTime<Utc> {
        Utc::now() + Duration::days(self.config.refresh_token_days)
    }

    fn issue(&self, user: user::Model, refresh_token: String) -> Result<IssuedSession, AppError> {
        let (token, expires_at) = self
            .tokens
            .sign(user.id, &user.email, &user.public_name())
            .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

        Ok(IssuedSession {
            token,
            expires_at,
            refresh_token,
            user,
        })
    }
}
