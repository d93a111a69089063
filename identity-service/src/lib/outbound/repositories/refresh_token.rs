use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::credentials::models::DeviceInfo;
use crate::domain::credentials::models::NewRefreshToken;
use crate::domain::credentials::models::RefreshToken;
use crate::domain::credentials::models::RefreshTokenHash;
use crate::domain::credentials::models::RefreshTokenId;
use crate::domain::credentials::ports::RefreshTokenRepository;
use crate::domain::errors::RepositoryError;
use crate::domain::user::models::UserId;

const RETURNING_COLUMNS: &str = "id, user_id, token_hash, expires_at, user_agent, ip_address, \
                                 revoked, revoked_at, last_used_at, created_at, updated_at";

pub struct PostgresRefreshTokenRepository {
    pool: PgPool,
}

impl PostgresRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct RefreshTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    revoked: bool,
    revoked_at: Option<DateTime<Utc>>,
    last_used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RefreshTokenRow> for RefreshToken {
    fn from(r: RefreshTokenRow) -> Self {
        RefreshToken {
            id: RefreshTokenId(r.id),
            user_id: UserId(r.user_id),
            token_hash: RefreshTokenHash::from_stored(r.token_hash),
            expires_at: r.expires_at,
            device: DeviceInfo::new(r.user_agent, r.ip_address),
            revoked: r.revoked,
            revoked_at: r.revoked_at,
            last_used_at: r.last_used_at,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn issue(&self, token: NewRefreshToken) -> Result<RefreshToken, RepositoryError> {
        let token = token.into_token(Utc::now());

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens
                (id, user_id, token_hash, expires_at, user_agent, ip_address, revoked, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, FALSE, $7, $8)
            "#,
        )
        .bind(token.id.0)
        .bind(token.user_id.0)
        .bind(token.token_hash.as_str())
        .bind(token.expires_at)
        .bind(token.device.user_agent.as_deref())
        .bind(token.device.ip.as_deref())
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    async fn find_active_by_hash(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            SELECT {RETURNING_COLUMNS}
            FROM refresh_tokens
            WHERE token_hash = $1 AND revoked = FALSE AND expires_at > $2
            "#
        ))
        .bind(hash.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshToken::from))
    }

    async fn consume_active(
        &self,
        hash: &RefreshTokenHash,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, RepositoryError> {
        // Row lock taken by UPDATE serializes concurrent consumers; the loser
        // re-evaluates `revoked = FALSE` and matches nothing.
        let row = sqlx::query_as::<_, RefreshTokenRow>(&format!(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2, last_used_at = $2, updated_at = $2
            WHERE token_hash = $1 AND revoked = FALSE AND expires_at > $2
            RETURNING {RETURNING_COLUMNS}
            "#
        ))
        .bind(hash.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(RefreshToken::from))
    }

    async fn revoke(&self, id: &RefreshTokenId, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2, updated_at = $2
            WHERE id = $1 AND revoked = FALSE
            "#,
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn revoke_all_for_user(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE, revoked_at = $2, updated_at = $2
            WHERE user_id = $1 AND revoked = FALSE
            "#,
        )
        .bind(user_id.0)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn purge_expired(&self, before: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE expires_at < $1
            "#,
        )
        .bind(before)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
