//! Auth Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, PgPool, Row, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    auth::{
        models::{ApiTokenMetadata, NewApiToken},
        token::ApiTokenVersion,
    },
    domain::CustomerUuid,
};

const CREATE_API_TOKEN_SQL: &str = include_str!("sql/create_api_token.sql");
const GET_API_TOKEN_SQL: &str = include_str!("sql/get_api_token.sql");
const REVOKE_API_TOKEN_SQL: &str = include_str!("sql/revoke_api_token.sql");

#[derive(Debug, Clone)]
pub(crate) struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    #[must_use]
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub(crate) async fn create_api_token(
        &self,
        token: &NewApiToken,
    ) -> Result<ApiTokenMetadata, sqlx::Error> {
        query_as::<_, ApiTokenMetadata>(CREATE_API_TOKEN_SQL)
            .bind(token.uuid)
            .bind(token.customer_uuid.into_uuid())
            .bind(token.version.as_i16())
            .bind(&token.token_hash)
            .bind(token.expires_at.map(SqlxTimestamp::from))
            .fetch_one(&self.pool)
            .await
    }

    pub(crate) async fn get_api_token(
        &self,
        token_uuid: Uuid,
    ) -> Result<Option<ApiTokenMetadata>, sqlx::Error> {
        query_as::<_, ApiTokenMetadata>(GET_API_TOKEN_SQL)
            .bind(token_uuid)
            .fetch_optional(&self.pool)
            .await
    }

    pub(crate) async fn revoke_api_token(&self, token_uuid: Uuid) -> Result<u64, sqlx::Error> {
        let rows_affected = query(REVOKE_API_TOKEN_SQL)
            .bind(token_uuid)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for ApiTokenMetadata {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let version: i16 = row.try_get("version")?;

        let version = ApiTokenVersion::try_from(version).map_err(|e| sqlx::Error::ColumnDecode {
            index: "version".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            uuid: row.try_get("uuid")?,
            customer_uuid: CustomerUuid::from_uuid(row.try_get("customer_uuid")?),
            version,
            token_hash: row.try_get("token_hash")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            expires_at: row
                .try_get::<Option<SqlxTimestamp>, _>("expires_at")?
                .map(SqlxTimestamp::to_jiff),
            revoked_at: row
                .try_get::<Option<SqlxTimestamp>, _>("revoked_at")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}
