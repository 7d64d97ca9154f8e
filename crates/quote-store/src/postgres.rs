use async_trait::async_trait;
use common::CustomerId;
use domain::Money;
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{NewQuote, Quote, QuoteAddon, QuoteId, Result, store::QuoteStore};

const QUOTE_COLUMNS: &str = "id, customer_id, main_service, subtotal_cents, addon_total_cents, \
     total_price_cents, validity, created_at, updated_at";

/// PostgreSQL-backed quote store implementation.
#[derive(Clone)]
pub struct PostgresQuoteStore {
    pool: PgPool,
}

impl PostgresQuoteStore {
    /// Creates a new PostgreSQL quote store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_quote(row: &PgRow, addons: Vec<QuoteAddon>) -> Result<Quote> {
        Ok(Quote {
            id: QuoteId::from_uuid(row.try_get::<Uuid, _>("id")?),
            customer_id: Some(CustomerId::from_uuid(
                row.try_get::<Uuid, _>("customer_id")?,
            )),
            main_service: row.try_get("main_service")?,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
            addon_total: Money::from_cents(row.try_get("addon_total_cents")?),
            total_price: Money::from_cents(row.try_get("total_price_cents")?),
            validity: row.try_get("validity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            addons,
        })
    }

    async fn load_addons(conn: &mut PgConnection, id: Uuid) -> Result<Vec<QuoteAddon>> {
        let rows = sqlx::query(
            r#"
            SELECT addon_name, addon_price_cents
            FROM quote_addons
            WHERE quote_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(QuoteAddon {
                    addon_name: row.try_get("addon_name")?,
                    addon_price: Money::from_cents(row.try_get("addon_price_cents")?),
                })
            })
            .collect()
    }
}

#[async_trait]
impl QuoteStore for PostgresQuoteStore {
    #[tracing::instrument(skip(self, quote), fields(customer_id = %quote.customer_id))]
    async fn insert(&self, quote: NewQuote) -> Result<Quote> {
        // Dropping `tx` on any early return rolls the whole insert back
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO quotes (customer_id, main_service, subtotal_cents, addon_total_cents, total_price_cents, validity)
            VALUES ($1, $2, $3, $4, $5, TRUE)
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(quote.customer_id.as_uuid())
        .bind(&quote.main_service)
        .bind(quote.subtotal.cents())
        .bind(quote.addon_total.cents())
        .bind(quote.total_price.cents())
        .fetch_one(&mut *tx)
        .await?;

        let id: Uuid = row.try_get("id")?;

        for (position, addon) in quote.addons.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO quote_addons (quote_id, position, addon_name, addon_price_cents)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(&addon.addon_name)
            .bind(addon.addon_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Self::row_to_quote(&row, quote.addons)
    }

    async fn get(&self, id: QuoteId) -> Result<Option<Quote>> {
        let mut conn = self.pool.acquire().await?;

        let row: Option<PgRow> =
            sqlx::query(&format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(&mut *conn)
                .await?;

        match row {
            Some(row) => {
                let addons = Self::load_addons(&mut conn, id.as_uuid()).await?;
                Ok(Some(Self::row_to_quote(&row, addons)?))
            }
            None => Ok(None),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn consume(&self, id: QuoteId, customer_id: CustomerId) -> Result<Option<Quote>> {
        let mut tx = self.pool.begin().await?;

        // The validity guard makes the flip a compare-and-set
        let row: Option<PgRow> = sqlx::query(&format!(
            r#"
            UPDATE quotes
            SET validity = FALSE, updated_at = now()
            WHERE id = $1 AND customer_id = $2 AND validity
            RETURNING {QUOTE_COLUMNS}
            "#
        ))
        .bind(id.as_uuid())
        .bind(customer_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;

        let quote = match row {
            Some(row) => {
                let addons = Self::load_addons(&mut tx, id.as_uuid()).await?;
                Some(Self::row_to_quote(&row, addons)?)
            }
            None => None,
        };

        tx.commit().await?;
        Ok(quote)
    }

    #[tracing::instrument(skip(self))]
    async fn restore(&self, id: QuoteId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET validity = TRUE, updated_at = now()
            WHERE id = $1 AND NOT validity
            "#,
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
