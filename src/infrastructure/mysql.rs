use anyhow::{Context, Result};
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::application::ports::OrderSink;
use crate::config::DatabaseConfig;
use crate::model::OrderRecord;

/// An adapter that implements the `OrderSink` port against a
/// MySQL-compatible server. Each batch becomes one multi-row INSERT inside
/// its own transaction; the load is strictly sequential, so the pool holds
/// a single connection.
pub struct MySqlOrderSink {
    pool: MySqlPool,
    table: String,
}

impl MySqlOrderSink {
    /// Connects eagerly so unreachable hosts and rejected credentials
    /// surface before any batch is generated.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .with_context(|| {
                format!("cannot connect to mysql at {}:{}", config.host, config.port)
            })?;

        Ok(MySqlOrderSink {
            pool,
            table: config.table.clone(),
        })
    }

    /// A handle for closing the pool once the service is done with the sink.
    pub fn pool(&self) -> MySqlPool {
        self.pool.clone()
    }
}

impl OrderSink for MySqlOrderSink {
    async fn insert_batch(&mut self, records: &[OrderRecord]) -> Result<()> {
        let sql = build_insert_sql(&self.table, records);

        let mut tx = self.pool.begin().await.context("cannot open transaction")?;
        sqlx::query(&sql)
            .execute(&mut *tx)
            .await
            .context("bulk insert failed")?;
        tx.commit().await.context("commit failed")?;

        Ok(())
    }
}

/// Renders the multi-row INSERT for one batch. Values are inlined as SQL
/// literals: MySQL caps prepared-statement placeholders at `u16::MAX`,
/// which four columns over a 50 000-row batch would exceed. Every field is
/// numeric or an ISO date, so no escaping is involved.
fn build_insert_sql(table: &str, records: &[OrderRecord]) -> String {
    let mut sql = format!("INSERT INTO {table} (order_id, user_id, amount, created_at) VALUES ");
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&format!(
            "({}, {}, {:.2}, '{}')",
            record.order_id, record.user_id, record.amount, record.created_at
        ));
    }
    sql
}
