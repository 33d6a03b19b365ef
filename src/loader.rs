//! Batch loading of normalized rows into ClickHouse.
//!
//! A sink prepares one batch per row set, rows are appended in order, and
//! the batch is sent as a single insert. Dropping a batch without sending
//! it discards everything appended so far.

use crate::config::ClickHouseConfig;
use crate::error::{CollectorError, Result};
use crate::models::WeatherRow;
use crate::schema::create_table_statement;
use clickhouse::Client;
use clickhouse::insert::Insert;
use tracing::{debug, info, warn};

/// Destination able to open batch inserts for any row kind
#[allow(async_fn_in_trait)]
pub trait BatchSink {
    type Batch<R: WeatherRow>: RowBatch<R>;

    /// Open a batch insert into the table of row kind `R`
    async fn prepare<R: WeatherRow>(&self) -> Result<Self::Batch<R>>;
}

/// An open batch insert
#[allow(async_fn_in_trait)]
pub trait RowBatch<R> {
    async fn append(&mut self, row: &R) -> Result<()>;

    /// Commit every appended row as one unit
    async fn send(self) -> Result<()>;
}

/// Write `rows` to the table of their kind as a single batch.
///
/// Returns the number of rows written. An empty slice writes nothing.
pub async fn load<R, S>(sink: &S, rows: &[R]) -> Result<usize>
where
    R: WeatherRow,
    S: BatchSink,
{
    let table = R::KIND.table();
    if rows.is_empty() {
        debug!("No rows for {}, skipping batch", table);
        return Ok(0);
    }

    let mut batch = sink.prepare::<R>().await?;
    for row in rows {
        batch.append(row).await?;
    }
    batch.send().await?;

    info!("Inserted {} rows into {}", rows.len(), table);
    Ok(rows.len())
}

/// ClickHouse database reached over its HTTP interface
#[derive(Clone)]
pub struct ClickHouseSink {
    client: Client,
    url: String,
}

impl ClickHouseSink {
    /// Connect to the first configured address that answers a ping
    pub async fn connect(config: &ClickHouseConfig) -> Result<Self> {
        let urls = config.urls();

        for url in &urls {
            let client = client_for(config, url);
            match client.query("SELECT 1").execute().await {
                Ok(()) => {
                    info!("Connected to ClickHouse at {} (database {})", url, config.database);
                    return Ok(Self {
                        client,
                        url: url.clone(),
                    });
                }
                Err(e) => warn!("ClickHouse at {} did not answer: {}", url, e),
            }
        }

        Err(CollectorError::DatabaseUnavailable {
            database: config.database.clone(),
            addresses: urls.join(", "),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Create the table for row kind `R` if it does not exist yet
    pub async fn create_table<R: WeatherRow>(&self) -> Result<()> {
        let table = R::KIND.table();
        let statement = create_table_statement::<R>();
        debug!("Executing: {}", statement);

        self.client
            .query(&statement)
            .execute()
            .await
            .map_err(|e| CollectorError::sink(table, e))?;

        info!("Table {} is ready", table);
        Ok(())
    }
}

fn client_for(config: &ClickHouseConfig, url: &str) -> Client {
    let client = Client::default()
        .with_url(url)
        .with_database(&config.database);

    let client = if config.user.is_empty() {
        client
    } else {
        client.with_user(&config.user)
    };

    if config.password.is_empty() {
        client
    } else {
        client.with_password(&config.password)
    }
}

/// In-flight `INSERT` into one ClickHouse table
pub struct ClickHouseBatch<R: WeatherRow> {
    insert: Insert<R>,
    table: &'static str,
}

impl BatchSink for ClickHouseSink {
    type Batch<R: WeatherRow> = ClickHouseBatch<R>;

    async fn prepare<R: WeatherRow>(&self) -> Result<ClickHouseBatch<R>> {
        let table = R::KIND.table();
        let insert = self
            .client
            .insert::<R>(table)
            .map_err(|e| CollectorError::sink(table, e))?;
        Ok(ClickHouseBatch { insert, table })
    }
}

impl<R: WeatherRow> RowBatch<R> for ClickHouseBatch<R> {
    async fn append(&mut self, row: &R) -> Result<()> {
        self.insert
            .write(row)
            .await
            .map_err(|e| CollectorError::sink(self.table, e))
    }

    async fn send(self) -> Result<()> {
        let table = self.table;
        self.insert
            .end()
            .await
            .map_err(|e| CollectorError::sink(table, e))
    }
}

/// Sink that counts rows instead of writing them, for dry runs
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunSink;

/// Batch of a [`DryRunSink`]
pub struct DryRunBatch {
    table: &'static str,
    rows: usize,
}

impl BatchSink for DryRunSink {
    type Batch<R: WeatherRow> = DryRunBatch;

    async fn prepare<R: WeatherRow>(&self) -> Result<DryRunBatch> {
        Ok(DryRunBatch {
            table: R::KIND.table(),
            rows: 0,
        })
    }
}

impl<R: WeatherRow> RowBatch<R> for DryRunBatch {
    async fn append(&mut self, _row: &R) -> Result<()> {
        self.rows += 1;
        Ok(())
    }

    async fn send(self) -> Result<()> {
        info!("Dry run: would insert {} rows into {}", self.rows, self.table);
        Ok(())
    }
}
