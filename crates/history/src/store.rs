use std::str::FromStr;

use chrono::{Local, NaiveDate};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use tracing::{debug, info, warn};

use common::{Error, HistoryEntry, Result, ScanResult, STATUS_NEW};

/// Column layout of the `history` table. Matched case-sensitively, in order.
pub const HISTORY_COLUMNS: [&str; 7] =
    ["date", "stock", "strategy", "price", "score", "sector", "status"];

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS history (
        date     TEXT,
        stock    TEXT,
        strategy TEXT,
        price    REAL,
        score    TEXT,
        sector   TEXT,
        status   TEXT
    )
"#;

/// Append-only log of saved scan matches in a single SQLite table.
///
/// Each operation opens its own connection and closes it before returning;
/// nothing is pooled or held between calls.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    options: SqliteConnectOptions,
}

impl HistoryStore {
    /// `database_url` is a SQLite URL such as `sqlite:market_sniper.db`.
    /// The file is created on first connect if it does not exist.
    pub fn new(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        Ok(Self { options })
    }

    async fn connect(&self) -> Result<SqliteConnection> {
        Ok(self.options.connect().await?)
    }

    /// Create the table if missing and verify its columns.
    pub async fn init(&self) -> Result<()> {
        let mut conn = self.connect().await?;
        sqlx::query(CREATE_TABLE).execute(&mut conn).await?;
        let checked = verify_schema(&mut conn).await;
        conn.close().await?;
        checked?;
        info!("History store ready");
        Ok(())
    }

    /// Append every row of `result`, stamped with today's date.
    /// Returns the number of rows written; an empty result writes nothing.
    pub async fn save(&self, result: &ScanResult) -> Result<usize> {
        self.save_dated(result, Local::now().date_naive()).await
    }

    /// Append every row of `result` under an explicit scan date.
    pub async fn save_dated(&self, result: &ScanResult, date: NaiveDate) -> Result<usize> {
        if result.is_empty() {
            debug!(strategy = %result.strategy, "Nothing to save");
            return Ok(0);
        }

        let mut conn = self.connect().await?;
        let written = append_rows(&mut conn, result, date).await;
        conn.close().await?;
        let written = written?;

        info!(strategy = %result.strategy, rows = written, %date, "Scan saved to history");
        Ok(written)
    }

    /// All saved rows, most recent date first. Any read failure is logged
    /// and reported as an empty history.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        match self.try_history().await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "History unreadable; returning empty");
                Vec::new()
            }
        }
    }

    /// Like [`HistoryStore::history`] but surfaces read errors.
    pub async fn try_history(&self) -> Result<Vec<HistoryEntry>> {
        let mut conn = self.connect().await?;
        let rows = sqlx::query_as::<_, HistoryEntry>(
            r#"SELECT date, stock, strategy, price, score, sector, status
               FROM history ORDER BY date DESC, rowid DESC"#,
        )
        .fetch_all(&mut conn)
        .await;
        conn.close().await?;
        Ok(rows?)
    }
}

async fn append_rows(
    conn: &mut SqliteConnection,
    result: &ScanResult,
    date: NaiveDate,
) -> Result<usize> {
    verify_schema(conn).await?;

    let date = date.format("%Y-%m-%d").to_string();
    let mut tx = conn.begin().await?;
    for row in &result.rows {
        sqlx::query(
            r#"INSERT INTO history (date, stock, strategy, price, score, sector, status)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
        )
        .bind(&date)
        .bind(&row.symbol)
        .bind(result.strategy)
        .bind(row.price)
        .bind(&row.score)
        .bind(&row.sector)
        .bind(STATUS_NEW)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    Ok(result.rows.len())
}

/// Reject a `history` table whose columns differ from [`HISTORY_COLUMNS`].
async fn verify_schema(conn: &mut SqliteConnection) -> Result<()> {
    let actual: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM pragma_table_info('history') ORDER BY cid",
    )
    .fetch_all(&mut *conn)
    .await?;

    if actual.iter().map(String::as_str).ne(HISTORY_COLUMNS) {
        return Err(Error::Schema(format!(
            "expected columns {HISTORY_COLUMNS:?}, found {actual:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{MatchRecord, Metric, ScanStrategy};
    use tempfile::TempDir;

    async fn temp_store() -> (TempDir, HistoryStore) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("sniper.db").display());
        let store = HistoryStore::new(&url).unwrap();
        store.init().await.unwrap();
        (dir, store)
    }

    fn result(strategy: ScanStrategy, stocks: &[&str]) -> ScanResult {
        let mut r = ScanResult::empty(strategy);
        r.rows = stocks
            .iter()
            .map(|s| MatchRecord {
                symbol: s.to_string(),
                price: 123.45,
                score: strategy.score_label().to_string(),
                sector: "unknown".to_string(),
                metric: Metric::RelVolume(2.0),
            })
            .collect();
        r
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[tokio::test]
    async fn empty_store_has_empty_history() {
        let (_dir, store) = temp_store().await;
        assert!(store.history().await.is_empty());
        assert!(store.try_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_result_writes_nothing() {
        let (_dir, store) = temp_store().await;
        let written = store.save(&ScanResult::empty(ScanStrategy::Golden)).await.unwrap();
        assert_eq!(written, 0);
        assert!(store.history().await.is_empty());
    }

    #[tokio::test]
    async fn saved_rows_are_stamped() {
        let (_dir, store) = temp_store().await;
        store
            .save_dated(&result(ScanStrategy::Bottom, &["SBIN"]), day(5))
            .await
            .unwrap();

        let rows = store.history().await;
        assert_eq!(
            rows,
            vec![HistoryEntry {
                date: "2024-03-05".into(),
                stock: "SBIN".into(),
                strategy: "Bottom".into(),
                price: 123.45,
                score: "8/10".into(),
                sector: "unknown".into(),
                status: "new".into(),
            }]
        );
    }

    #[tokio::test]
    async fn history_is_most_recent_first() {
        let (_dir, store) = temp_store().await;
        store
            .save_dated(&result(ScanStrategy::Golden, &["OLD"]), day(1))
            .await
            .unwrap();
        store
            .save_dated(&result(ScanStrategy::Golden, &["NEWEST"]), day(9))
            .await
            .unwrap();
        store
            .save_dated(&result(ScanStrategy::Bottom, &["MID"]), day(4))
            .await
            .unwrap();

        let stocks: Vec<String> = store.history().await.into_iter().map(|e| e.stock).collect();
        assert_eq!(stocks, vec!["NEWEST", "MID", "OLD"]);
    }

    #[tokio::test]
    async fn repeated_saves_duplicate_rows() {
        let (_dir, store) = temp_store().await;
        let scan = result(ScanStrategy::Golden, &["TCS", "INFY"]);
        store.save_dated(&scan, day(2)).await.unwrap();
        store.save_dated(&scan, day(2)).await.unwrap();
        assert_eq!(store.history().await.len(), 4);
    }

    #[tokio::test]
    async fn history_reads_are_idempotent() {
        let (_dir, store) = temp_store().await;
        store
            .save_dated(&result(ScanStrategy::Golden, &["A", "B", "C"]), day(3))
            .await
            .unwrap();
        assert_eq!(store.history().await, store.history().await);
    }

    #[tokio::test]
    async fn mismatched_columns_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("legacy.db").display());
        let store = HistoryStore::new(&url).unwrap();

        let mut conn = store.connect().await.unwrap();
        sqlx::query("CREATE TABLE history (date TEXT, Stock TEXT, strategy TEXT, Price REAL)")
            .execute(&mut conn)
            .await
            .unwrap();
        conn.close().await.unwrap();

        assert!(matches!(store.init().await, Err(Error::Schema(_))));
        let save = store
            .save_dated(&result(ScanStrategy::Golden, &["TCS"]), day(1))
            .await;
        assert!(matches!(save, Err(Error::Schema(_))));
    }

    #[tokio::test]
    async fn unreadable_store_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        // Never initialised: the table does not exist
        let url = format!("sqlite://{}", dir.path().join("blank.db").display());
        let store = HistoryStore::new(&url).unwrap();
        assert!(store.try_history().await.is_err());
        assert!(store.history().await.is_empty());
    }
}
