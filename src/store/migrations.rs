//! Version-tracked schema migrations for the libSQL backend.
//!
//! Steps are numbered. Every applied step is recorded in `_migrations`,
//! so reopening a database only runs the steps it has not seen.

use libsql::Connection;

use crate::error::StoreError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial_schema",
        sql: r#"
            CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                category TEXT,
                priority TEXT NOT NULL DEFAULT 'medium',
                status TEXT NOT NULL DEFAULT 'todo',
                due_date TEXT,
                is_active INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_todos_user ON todos(user_id);
            CREATE INDEX IF NOT EXISTS idx_todos_due ON todos(due_date);

            CREATE TABLE IF NOT EXISTS bills (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                account_name TEXT NOT NULL,
                bill_type TEXT NOT NULL DEFAULT 'other',
                need_or_want TEXT NOT NULL DEFAULT 'need',
                amount TEXT NOT NULL,
                balance TEXT,
                due_date TEXT NOT NULL,
                frequency TEXT NOT NULL DEFAULT 'monthly',
                autopay INTEGER NOT NULL DEFAULT 0,
                interest_rate TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_bills_user ON bills(user_id);
            CREATE INDEX IF NOT EXISTS idx_bills_due ON bills(due_date);

            CREATE TABLE IF NOT EXISTS teague_jobs (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                client_name TEXT NOT NULL,
                client_phone TEXT,
                client_email TEXT,
                job_description TEXT NOT NULL,
                quote_amount TEXT,
                concerns TEXT,
                status TEXT NOT NULL DEFAULT 'lead',
                scheduled_date TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_teague_jobs_user ON teague_jobs(user_id);
            CREATE INDEX IF NOT EXISTS idx_teague_jobs_status ON teague_jobs(status);
        "#,
    },
    Migration {
        version: 2,
        name: "accounts_and_income",
        sql: r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                account_name TEXT NOT NULL,
                account_type TEXT NOT NULL DEFAULT 'checking',
                current_balance TEXT NOT NULL DEFAULT '0',
                institution_name TEXT,
                account_number_last4 TEXT,
                notes TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_accounts_user ON accounts(user_id);

            CREATE TABLE IF NOT EXISTS income (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                source_name TEXT NOT NULL,
                amount TEXT NOT NULL,
                frequency TEXT NOT NULL DEFAULT 'monthly',
                next_date TEXT NOT NULL,
                account_id TEXT REFERENCES accounts(id) ON DELETE SET NULL,
                notes TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_income_user ON income(user_id);
            CREATE INDEX IF NOT EXISTS idx_income_next ON income(next_date);
        "#,
    },
    Migration {
        version: 3,
        name: "bill_account_link",
        sql: r#"
            ALTER TABLE bills ADD COLUMN account_id TEXT REFERENCES accounts(id) ON DELETE SET NULL;
        "#,
    },
];

const LEDGER: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
)";

/// Bring the database up to the newest schema version.
pub async fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(LEDGER, ())
        .await
        .map_err(|e| StoreError::Migration(format!("Cannot create migration ledger: {e}")))?;

    apply(conn, MIGRATIONS).await
}

async fn apply(conn: &Connection, steps: &[Migration]) -> Result<(), StoreError> {
    let applied = current_version(conn).await?;
    let pending: Vec<&Migration> = steps.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        tracing::debug!(version = applied, "Schema up to date");
        return Ok(());
    }

    for step in pending {
        tracing::info!(version = step.version, name = step.name, "Applying migration");
        // The ledger row rides in the same batch so a failed step is never recorded.
        let batch = format!(
            "BEGIN;\n{}\nINSERT INTO _migrations (version, name) VALUES ({}, '{}');\nCOMMIT;",
            step.sql, step.version, step.name
        );
        if let Err(e) = conn.execute_batch(&batch).await {
            if let Err(rollback) = conn.execute("ROLLBACK", ()).await {
                tracing::warn!(
                    version = step.version,
                    error = %rollback,
                    "Rollback after failed migration also failed"
                );
            }
            return Err(StoreError::Migration(format!(
                "V{} {} failed: {e}",
                step.version, step.name
            )));
        }
    }

    tracing::info!(version = current_version(conn).await?, "Schema migrated");
    Ok(())
}

/// Highest recorded version, 0 on a fresh database.
async fn current_version(conn: &Connection) -> Result<i64, StoreError> {
    let read = |e: libsql::Error| StoreError::Migration(format!("Cannot read schema version: {e}"));
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(read)?;
    match rows.next().await.map_err(read)? {
        Some(row) => row.get::<i64>(0).map_err(read),
        None => Ok(0),
    }
}
