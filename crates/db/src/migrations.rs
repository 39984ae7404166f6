/// Inline SQL migrations for the dah job store.
///
/// We use simple inline migrations rather than sqlx migration files
/// because the schema is small and self-contained.

pub const MIGRATIONS: &[&str] = &[
    // Migration 1: job table. `seq` is the insertion sequence used to break
    // `created_at` ties when claiming.
    r#"
CREATE TABLE IF NOT EXISTS dah_jobs (
    seq               INTEGER PRIMARY KEY AUTOINCREMENT,
    id                TEXT NOT NULL UNIQUE,
    status            TEXT NOT NULL,
    space_id          TEXT,
    selected_page_ids TEXT NOT NULL DEFAULT '[]',
    message           TEXT NOT NULL,
    final_text        TEXT,
    error_text        TEXT,
    created_at        TEXT NOT NULL
);
"#,
    // Migration 2: oldest-first scan restricted to one status
    r#"CREATE INDEX IF NOT EXISTS idx_dah_jobs_status_created ON dah_jobs(status, created_at, seq);"#,
];
