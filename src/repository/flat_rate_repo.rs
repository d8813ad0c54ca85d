// ==========================================
// 奶牛场运营决策支持系统 - 固定价设置仓储
// ==========================================
// 职责: 管理 flat_rate_setting 表（成分无关的兜底价）
// 说明: "当前兜底价" = 激活条目中创建时间最新的一条
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::rate::FlatRateSetting;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct FlatRateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FlatRateRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_table()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        let repo = Self { conn };
        repo.ensure_table()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 确保表存在（如果不存在则创建）
    fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS flat_rate_setting (
              setting_id TEXT PRIMARY KEY,
              rate_per_liter REAL NOT NULL,
              effective_from TEXT NOT NULL,
              is_active INTEGER NOT NULL DEFAULT 1,
              created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_flat_rate_active_created
              ON flat_rate_setting(is_active, created_at DESC);
            "#,
        )?;
        Ok(())
    }

    /// 插入新设置
    pub fn insert(&self, setting: &FlatRateSetting) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO flat_rate_setting (
                setting_id, rate_per_liter, effective_from, is_active, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                setting.setting_id,
                setting.rate_per_liter,
                setting.effective_from.to_string(),
                setting.is_active as i32,
                setting.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 列出所有设置（按创建时间倒序）
    pub fn list_all(&self) -> RepositoryResult<Vec<FlatRateSetting>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT setting_id, rate_per_liter, effective_from, is_active, created_at
            FROM flat_rate_setting
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let rows = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 查找当前激活的固定价设置
    ///
    /// 规则: is_active = 1 按创建时间降序取第一条（创建时间相同按 rowid 倒序兜底）。
    /// 不比较 effective_from。
    pub fn find_current_active(&self) -> RepositoryResult<Option<FlatRateSetting>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT setting_id, rate_per_liter, effective_from, is_active, created_at
            FROM flat_rate_setting
            WHERE is_active = 1
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row([], Self::map_row);

        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 ID 停用设置
    pub fn deactivate(&self, setting_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE flat_rate_setting SET is_active = 0 WHERE setting_id = ?1",
            params![setting_id],
        )?;
        Ok(affected)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<FlatRateSetting> {
        let effective_from: String = row.get(2)?;
        let is_active: i32 = row.get(3)?;
        let created_at: String = row.get(4)?;
        Ok(FlatRateSetting {
            setting_id: row.get(0)?,
            rate_per_liter: row.get(1)?,
            effective_from: effective_from.parse().unwrap_or(NaiveDate::MIN),
            is_active: is_active != 0,
            created_at: DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|_| Utc::now()),
        })
    }
}
