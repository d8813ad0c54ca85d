// ==========================================
// 奶牛场运营决策支持系统 - 奶价矩阵仓储
// ==========================================
// 职责: 管理 rate_matrix 表（按物种 + 脂肪 × SNF + 生效日期）
// 说明: 唯一键 (species, fat, snf, effective_from)，重复上传 upsert
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::rate::{normalize_component, RateMatrixEntry};
use crate::domain::types::Species;
use crate::engine::rate_resolver::RateMatrixLookup;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 解析时间戳列（RFC3339 或 SQLite datetime 格式），失败回落当前时间
fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
                .map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

pub struct RateMatrixRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RateMatrixRepository {
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
            CREATE TABLE IF NOT EXISTS rate_matrix (
              entry_id TEXT PRIMARY KEY,
              species TEXT NOT NULL,
              fat REAL NOT NULL,
              snf REAL NOT NULL,
              rate REAL NOT NULL,
              effective_from TEXT NOT NULL,
              created_at TEXT NOT NULL DEFAULT (datetime('now')),
              updated_at TEXT NOT NULL DEFAULT (datetime('now')),
              UNIQUE(species, fat, snf, effective_from)
            );

            CREATE INDEX IF NOT EXISTS idx_rate_matrix_lookup
              ON rate_matrix(species, fat, snf, effective_from DESC);
            "#,
        )?;
        Ok(())
    }

    /// 创建或更新条目（Upsert 操作）
    ///
    /// 如果 (species, fat, snf, effective_from) 已存在，则更新价格；否则插入
    pub fn upsert(&self, entry: &RateMatrixEntry) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rate_matrix (
                entry_id,
                species,
                fat,
                snf,
                rate,
                effective_from,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(species, fat, snf, effective_from) DO UPDATE SET
                rate = excluded.rate,
                updated_at = excluded.updated_at
            "#,
            params![
                entry.entry_id,
                entry.species.to_db_str(),
                entry.fat,
                entry.snf,
                entry.rate,
                entry.effective_from.to_string(),
                entry.created_at.to_rfc3339(),
                entry.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 批量 upsert（单事务）
    ///
    /// # 返回
    /// 写入的条目数
    pub fn upsert_batch(&self, entries: &[RateMatrixEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;

        for entry in entries {
            tx.execute(
                r#"
                INSERT INTO rate_matrix (
                    entry_id, species, fat, snf, rate, effective_from, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(species, fat, snf, effective_from) DO UPDATE SET
                    rate = excluded.rate,
                    updated_at = excluded.updated_at
                "#,
                params![
                    entry.entry_id,
                    entry.species.to_db_str(),
                    entry.fat,
                    entry.snf,
                    entry.rate,
                    entry.effective_from.to_string(),
                    entry.created_at.to_rfc3339(),
                    entry.updated_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(entries.len())
    }

    /// 列出某物种下所有条目（按 fat, snf, effective_from 排序）
    pub fn list_by_species(&self, species: Species) -> RepositoryResult<Vec<RateMatrixEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, species, fat, snf, rate, effective_from, created_at, updated_at
            FROM rate_matrix
            WHERE species = ?1
            ORDER BY fat ASC, snf ASC, effective_from ASC
            "#,
        )?;

        let rows = stmt
            .query_map(params![species.to_db_str()], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(rows)
    }

    /// 删除某物种下的所有条目（重建矩阵前使用）
    pub fn delete_by_species(&self, species: Species) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM rate_matrix WHERE species = ?1",
            params![species.to_db_str()],
        )?;
        Ok(affected)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RateMatrixEntry> {
        let species_str: String = row.get(1)?;
        // 物种列损坏不做静默默认，直接报转换失败
        let species = Species::from_str(&species_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("无法识别的物种: {}", species_str).into(),
            )
        })?;
        let effective_from: String = row.get(5)?;
        let created_at: String = row.get(6)?;
        let updated_at: String = row.get(7)?;
        Ok(RateMatrixEntry {
            entry_id: row.get(0)?,
            species,
            fat: row.get(2)?,
            snf: row.get(3)?,
            rate: row.get(4)?,
            effective_from: effective_from.parse().unwrap_or(NaiveDate::MIN),
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        })
    }
}

// ==========================================
// RateMatrixLookup 实现（解析引擎的查询接缝）
// ==========================================
impl RateMatrixLookup for RateMatrixRepository {
    /// 精确匹配查询
    ///
    /// SQL 与引擎策略逐字对应:
    /// effective_from <= as_of 中取生效日期最新的一条
    fn find_exact(
        &self,
        species: Species,
        fat: f64,
        snf: f64,
        as_of: NaiveDate,
    ) -> anyhow::Result<Option<RateMatrixEntry>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| anyhow::anyhow!("锁获取失败: {}", e))?;

        let fat = normalize_component(fat);
        let snf = normalize_component(snf);

        let mut stmt = conn.prepare(
            r#"
            SELECT entry_id, species, fat, snf, rate, effective_from, created_at, updated_at
            FROM rate_matrix
            WHERE species = ?1 AND fat = ?2 AND snf = ?3 AND effective_from <= ?4
            ORDER BY effective_from DESC
            LIMIT 1
            "#,
        )?;

        let result = stmt.query_row(
            params![species.to_db_str(), fat, snf, as_of.to_string()],
            Self::map_row,
        );

        match result {
            Ok(entry) => Ok(Some(entry)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup_test_repo() -> RateMatrixRepository {
        RateMatrixRepository::new(":memory:").expect("Failed to create test repository")
    }

    #[test]
    fn test_upsert_and_find_exact() {
        let repo = setup_test_repo();

        let entry = RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1));
        repo.upsert(&entry).expect("Failed to upsert");

        let found = repo
            .find_exact(Species::Cow, 4.0, 8.5, date(2024, 6, 1))
            .expect("Failed to query")
            .expect("Entry not found");

        assert_eq!(found.rate, 45.0);
        assert_eq!(found.effective_from, date(2024, 1, 1));
    }

    #[test]
    fn test_upsert_conflict_updates_rate() {
        let repo = setup_test_repo();

        let entry1 = RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1));
        repo.upsert(&entry1).expect("Failed to upsert 1");

        // 同键重复上传 → 覆盖价格而非重复
        let entry2 = RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 47.5, date(2024, 1, 1));
        repo.upsert(&entry2).expect("Failed to upsert 2");

        let all = repo.list_by_species(Species::Cow).expect("Failed to list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].rate, 47.5);
    }

    #[test]
    fn test_find_exact_prefers_latest_effective() {
        let repo = setup_test_repo();

        repo.upsert(&RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 42.0, date(2023, 1, 1)))
            .unwrap();
        repo.upsert(&RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1)))
            .unwrap();
        repo.upsert(&RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 48.0, date(2024, 9, 1)))
            .unwrap();

        // 未来生效的条目不参与
        let found = repo
            .find_exact(Species::Cow, 4.0, 8.5, date(2024, 6, 1))
            .unwrap()
            .unwrap();
        assert_eq!(found.rate, 45.0);
    }

    #[test]
    fn test_find_exact_no_cell_returns_none() {
        let repo = setup_test_repo();

        repo.upsert(&RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1)))
            .unwrap();

        // 网格外的 fat → 未命中（不做插值）
        let found = repo
            .find_exact(Species::Cow, 4.1, 8.5, date(2024, 6, 1))
            .unwrap();
        assert!(found.is_none());

        // 不同物种同 (fat, snf) → 未命中
        let found = repo
            .find_exact(Species::Buffalo, 4.0, 8.5, date(2024, 6, 1))
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_map_row_rejects_corrupted_species() {
        let repo = setup_test_repo();

        // 绕过类型化写入路径，直接注入损坏的物种列
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                r#"
                INSERT INTO rate_matrix (entry_id, species, fat, snf, rate, effective_from)
                VALUES ('E-BAD', 'GOAT', 4.0, 8.5, 45.0, '2024-01-01')
                "#,
                [],
            )
            .unwrap();

            // 读取时不得静默默认为某个物种，必须报转换失败
            let result = conn.query_row(
                r#"
                SELECT entry_id, species, fat, snf, rate, effective_from, created_at, updated_at
                FROM rate_matrix WHERE entry_id = 'E-BAD'
                "#,
                [],
                RateMatrixRepository::map_row,
            );
            assert!(matches!(
                result,
                Err(rusqlite::Error::FromSqlConversionFailure(1, _, _))
            ));
        }
    }

    #[test]
    fn test_upsert_batch_and_delete_by_species() {
        let repo = setup_test_repo();

        let entries: Vec<RateMatrixEntry> = vec![
            RateMatrixEntry::new(Species::Cow, 3.5, 8.0, 40.0, date(2024, 1, 1)),
            RateMatrixEntry::new(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1)),
            RateMatrixEntry::new(Species::Buffalo, 6.0, 9.0, 55.0, date(2024, 1, 1)),
        ];

        let written = repo.upsert_batch(&entries).expect("Failed to batch upsert");
        assert_eq!(written, 3);

        let affected = repo.delete_by_species(Species::Cow).expect("Failed to delete");
        assert_eq!(affected, 2);
        assert_eq!(repo.list_by_species(Species::Cow).unwrap().len(), 0);
        assert_eq!(repo.list_by_species(Species::Buffalo).unwrap().len(), 1);
    }
}
