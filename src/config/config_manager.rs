// ==========================================
// 奶牛场运营决策支持系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        let manager = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        manager.ensure_table()?;
        Ok(manager)
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        let manager = Self { conn };
        manager.ensure_table()?;
        Ok(manager)
    }

    fn ensure_table(&self) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config_kv (
              scope_id TEXT NOT NULL DEFAULT 'global',
              key TEXT NOT NULL,
              value TEXT NOT NULL,
              PRIMARY KEY (scope_id, key)
            );
            "#,
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（scope_id='global'，UPSERT 语义）
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    // ===== 繁殖排序配置 =====

    /// 临产窗口阈值（天）
    ///
    /// 预产期在该窗口内的怀孕牛视为"临产"，优先级最高（默认 60 天）。
    pub fn get_close_up_threshold_days(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CLOSE_UP_THRESHOLD_DAYS, "60")?;
        Ok(value.parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::CLOSE_UP_THRESHOLD_DAYS,
                raw_value = %value,
                "临产窗口配置格式错误，使用默认值 60"
            );
            60
        }))
    }

    /// 孕检间隔（天）
    ///
    /// 待孕检牛的孕检应检日 = 最近配种日 + 该间隔（默认 60 天）。
    pub fn get_pd_interval_days(&self) -> Result<i64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::PD_INTERVAL_DAYS, "60")?;
        Ok(value.parse::<i64>().unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::PD_INTERVAL_DAYS,
                raw_value = %value,
                "孕检间隔配置格式错误，使用默认值 60"
            );
            60
        }))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 繁殖排序
    pub const CLOSE_UP_THRESHOLD_DAYS: &str = "close_up_threshold_days";
    pub const PD_INTERVAL_DAYS: &str = "pd_interval_days";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_test_manager() -> ConfigManager {
        ConfigManager::new(":memory:").expect("Failed to create test config manager")
    }

    #[test]
    fn test_defaults_when_table_empty() {
        let manager = setup_test_manager();
        assert_eq!(manager.get_close_up_threshold_days().unwrap(), 60);
        assert_eq!(manager.get_pd_interval_days().unwrap(), 60);
    }

    #[test]
    fn test_set_and_get_override() {
        let manager = setup_test_manager();
        manager
            .set_config_value(config_keys::CLOSE_UP_THRESHOLD_DAYS, "45")
            .unwrap();
        assert_eq!(manager.get_close_up_threshold_days().unwrap(), 45);

        // UPSERT: 重复写入同一键覆盖旧值
        manager
            .set_config_value(config_keys::CLOSE_UP_THRESHOLD_DAYS, "30")
            .unwrap();
        assert_eq!(manager.get_close_up_threshold_days().unwrap(), 30);
    }

    #[test]
    fn test_malformed_value_falls_back_to_default() {
        let manager = setup_test_manager();
        manager
            .set_config_value(config_keys::PD_INTERVAL_DAYS, "abc")
            .unwrap();
        assert_eq!(manager.get_pd_interval_days().unwrap(), 60);
    }
}
