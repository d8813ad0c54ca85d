// ==========================================
// 奶牛场运营决策支持系统 - 牛群 API
// ==========================================
// 职责: 繁殖台账 → 边界清洗 → 优先级排序 → 今日巡查工作单
// 红线: 脏数据在边界归一化，比较器内部绝不失败
// 架构: API 层 → Engine 层 (HerdPrioritySorter) → Domain 层
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::breeding::{BreedingRecord, RawBreedingRecord};
use crate::engine::herd_priority::HerdPrioritySorter;

// ==========================================
// WorklistItem - 工作单条目（含排序依据）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorklistItem {
    pub record: BreedingRecord,
    pub sort_reason: String, // 排序依据（JSON，可解释性）
}

// ==========================================
// HerdApi - 牛群 API
// ==========================================
pub struct HerdApi {
    config: Arc<ConfigManager>,
    sorter: HerdPrioritySorter,
}

impl HerdApi {
    pub fn new(config: Arc<ConfigManager>) -> Self {
        Self {
            config,
            sorter: HerdPrioritySorter::new(),
        }
    }

    /// 生成今日优先级工作单
    ///
    /// 基准日取当前日历日，整次调用只取一次（保证同一次排序口径一致）
    #[instrument(skip(self, raw_records), fields(record_count = raw_records.len()))]
    pub fn prioritized_worklist(
        &self,
        raw_records: Vec<RawBreedingRecord>,
    ) -> ApiResult<Vec<WorklistItem>> {
        let today = Local::now().date_naive();
        self.prioritized_worklist_as_of(raw_records, today)
    }

    /// 生成指定基准日的优先级工作单
    pub fn prioritized_worklist_as_of(
        &self,
        raw_records: Vec<RawBreedingRecord>,
        today: NaiveDate,
    ) -> ApiResult<Vec<WorklistItem>> {
        let close_up_days = self
            .config
            .get_close_up_threshold_days()
            .map_err(|e| crate::api::error::ApiError::InternalError(e.to_string()))?;
        let pd_interval_days = self
            .config
            .get_pd_interval_days()
            .map_err(|e| crate::api::error::ApiError::InternalError(e.to_string()))?;

        // 边界清洗: 脏日期/未知状态在这里归一化，排序器内部不失败
        let records: Vec<BreedingRecord> = raw_records
            .iter()
            .map(BreedingRecord::from_raw)
            .collect();

        let sorted = self
            .sorter
            .sort(records, today, close_up_days, pd_interval_days);

        let items = sorted
            .into_iter()
            .map(|record| {
                let sort_reason =
                    self.sorter
                        .sort_reason(&record, today, close_up_days, pd_interval_days);
                WorklistItem {
                    record,
                    sort_reason,
                }
            })
            .collect();

        Ok(items)
    }
}
