// ==========================================
// 奶牛场运营决策支持系统 - 牛群优先级排序引擎
// ==========================================
// 职责: 按运营紧急度对繁殖状态记录产生全序工单
// 输入: 已在边界规范化的 BreedingRecord 列表 + 基准日
// 输出: 排序后的记录列表（不增不减，长度不变）
// 红线: 比较器对任意输入都不失败；today 每次排序只取一次
// ==========================================

use crate::domain::breeding::BreedingRecord;
use crate::domain::types::BreedingStatus;
use chrono::{Local, NaiveDate};
use std::cmp::Ordering;
use tracing::instrument;

/// 缺失日期/未知组的哨兵天数（排到组内末尾）
pub const MISSING_DAYS_SENTINEL: i64 = 9999;

/// 缺失配次的哨兵值
pub const MISSING_SERVICE_SENTINEL: i32 = 99;

/// 临产窗口默认阈值（天）
pub const DEFAULT_CLOSE_UP_DAYS: i64 = 60;

/// 孕检间隔默认值（配种后天数）
pub const DEFAULT_PD_INTERVAL_DAYS: i64 = 60;

// ==========================================
// HerdPrioritySorter - 牛群优先级排序引擎
// ==========================================
pub struct HerdPrioritySorter {
    // 无状态引擎,不需要注入依赖
}

impl HerdPrioritySorter {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 排序繁殖状态记录
    ///
    /// 组合键（依次比较）:
    /// 1) 优先组升序: 0 临产孕牛 / 1 其余孕牛 / 2 待孕检 / 3 已产犊 / 9 兜底
    /// 2) 组内二级键（各组语义不同，见 secondary_key）
    /// 3) last_ai_date 升序（缺失排最后）
    /// 4) service_number 升序（缺失视为 99）
    /// 5) cow_number 升序（牛号唯一，保证全序）
    ///
    /// # 参数
    /// - `records`: 待排序记录
    /// - `today`: 基准日（整个排序过程只取一次，避免跨午夜漂移）
    /// - `close_up_days`: 临产窗口阈值（天）
    /// - `pd_interval_days`: 孕检间隔（天）
    ///
    /// # 返回
    /// 排序后的记录列表（稳定排序，键全等时保持输入相对顺序）
    #[instrument(skip(self, records), fields(count = records.len(), %today))]
    pub fn sort(
        &self,
        mut records: Vec<BreedingRecord>,
        today: NaiveDate,
        close_up_days: i64,
        pd_interval_days: i64,
    ) -> Vec<BreedingRecord> {
        records.sort_by(|a, b| self.compare(a, b, today, close_up_days, pd_interval_days));
        records
    }

    /// 以默认阈值、以"当前日历日"为基准日排序
    ///
    /// today 在进入排序前取一次
    pub fn sort_today(&self, records: Vec<BreedingRecord>) -> Vec<BreedingRecord> {
        let today = Local::now().date_naive();
        self.sort(
            records,
            today,
            DEFAULT_CLOSE_UP_DAYS,
            DEFAULT_PD_INTERVAL_DAYS,
        )
    }

    // ==========================================
    // 比较方法
    // ==========================================

    /// 比较两条记录的优先级
    ///
    /// Ordering::Less 表示 a 优先于 b（排在前面）
    pub fn compare(
        &self,
        a: &BreedingRecord,
        b: &BreedingRecord,
        today: NaiveDate,
        close_up_days: i64,
        pd_interval_days: i64,
    ) -> Ordering {
        // 1. 优先组升序
        let group_a = self.priority_group(a, today, close_up_days);
        let group_b = self.priority_group(b, today, close_up_days);
        match group_a.cmp(&group_b) {
            Ordering::Equal => {}
            other => return other,
        }

        // 2. 组内二级键升序
        let key_a = self.secondary_key(a, group_a, today, pd_interval_days);
        let key_b = self.secondary_key(b, group_b, today, pd_interval_days);
        match key_a.cmp(&key_b) {
            Ordering::Equal => {}
            other => return other,
        }

        // 3. last_ai_date 升序（缺失排最后）
        let ai_a = a.last_ai_date.unwrap_or(NaiveDate::MAX);
        let ai_b = b.last_ai_date.unwrap_or(NaiveDate::MAX);
        match ai_a.cmp(&ai_b) {
            Ordering::Equal => {}
            other => return other,
        }

        // 4. service_number 升序（缺失视为 99）
        let svc_a = a.service_number.unwrap_or(MISSING_SERVICE_SENTINEL);
        let svc_b = b.service_number.unwrap_or(MISSING_SERVICE_SENTINEL);
        match svc_a.cmp(&svc_b) {
            Ordering::Equal => {}
            other => return other,
        }

        // 5. cow_number 升序（唯一，保证全序）
        a.cow_number.cmp(&b.cow_number)
    }

    /// 判定优先组
    ///
    /// - 组0: 怀孕 且 距预产期 ≤ close_up_days（临产，含已超预产期的负天数）
    /// - 组1: 其余怀孕（含预产期未知）
    /// - 组2: 待孕检/待复配
    /// - 组3: 已产犊
    /// - 组9: 兜底（状态无法识别；比较器不失败）
    pub fn priority_group(
        &self,
        record: &BreedingRecord,
        today: NaiveDate,
        close_up_days: i64,
    ) -> u8 {
        match record.status {
            BreedingStatus::Pregnant => match record.expected_delivery_date {
                Some(due) if (due - today).num_days() <= close_up_days => 0,
                _ => 1,
            },
            BreedingStatus::Pending => 2,
            BreedingStatus::Delivered => 3,
            BreedingStatus::Unknown => 9,
        }
    }

    /// 计算组内二级键（升序，越小越优先）
    ///
    /// - 组0/1: 距预产期天数（越近越优先）；缺失 → 9999
    /// - 组2: 距孕检到期日天数；负值（孕检已逾期）最优先；缺失 → 9999
    /// - 组3: 产犊距今已过天数（越近期产犊越优先）；缺失日期视为"0天前"（最优先）
    /// - 组9: 9999（无业务二级序）
    pub fn secondary_key(
        &self,
        record: &BreedingRecord,
        group: u8,
        today: NaiveDate,
        pd_interval_days: i64,
    ) -> i64 {
        match group {
            0 | 1 => record
                .expected_delivery_date
                .map(|d| (d - today).num_days())
                .unwrap_or(MISSING_DAYS_SENTINEL),
            2 => record
                .pd_due_date(pd_interval_days)
                .map(|d| (d - today).num_days())
                .unwrap_or(MISSING_DAYS_SENTINEL),
            3 => record
                .delivered_on_date
                .map(|d| (today - d).num_days())
                .unwrap_or(0),
            _ => MISSING_DAYS_SENTINEL,
        }
    }

    /// 生成排序原因 (可解释性)
    ///
    /// # 返回
    /// JSON 格式的排序键快照
    pub fn sort_reason(
        &self,
        record: &BreedingRecord,
        today: NaiveDate,
        close_up_days: i64,
        pd_interval_days: i64,
    ) -> String {
        let group = self.priority_group(record, today, close_up_days);
        let secondary = self.secondary_key(record, group, today, pd_interval_days);

        let primary_factor = match group {
            0 => "CLOSE_UP",
            1 => "PREGNANT",
            2 => {
                if secondary < 0 {
                    "PD_OVERDUE"
                } else {
                    "PD_PENDING"
                }
            }
            3 => "RECENT_DELIVERY",
            _ => "UNCLASSIFIED",
        };

        serde_json::json!({
            "sort_keys": {
                "group": group,
                "secondary": secondary,
                "last_ai_date": record.last_ai_date.map(|d| d.to_string()),
                "service_number": record.service_number.unwrap_or(MISSING_SERVICE_SENTINEL),
                "cow_number": record.cow_number,
            },
            "primary_factor": primary_factor,
            "today": today.to_string(),
        })
        .to_string()
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for HerdPrioritySorter {
    fn default() -> Self {
        Self::new()
    }
}
