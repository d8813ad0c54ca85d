// ==========================================
// 奶牛场运营决策支持系统 - 繁殖状态领域模型
// ==========================================
// 职责: 繁殖状态投影记录（每次列表请求由上游配种/产犊记录重算）
// 红线: 脏数据在边界规范化一次，比较器内部不再解析
// ==========================================

use crate::domain::types::BreedingStatus;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// 宽松解析日期字符串
///
/// 支持 ISO（YYYY-MM-DD）与常见的 YYYY/MM/DD、DD-MM-YYYY 写法。
/// 解析失败返回 None（与缺失同义），排序侧以哨兵值兜底，绝不抛错。
pub fn parse_date_lenient(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%d-%m-%Y", "%d/%m/%Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // 带时间戳的 ISO 写法（上游偶见 "2024-01-01T08:30:00"）
    if let Some((date_part, _)) = s.split_once('T') {
        if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
            return Some(d);
        }
    }
    None
}

// ==========================================
// RawBreedingRecord - 上游原始投影（脏数据入口）
// ==========================================
// 上游为非规范化、可能部分录入的农场记录；所有字段按原样接收
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBreedingRecord {
    pub cow_number: i64,                        // 牛号（唯一）
    pub status: String,                         // 繁殖状态（原始字符串）
    pub expected_delivery_date: Option<String>, // 预产期
    pub delivered_on_date: Option<String>,      // 产犊日期
    pub last_ai_date: Option<String>,           // 最近配种日期
    pub service_number: Option<i32>,            // 配次
}

// ==========================================
// BreedingRecord - 规范化繁殖状态记录
// ==========================================
// 排序引擎唯一消费的形态；日期已解析，状态已归类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreedingRecord {
    pub cow_number: i64,                           // 牛号（唯一，最终排序键）
    pub status: BreedingStatus,                    // 繁殖状态
    pub expected_delivery_date: Option<NaiveDate>, // 预产期
    pub delivered_on_date: Option<NaiveDate>,      // 产犊日期
    pub last_ai_date: Option<NaiveDate>,           // 最近配种日期
    pub service_number: Option<i32>,               // 配次
}

impl BreedingRecord {
    /// 从原始投影规范化（边界一次性完成，不抛错）
    pub fn from_raw(raw: &RawBreedingRecord) -> Self {
        Self {
            cow_number: raw.cow_number,
            status: BreedingStatus::from_str(&raw.status),
            expected_delivery_date: raw
                .expected_delivery_date
                .as_deref()
                .and_then(parse_date_lenient),
            delivered_on_date: raw
                .delivered_on_date
                .as_deref()
                .and_then(parse_date_lenient),
            last_ai_date: raw.last_ai_date.as_deref().and_then(parse_date_lenient),
            service_number: raw.service_number,
        }
    }

    /// 派生孕检到期日（last_ai_date + pd_interval_days）
    ///
    /// 孕检在配种后固定间隔执行；该字段为派生值，不落库
    pub fn pd_due_date(&self, pd_interval_days: i64) -> Option<NaiveDate> {
        self.last_ai_date
            .map(|d| d + Duration::days(pd_interval_days))
    }
}
