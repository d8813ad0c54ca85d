// ==========================================
// 奶牛场运营决策支持系统 - 奶价领域模型
// ==========================================
// 职责: 奶价矩阵条目、固定价设置、解析查询/结果
// 红线: fat/snf 一律规范到一位小数，保证精确匹配语义
// ==========================================

use crate::domain::types::Species;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 将脂肪/SNF 百分比规范到一位小数
///
/// 矩阵来自电子表格的矩形网格，轴刻度约定为一位小数（如 4.0 / 8.5）。
/// 写入与查询两侧使用同一规范化函数，REAL 等值比较因此是精确的。
pub fn normalize_component(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

// ==========================================
// RateMatrixEntry - 奶价矩阵条目
// ==========================================
// 唯一键: (species, fat, snf, effective_from)，重复上传走 upsert
// 用途: 导入层写入，解析引擎只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateMatrixEntry {
    pub entry_id: String,            // 条目ID (UUID)
    pub species: Species,            // 物种
    pub fat: f64,                    // 脂肪率（%，一位小数）
    pub snf: f64,                    // 非脂乳固体率（%，一位小数）
    pub rate: f64,                   // 价格（每升）
    pub effective_from: NaiveDate,   // 生效日期
    pub created_at: DateTime<Utc>,   // 记录创建时间
    pub updated_at: DateTime<Utc>,   // 记录更新时间
}

impl RateMatrixEntry {
    /// 创建新条目（自动生成 UUID 与时间戳，fat/snf 自动规范化）
    pub fn new(
        species: Species,
        fat: f64,
        snf: f64,
        rate: f64,
        effective_from: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            entry_id: Uuid::new_v4().to_string(),
            species,
            fat: normalize_component(fat),
            snf: normalize_component(snf),
            rate,
            effective_from,
            created_at: now,
            updated_at: now,
        }
    }
}

// ==========================================
// FlatRateSetting - 固定价设置（兜底价）
// ==========================================
// 可存在多条；仅"创建时间最新的激活条目"被视为当前兜底价
// 注意: 固定价之间不按 effective_from 排序（只有矩阵条目按生效日期取最新）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatRateSetting {
    pub setting_id: String,          // 设置ID (UUID)
    pub rate_per_liter: f64,         // 每升价格（与成分无关）
    pub effective_from: NaiveDate,   // 生效日期（仅展示用途）
    pub is_active: bool,             // 激活标记
    pub created_at: DateTime<Utc>,   // 创建时间（兜底价选取依据）
}

impl FlatRateSetting {
    /// 创建新的固定价设置
    pub fn new(rate_per_liter: f64, effective_from: NaiveDate, is_active: bool) -> Self {
        Self {
            setting_id: Uuid::new_v4().to_string(),
            rate_per_liter,
            effective_from,
            is_active,
            created_at: Utc::now(),
        }
    }
}

// ==========================================
// RateQuery - 解析查询
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuery {
    pub species: Species,            // 物种
    pub fat: f64,                    // 脂肪率（%）
    pub snf: f64,                    // 非脂乳固体率（%）
    pub as_of: Option<NaiveDate>,    // 查询基准日（None = 今天）
}

impl RateQuery {
    pub fn new(species: Species, fat: f64, snf: f64, as_of: Option<NaiveDate>) -> Self {
        Self { species, fat, snf, as_of }
    }
}

// ==========================================
// ResolvedRate - 解析结果（矩阵命中）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    pub rate: f64,                   // 每升价格
    pub effective_from: NaiveDate,   // 命中条目的生效日期
}
