// ==========================================
// 奶牛场运营决策支持系统 - 领域类型定义
// ==========================================
// 依据: 奶价矩阵与牛群优先级业务规则
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 物种 (Species)
// ==========================================
// 奶价矩阵按物种独立维护（牛奶/水牛奶价差显著）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Species {
    Cow,     // 奶牛
    Buffalo, // 水牛
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Species::Cow => write!(f, "COW"),
            Species::Buffalo => write!(f, "BUFFALO"),
        }
    }
}

impl Species {
    /// 从字符串解析物种（大小写不敏感）
    ///
    /// # 返回
    /// - Some(Species): 识别成功
    /// - None: 无法识别（调用方错误，必须显式处理，不做静默默认）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "COW" => Some(Species::Cow),
            "BUFFALO" => Some(Species::Buffalo),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Species::Cow => "COW",
            Species::Buffalo => "BUFFALO",
        }
    }
}

// ==========================================
// 繁殖状态 (Breeding Status)
// ==========================================
// 由上游配种/产犊记录派生的投影字段，三态互斥
// Unknown 为边界规范化的兜底值（脏数据不抛错，进组9）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreedingStatus {
    Pregnant,  // 已确认怀孕
    Pending,   // 待孕检/待复配
    Delivered, // 近期产犊
    Unknown,   // 无法识别的状态（归入默认组）
}

impl fmt::Display for BreedingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BreedingStatus::Pregnant => write!(f, "PREGNANT"),
            BreedingStatus::Pending => write!(f, "PENDING"),
            BreedingStatus::Delivered => write!(f, "DELIVERED"),
            BreedingStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

impl BreedingStatus {
    /// 从字符串解析繁殖状态（大小写不敏感）
    ///
    /// 无法识别的输入返回 Unknown，排序时落入默认组，
    /// 保证比较器对任意输入都不会失败
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PREGNANT" => BreedingStatus::Pregnant,
            "PENDING" => BreedingStatus::Pending,
            "DELIVERED" => BreedingStatus::Delivered,
            _ => BreedingStatus::Unknown,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BreedingStatus::Pregnant => "PREGNANT",
            BreedingStatus::Pending => "PENDING",
            BreedingStatus::Delivered => "DELIVERED",
            BreedingStatus::Unknown => "UNKNOWN",
        }
    }
}

// ==========================================
// 价格来源 (Rate Source)
// ==========================================
// 解析管线的可解释性输出：矩阵命中 or 兜底价
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    Matrix,   // 脂肪×SNF 矩阵精确命中
    FlatRate, // 固定价兜底
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Matrix => write!(f, "MATRIX"),
            RateSource::FlatRate => write!(f, "FLAT_RATE"),
        }
    }
}
