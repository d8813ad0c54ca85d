// ==========================================
// 奶牛场运营决策支持系统 - 奶价解析引擎
// ==========================================
// 职责: (species, fat, snf, as_of) → 矩阵精确匹配价格 or "未命中"
// 红线: 不做 fat/SNF 插值；不做跨调用缓存（价格正确性风险）
// 红线: 非法输入大声失败，不静默走兜底
// ==========================================

use crate::domain::rate::{normalize_component, RateMatrixEntry, RateQuery, ResolvedRate};
use crate::domain::types::Species;
use chrono::{Local, NaiveDate};
use thiserror::Error;
use tracing::instrument;

// ==========================================
// 解析错误类型
// ==========================================
/// 奶价解析错误
///
/// 三类信号严格区分：
/// - 合法未命中: Ok(None)（常见，触发兜底）
/// - 查询服务失败: LookupFailed（也触发兜底，但单独记录，便于诊断）
/// - 非法输入: InvalidInput（调用方 bug，必须大声失败）
#[derive(Error, Debug)]
pub enum RateResolveError {
    #[error("非法输入: {0}")]
    InvalidInput(String),

    #[error("矩阵查询失败: {0}")]
    LookupFailed(String),
}

pub type RateResolveResult<T> = Result<T, RateResolveError>;

// ==========================================
// RateMatrixLookup - 矩阵查询接缝
// ==========================================
/// 外部数据服务的查询契约（仓储层实现）
///
/// 语义: 在 effective_from <= as_of 的条目中精确匹配 (species, fat, snf)，
/// 取 effective_from 最新的一条；无命中返回 None
pub trait RateMatrixLookup {
    fn find_exact(
        &self,
        species: Species,
        fat: f64,
        snf: f64,
        as_of: NaiveDate,
    ) -> anyhow::Result<Option<RateMatrixEntry>>;
}

// ==========================================
// RateResolver - 奶价解析引擎
// ==========================================
pub struct RateResolver {
    // 无状态引擎,不需要注入依赖
}

impl RateResolver {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 解析奶价（走外部查询服务）
    ///
    /// # 参数
    /// - `lookup`: 矩阵查询服务（单次请求/响应，无重试、无批处理）
    /// - `query`: 查询条件；as_of 为 None 时取当前日历日
    ///
    /// # 返回
    /// - Ok(Some(ResolvedRate)): 矩阵命中
    /// - Ok(None): 合法未命中（调用方应走固定价兜底）
    /// - Err(InvalidInput): 输入非法（fat/snf 非正或非有限）
    /// - Err(LookupFailed): 查询服务故障（调用方可兜底，但应单独记录）
    #[instrument(skip(self, lookup), fields(species = %query.species, fat = query.fat, snf = query.snf))]
    pub fn resolve(
        &self,
        lookup: &dyn RateMatrixLookup,
        query: &RateQuery,
    ) -> RateResolveResult<Option<ResolvedRate>> {
        self.validate(query)?;

        let as_of = query.as_of.unwrap_or_else(|| Local::now().date_naive());
        let fat = normalize_component(query.fat);
        let snf = normalize_component(query.snf);

        let entry = lookup
            .find_exact(query.species, fat, snf, as_of)
            .map_err(|e| RateResolveError::LookupFailed(e.to_string()))?;

        Ok(entry.map(|e| ResolvedRate {
            rate: e.rate,
            effective_from: e.effective_from,
        }))
    }

    /// 解析奶价（纯内存版本，对已物化的条目集合执行同一策略）
    ///
    /// 与 resolve 的查询语义逐字一致；给定输入与基准日，结果引用透明
    pub fn resolve_in_memory(
        &self,
        entries: &[RateMatrixEntry],
        query: &RateQuery,
    ) -> RateResolveResult<Option<ResolvedRate>> {
        self.validate(query)?;

        let as_of = query.as_of.unwrap_or_else(|| Local::now().date_naive());
        let fat = normalize_component(query.fat);
        let snf = normalize_component(query.snf);

        let hit = entries
            .iter()
            .filter(|e| {
                e.species == query.species
                    && e.fat == fat
                    && e.snf == snf
                    && e.effective_from <= as_of
            })
            .max_by_key(|e| e.effective_from);

        Ok(hit.map(|e| ResolvedRate {
            rate: e.rate,
            effective_from: e.effective_from,
        }))
    }

    /// 输入校验（调用方 bug，大声失败）
    fn validate(&self, query: &RateQuery) -> RateResolveResult<()> {
        if !query.fat.is_finite() || query.fat <= 0.0 {
            return Err(RateResolveError::InvalidInput(format!(
                "fat 必须为正实数, 实际 {}",
                query.fat
            )));
        }
        if !query.snf.is_finite() || query.snf <= 0.0 {
            return Err(RateResolveError::InvalidInput(format!(
                "snf 必须为正实数, 实际 {}",
                query.snf
            )));
        }
        Ok(())
    }
}

impl Default for RateResolver {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// FlatRateFallback - 固定价兜底
// ==========================================
pub struct FlatRateFallback;

impl FlatRateFallback {
    /// 选取当前固定价设置
    ///
    /// 规则: is_active = true 的候选按创建时间降序取第一条。
    /// 固定价之间不比较 effective_from。
    ///
    /// # 返回
    /// - Some: 当前激活的固定价设置
    /// - None: 无激活设置（调用方应上抛"价格无法解析"，不得静默取 0）
    pub fn current(
        settings: &[crate::domain::rate::FlatRateSetting],
    ) -> Option<&crate::domain::rate::FlatRateSetting> {
        settings
            .iter()
            .filter(|s| s.is_active)
            .max_by_key(|s| s.created_at)
    }

    /// 选取当前固定价（数值形式）
    ///
    /// 列表为空或无激活设置时返回 0.0 —— 这是与外层约定保持的既有缺口
    /// （见设计文档），API 层在此之前已显式处理"无价可用"的情况
    pub fn select(settings: &[crate::domain::rate::FlatRateSetting]) -> f64 {
        Self::current(settings).map(|s| s.rate_per_liter).unwrap_or(0.0)
    }
}
