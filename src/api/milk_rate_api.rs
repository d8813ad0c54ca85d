// ==========================================
// 奶牛场运营决策支持系统 - 奶价 API
// ==========================================
// 职责: 编排"矩阵精确匹配 → 固定价兜底"的完整定价流程
// 红线: 矩阵未命中与查询服务故障都走兜底，但日志口径分开；
//       非法输入直接上抛；无兜底价时显式报错，不返回 0 价
// 架构: API 层 → Engine 层 (RateResolver) → Repository 层
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::rate::RateQuery;
use crate::domain::types::RateSource;
use crate::engine::rate_resolver::{RateResolveError, RateResolver};
use crate::repository::{FlatRateRepository, RateMatrixRepository};

// ==========================================
// PriceResolution - 定价结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResolution {
    pub price_per_liter: f64,              // 每升价格
    pub source: RateSource,                // 价格来源（矩阵/固定价）
    pub effective_from: Option<NaiveDate>, // 矩阵命中时的生效日期
}

// ==========================================
// MilkRateApi - 奶价 API
// ==========================================
pub struct MilkRateApi {
    matrix_repo: Arc<RateMatrixRepository>,
    flat_rate_repo: Arc<FlatRateRepository>,
    resolver: RateResolver,
}

impl MilkRateApi {
    pub fn new(
        matrix_repo: Arc<RateMatrixRepository>,
        flat_rate_repo: Arc<FlatRateRepository>,
    ) -> Self {
        Self {
            matrix_repo,
            flat_rate_repo,
            resolver: RateResolver::new(),
        }
    }

    /// 解析某次挤奶记录应采用的价格
    ///
    /// 流程:
    /// 1. 矩阵精确匹配（不插值，不缓存）
    /// 2. 未命中 / 查询故障 → 当前激活固定价兜底
    /// 3. 无兜底价 → PriceUnresolved（显式报错，不返回 0 价）
    ///
    /// # 返回
    /// - Ok(PriceResolution): 价格及其来源
    /// - Err(InvalidInput): fat/snf 非法（调用方 bug，不走兜底）
    /// - Err(PriceUnresolved): 矩阵未命中且无激活固定价
    #[instrument(skip(self), fields(species = %query.species, fat = query.fat, snf = query.snf))]
    pub fn resolve_price(&self, query: &RateQuery) -> ApiResult<PriceResolution> {
        match self.resolver.resolve(self.matrix_repo.as_ref(), query) {
            Ok(Some(resolved)) => {
                return Ok(PriceResolution {
                    price_per_liter: resolved.rate,
                    source: RateSource::Matrix,
                    effective_from: Some(resolved.effective_from),
                });
            }
            Ok(None) => {
                // 合法未命中: 常见情形（如成分不在网格上），debug 级别即可
                tracing::debug!("矩阵未命中，转固定价兜底");
            }
            Err(RateResolveError::InvalidInput(msg)) => {
                return Err(ApiError::InvalidInput(msg));
            }
            Err(RateResolveError::LookupFailed(msg)) => {
                // 查询服务故障: 同样走兜底，但必须单独记录，便于诊断
                tracing::warn!(error = %msg, "矩阵查询失败，转固定价兜底");
            }
        }

        match self.flat_rate_repo.find_current_active()? {
            Some(setting) => Ok(PriceResolution {
                price_per_liter: setting.rate_per_liter,
                source: RateSource::FlatRate,
                effective_from: None,
            }),
            None => Err(ApiError::PriceUnresolved(format!(
                "矩阵未命中 (species={}, fat={}, snf={}) 且无激活固定价",
                query.species, query.fat, query.snf
            ))),
        }
    }
}
