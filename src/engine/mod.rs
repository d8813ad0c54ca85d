// ==========================================
// 奶牛场运营决策支持系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: 引擎无状态、无 I/O;所有规则可输出 reason
// ==========================================

pub mod herd_priority;
pub mod rate_resolver;

// 重导出核心引擎
pub use herd_priority::{
    HerdPrioritySorter, DEFAULT_CLOSE_UP_DAYS, DEFAULT_PD_INTERVAL_DAYS,
    MISSING_DAYS_SENTINEL, MISSING_SERVICE_SENTINEL,
};
pub use rate_resolver::{
    FlatRateFallback, RateMatrixLookup, RateResolveError, RateResolveResult, RateResolver,
};
