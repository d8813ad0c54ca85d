// ==========================================
// 奶牛场运营决策支持系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod breeding;
pub mod rate;
pub mod types;

// 重导出核心类型
pub use breeding::{parse_date_lenient, BreedingRecord, RawBreedingRecord};
pub use rate::{
    normalize_component, FlatRateSetting, RateMatrixEntry, RateQuery, ResolvedRate,
};
pub use types::{BreedingStatus, RateSource, Species};
