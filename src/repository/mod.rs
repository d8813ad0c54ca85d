// ==========================================
// 奶牛场运营决策支持系统 - 仓储层
// ==========================================

pub mod error;
pub mod flat_rate_repo;
pub mod rate_matrix_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use flat_rate_repo::FlatRateRepository;
pub use rate_matrix_repo::RateMatrixRepository;
