// ==========================================
// 奶牛场运营决策支持系统 - API层
// ==========================================

pub mod error;
pub mod herd_api;
pub mod milk_rate_api;

pub use error::{ApiError, ApiResult};
pub use herd_api::{HerdApi, WorklistItem};
pub use milk_rate_api::{MilkRateApi, PriceResolution};
