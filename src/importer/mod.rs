// ==========================================
// 奶牛场运营决策支持系统 - 导入层
// ==========================================

pub mod error;
pub mod grid_parser;
pub mod rate_matrix_importer;

pub use error::{ImportError, ImportResult};
pub use grid_parser::{CsvGridParser, ExcelGridParser, RawGrid, UniversalGridParser};
pub use rate_matrix_importer::{ImportOutcome, RateMatrixImporter};
