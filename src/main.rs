// ==========================================
// 奶牛场运营决策支持系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统
// 说明: 库为主要交付形态；本入口做启动自检（建表 + 数据概况）
// ==========================================

use dairy_farm_ops::config::ConfigManager;
use dairy_farm_ops::db::get_default_db_path;
use dairy_farm_ops::domain::types::Species;
use dairy_farm_ops::repository::{FlatRateRepository, RateMatrixRepository};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志系统
    dairy_farm_ops::logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 决策支持系统", dairy_farm_ops::APP_NAME);
    tracing::info!("系统版本: {}", dairy_farm_ops::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    tracing::info!("使用数据库: {}", db_path);

    // 启动自检: 建表并报告当前数据概况
    let matrix_repo = RateMatrixRepository::new(&db_path)?;
    let cow_entries = matrix_repo.list_by_species(Species::Cow)?.len();
    let buffalo_entries = matrix_repo.list_by_species(Species::Buffalo)?.len();
    tracing::info!(cow_entries, buffalo_entries, "奶价矩阵条目概况");

    let flat_rate_repo = FlatRateRepository::new(&db_path)?;
    match flat_rate_repo.find_current_active()? {
        Some(setting) => {
            tracing::info!(rate_per_liter = setting.rate_per_liter, "当前激活固定价");
        }
        None => {
            tracing::warn!("无激活固定价: 矩阵未命中时价格将无法解析");
        }
    }

    let config = ConfigManager::new(&db_path)?;
    let close_up_threshold_days = config.get_close_up_threshold_days()?;
    let pd_interval_days = config.get_pd_interval_days()?;
    tracing::info!(close_up_threshold_days, pd_interval_days, "牛群排序阈值配置");

    tracing::info!("启动自检完成");
    Ok(())
}
