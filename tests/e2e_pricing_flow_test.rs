// ==========================================
// 端到端定价流程测试
// 链路: 矩阵导入 → 精确匹配 → 固定价兜底 → 显式无价错误
// ==========================================

use std::io::Write;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dairy_farm_ops::api::{ApiError, MilkRateApi};
use dairy_farm_ops::domain::rate::{FlatRateSetting, RateQuery};
use dairy_farm_ops::domain::types::{RateSource, Species};
use dairy_farm_ops::importer::RateMatrixImporter;
use dairy_farm_ops::repository::{FlatRateRepository, RateMatrixRepository};
use rusqlite::Connection;
use tempfile::NamedTempFile;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

struct TestEnv {
    matrix_repo: Arc<RateMatrixRepository>,
    flat_rate_repo: Arc<FlatRateRepository>,
    api: MilkRateApi,
}

fn setup_env() -> TestEnv {
    let conn = Arc::new(Mutex::new(Connection::open_in_memory().unwrap()));
    let matrix_repo = Arc::new(RateMatrixRepository::from_connection(conn.clone()).unwrap());
    let flat_rate_repo = Arc::new(FlatRateRepository::from_connection(conn).unwrap());
    let api = MilkRateApi::new(matrix_repo.clone(), flat_rate_repo.clone());
    TestEnv {
        matrix_repo,
        flat_rate_repo,
        api,
    }
}

fn import_default_matrix(env: &TestEnv) {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "FAT/SNF,8.0,8.5\n3.5,40.0,41.5\n4.0,43.0,45.0\n").unwrap();

    RateMatrixImporter::new()
        .import_file(&env.matrix_repo, file.path(), Species::Cow, date(2024, 1, 1))
        .unwrap();
}

#[test]
fn test_full_flow_matrix_hit() {
    let env = setup_env();
    import_default_matrix(&env);

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolution = env.api.resolve_price(&query).unwrap();

    assert_eq!(resolution.price_per_liter, 45.0);
    assert_eq!(resolution.source, RateSource::Matrix);
    assert_eq!(resolution.effective_from, Some(date(2024, 1, 1)));
}

#[test]
fn test_full_flow_miss_then_flat_fallback() {
    let env = setup_env();
    import_default_matrix(&env);
    env.flat_rate_repo
        .insert(&FlatRateSetting::new(30.0, date(2024, 1, 1), true))
        .unwrap();

    // 4.1 不在网格上 → 固定价兜底
    let query = RateQuery::new(Species::Cow, 4.1, 8.5, Some(date(2024, 6, 1)));
    let resolution = env.api.resolve_price(&query).unwrap();

    assert_eq!(resolution.price_per_liter, 30.0);
    assert_eq!(resolution.source, RateSource::FlatRate);
    assert_eq!(resolution.effective_from, None);
}

#[test]
fn test_full_flow_unresolved_is_explicit() {
    let env = setup_env();
    import_default_matrix(&env);

    // 未命中且无激活固定价: 显式报错，绝不返回 0 价
    let query = RateQuery::new(Species::Buffalo, 4.0, 8.5, Some(date(2024, 6, 1)));
    let result = env.api.resolve_price(&query);

    match result {
        Err(ApiError::PriceUnresolved(msg)) => {
            assert!(msg.contains("BUFFALO"));
        }
        other => panic!("Expected PriceUnresolved, got {:?}", other),
    }
}

#[test]
fn test_full_flow_newer_flat_rate_replaces_older() {
    let env = setup_env();

    let older = FlatRateSetting::new(28.0, date(2023, 1, 1), true);
    env.flat_rate_repo.insert(&older).unwrap();

    let mut newer = FlatRateSetting::new(32.0, date(2023, 6, 1), true);
    newer.created_at = older.created_at + chrono::Duration::seconds(10);
    env.flat_rate_repo.insert(&newer).unwrap();

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolution = env.api.resolve_price(&query).unwrap();

    // 激活条目中创建时间最新者生效
    assert_eq!(resolution.price_per_liter, 32.0);
    assert_eq!(resolution.source, RateSource::FlatRate);
}

#[test]
fn test_full_flow_future_effective_matrix_not_used() {
    let env = setup_env();
    env.flat_rate_repo
        .insert(&FlatRateSetting::new(30.0, date(2024, 1, 1), true))
        .unwrap();

    // 矩阵仅有未来生效的条目: as_of 之前应走兜底
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(file, "FAT/SNF,8.5\n4.0,50.0\n").unwrap();
    RateMatrixImporter::new()
        .import_file(&env.matrix_repo, file.path(), Species::Cow, date(2025, 1, 1))
        .unwrap();

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolution = env.api.resolve_price(&query).unwrap();
    assert_eq!(resolution.source, RateSource::FlatRate);

    // 生效日到达后改走矩阵
    let query_after = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2025, 2, 1)));
    let resolution_after = env.api.resolve_price(&query_after).unwrap();
    assert_eq!(resolution_after.source, RateSource::Matrix);
    assert_eq!(resolution_after.price_per_liter, 50.0);
}
