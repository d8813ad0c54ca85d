// ==========================================
// RateResolver 集成测试（仓储实现的查询契约）
// ==========================================

use chrono::NaiveDate;
use dairy_farm_ops::domain::rate::{RateMatrixEntry, RateQuery};
use dairy_farm_ops::domain::types::Species;
use dairy_farm_ops::engine::{RateResolveError, RateResolver};
use dairy_farm_ops::repository::RateMatrixRepository;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn setup_repo_with(entries: &[(Species, f64, f64, f64, NaiveDate)]) -> RateMatrixRepository {
    let repo = RateMatrixRepository::new(":memory:").unwrap();
    for (species, fat, snf, rate, from) in entries {
        repo.upsert(&RateMatrixEntry::new(*species, *fat, *snf, *rate, *from))
            .unwrap();
    }
    repo
}

#[test]
fn test_repo_backed_exact_hit() {
    let repo = setup_repo_with(&[(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1))]);
    let resolver = RateResolver::new();

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolved = resolver.resolve(&repo, &query).unwrap().unwrap();

    assert_eq!(resolved.rate, 45.0);
    assert_eq!(resolved.effective_from, date(2024, 1, 1));
}

#[test]
fn test_repo_backed_no_interpolation() {
    let repo = setup_repo_with(&[
        (Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1)),
        (Species::Cow, 4.2, 8.5, 46.0, date(2024, 1, 1)),
    ]);
    let resolver = RateResolver::new();

    // 4.1 位于两个网格点之间: 未命中，不取近邻
    let query = RateQuery::new(Species::Cow, 4.1, 8.5, Some(date(2024, 6, 1)));
    assert!(resolver.resolve(&repo, &query).unwrap().is_none());
}

#[test]
fn test_repo_backed_most_recent_effective_wins() {
    let repo = setup_repo_with(&[
        (Species::Cow, 4.0, 8.5, 42.0, date(2023, 1, 1)),
        (Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1)),
        (Species::Cow, 4.0, 8.5, 48.0, date(2024, 9, 1)),
    ]);
    let resolver = RateResolver::new();

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolved = resolver.resolve(&repo, &query).unwrap().unwrap();

    // 2024-09-01 的条目尚未生效
    assert_eq!(resolved.rate, 45.0);
}

#[test]
fn test_repo_backed_species_isolation() {
    let repo = setup_repo_with(&[(Species::Buffalo, 4.0, 8.5, 55.0, date(2024, 1, 1))]);
    let resolver = RateResolver::new();

    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    assert!(resolver.resolve(&repo, &query).unwrap().is_none());
}

#[test]
fn test_repo_backed_query_normalizes_components() {
    // 查询侧传入未规范化的成分值，应与写入侧同法规范后命中
    let repo = setup_repo_with(&[(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1))]);
    let resolver = RateResolver::new();

    let query = RateQuery::new(Species::Cow, 4.04, 8.49, Some(date(2024, 6, 1)));
    let resolved = resolver.resolve(&repo, &query).unwrap();
    assert!(resolved.is_some());
}

#[test]
fn test_repo_backed_invalid_input_loud() {
    let repo = setup_repo_with(&[(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1))]);
    let resolver = RateResolver::new();

    let query = RateQuery::new(Species::Cow, 0.0, 8.5, Some(date(2024, 6, 1)));
    let result = resolver.resolve(&repo, &query);
    assert!(matches!(result, Err(RateResolveError::InvalidInput(_))));
}

#[test]
fn test_reupload_upserts_same_cell() {
    let repo = setup_repo_with(&[(Species::Cow, 4.0, 8.5, 45.0, date(2024, 1, 1))]);

    // 同一 (species, fat, snf, effective_from) 重复上传: 更新价格而非新增
    repo.upsert(&RateMatrixEntry::new(
        Species::Cow,
        4.0,
        8.5,
        47.5,
        date(2024, 1, 1),
    ))
    .unwrap();

    let resolver = RateResolver::new();
    let query = RateQuery::new(Species::Cow, 4.0, 8.5, Some(date(2024, 6, 1)));
    let resolved = resolver.resolve(&repo, &query).unwrap().unwrap();
    assert_eq!(resolved.rate, 47.5);

    let all = repo.list_by_species(Species::Cow).unwrap();
    assert_eq!(all.len(), 1);
}
