// ==========================================
// 奶牛场运营决策支持系统 - 奶价矩阵导入器
// ==========================================
// 职责: 原始网格 → 矩阵条目 → 批量 upsert
// 网格约定:
// - 第 0 行从第 1 列起为 SNF 轴刻度
// - 第 0 列从第 1 行起为脂肪轴刻度
// - 轴扫描遇到首个非数值/空单元格即停止
// - 交叉格为价格；非数值/空的交叉格跳过并计数（允许稀疏）
// ==========================================

use crate::domain::rate::{normalize_component, RateMatrixEntry};
use crate::domain::types::Species;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::grid_parser::{RawGrid, UniversalGridParser};
use crate::repository::RateMatrixRepository;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::instrument;

// ==========================================
// ImportOutcome - 导入结果统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub cells_parsed: usize,     // 成功解析的价格格数
    pub upserted: usize,         // 实际写入（插入或更新）的条目数
    pub skipped_cells: usize,    // 跳过的非数值/空交叉格数
}

// ==========================================
// RateMatrixImporter - 矩阵导入器
// ==========================================
pub struct RateMatrixImporter;

impl RateMatrixImporter {
    pub fn new() -> Self {
        Self
    }

    /// 从文件导入矩阵并写入数据库
    #[instrument(skip(self, repo), fields(species = %species, effective_from = %effective_from))]
    pub fn import_file(
        &self,
        repo: &RateMatrixRepository,
        file_path: &Path,
        species: Species,
        effective_from: NaiveDate,
    ) -> ImportResult<ImportOutcome> {
        let grid = UniversalGridParser.parse(file_path)?;
        let (entries, skipped_cells) = self.parse_grid(&grid, species, effective_from)?;

        let cells_parsed = entries.len();
        let upserted = repo.upsert_batch(&entries)?;

        tracing::info!(
            cells_parsed,
            upserted,
            skipped_cells,
            "奶价矩阵导入完成"
        );

        Ok(ImportOutcome {
            cells_parsed,
            upserted,
            skipped_cells,
        })
    }

    /// 将原始网格解释为矩阵条目
    ///
    /// 返回 (条目列表, 跳过的交叉格数)
    pub fn parse_grid(
        &self,
        grid: &RawGrid,
        species: Species,
        effective_from: NaiveDate,
    ) -> ImportResult<(Vec<RateMatrixEntry>, usize)> {
        if grid.len() < 2 {
            return Err(ImportError::EmptyGrid);
        }

        // SNF 轴: 表头行从第 1 列起，遇非数值即停
        let snf_axis = Self::scan_axis(grid[0].iter().skip(1));
        if snf_axis.is_empty() {
            return Err(ImportError::InvalidAxis {
                axis: "SNF".to_string(),
                message: "表头行第 1 列起未找到数值刻度".to_string(),
            });
        }

        // 脂肪轴: 第 0 列从第 1 行起，遇非数值即停
        let fat_axis = Self::scan_axis(grid.iter().skip(1).map(|row| {
            row.first().map(String::as_str).unwrap_or("")
        }));
        if fat_axis.is_empty() {
            return Err(ImportError::InvalidAxis {
                axis: "脂肪".to_string(),
                message: "第 0 列第 1 行起未找到数值刻度".to_string(),
            });
        }

        let mut entries = Vec::with_capacity(fat_axis.len() * snf_axis.len());
        let mut skipped_cells = 0usize;

        for (fat_idx, &fat) in fat_axis.iter().enumerate() {
            let row = &grid[fat_idx + 1];
            for (snf_idx, &snf) in snf_axis.iter().enumerate() {
                let cell = row.get(snf_idx + 1).map(String::as_str).unwrap_or("");
                match cell.parse::<f64>() {
                    Ok(rate) if rate.is_finite() => {
                        entries.push(RateMatrixEntry::new(
                            species,
                            fat,
                            snf,
                            rate,
                            effective_from,
                        ));
                    }
                    _ => {
                        // 稀疏格: 跳过并计数，不中断整表导入
                        skipped_cells += 1;
                    }
                }
            }
        }

        Ok((entries, skipped_cells))
    }

    /// 沿一条轴扫描数值刻度，遇到首个非数值/空单元格停止
    fn scan_axis<S, I>(cells: I) -> Vec<f64>
    where
        S: AsRef<str>,
        I: Iterator<Item = S>,
    {
        let mut axis = Vec::new();
        for cell in cells {
            match cell.as_ref().parse::<f64>() {
                Ok(v) if v.is_finite() => axis.push(normalize_component(v)),
                _ => break,
            }
        }
        axis
    }
}

impl Default for RateMatrixImporter {
    fn default() -> Self {
        Self::new()
    }
}
