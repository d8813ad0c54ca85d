// ==========================================
// 奶牛场运营决策支持系统 - 网格文件解析器
// ==========================================
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// 输出: 原始矩形网格 Vec<Vec<String>>（逐格 trim，不做业务解释）
// ==========================================
// 价格表是"坐标网格"而非"列表"：表头行是 SNF 轴刻度，
// 首列是脂肪轴刻度。因此这里按位置保留所有单元格，
// 不做按表头名的字段映射。
// ==========================================

use crate::importer::error::ImportError;
use calamine::{open_workbook, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

pub type RawGrid = Vec<Vec<String>>;

// ==========================================
// CSV 网格解析
// ==========================================
pub struct CsvGridParser;

impl CsvGridParser {
    pub fn parse(&self, file_path: &Path) -> Result<RawGrid, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头行是轴刻度，按数据行保留
            .flexible(true)
            .from_reader(file);

        let mut grid = Vec::new();
        for result in reader.records() {
            let record = result?;
            let row: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();
            grid.push(row);
        }

        Ok(grid)
    }
}

// ==========================================
// Excel 网格解析
// ==========================================
pub struct ExcelGridParser;

impl ExcelGridParser {
    pub fn parse(&self, file_path: &Path) -> Result<RawGrid, ImportError> {
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(
                file_path.display().to_string(),
            ));
        }

        let ext = file_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let range = match ext.as_str() {
            "xlsx" => {
                let mut workbook: Xlsx<_> = open_workbook(file_path)
                    .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

                let sheet_name = Self::first_sheet_name(workbook.sheet_names())?;
                workbook
                    .worksheet_range(&sheet_name)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?
            }
            "xls" => {
                let mut workbook: Xls<_> = open_workbook(file_path)
                    .map_err(|e: calamine::XlsError| ImportError::ExcelParseError(e.to_string()))?;

                let sheet_name = Self::first_sheet_name(workbook.sheet_names())?;
                workbook
                    .worksheet_range(&sheet_name)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?
            }
            _ => return Err(ImportError::UnsupportedFormat(ext)),
        };

        let grid = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string().trim().to_string())
                    .collect()
            })
            .collect();

        Ok(grid)
    }

    fn first_sheet_name(sheet_names: Vec<String>) -> Result<String, ImportError> {
        sheet_names.into_iter().next().ok_or_else(|| {
            ImportError::ExcelParseError("Excel 文件无工作表".to_string())
        })
    }
}

// ==========================================
// 通用网格解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalGridParser;

impl UniversalGridParser {
    pub fn parse<P: AsRef<Path>>(&self, file_path: P) -> Result<RawGrid, ImportError> {
        let path = file_path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => CsvGridParser.parse(path),
            "xlsx" | "xls" => ExcelGridParser.parse(path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
