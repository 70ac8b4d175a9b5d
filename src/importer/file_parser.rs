// ==========================================
// 礼物交换抽签系统 - 名单文件解析器
// ==========================================
// 支持: Excel (.xlsx) / CSV (.csv)
// 输出: 原始行（单元格已 trim），表头识别交给导入器
// ==========================================

use crate::importer::error::ImportError;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// 原始行: (1 基行号, 单元格)
pub type RawRow = (usize, Vec<String>);

// ==========================================
// RosterFileParser Trait
// ==========================================
pub trait RosterFileParser: Send + Sync {
    /// 解析文件为原始行（完全空白的行已跳过）
    fn parse_rows(&self, file_path: &Path) -> Result<Vec<RawRow>, ImportError>;
}

/// 按扩展名选择解析器
pub fn parser_for(path: &Path) -> Result<Box<dyn RosterFileParser>, ImportError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "csv" => Ok(Box::new(CsvParser)),
        "xlsx" => Ok(Box::new(ExcelParser)),
        other => Err(ImportError::UnsupportedFormat(other.to_string())),
    }
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl RosterFileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> Result<Vec<RawRow>, ImportError> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 表头由导入器识别，这里一律按数据读取
        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if is_blank(&cells) {
                continue;
            }

            let line = record.position().map(|p| p.line() as usize).unwrap_or(idx + 1);
            rows.push((line, cells));
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl RosterFileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> Result<Vec<RawRow>, ImportError> {
        // 检查文件存在
        if !file_path.exists() {
            return Err(ImportError::FileNotFound(file_path.display().to_string()));
        }

        // 打开 Excel 文件
        let mut workbook: Xlsx<_> = open_workbook(file_path)
            .map_err(|e: calamine::XlsxError| ImportError::ExcelParseError(e.to_string()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        Ok(collect_rows(&range))
    }
}

/// 工作表区域 → 原始行
///
/// # 说明
/// - 已用区域不一定从 A1 开始，行号按区域起始行偏移，与表格软件中显示的行号一致
fn collect_rows(range: &Range<Data>) -> Vec<RawRow> {
    let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

    let mut rows = Vec::new();
    for (idx, data_row) in range.rows().enumerate() {
        let cells: Vec<String> = data_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        if is_blank(&cells) {
            continue;
        }

        rows.push((first_row + idx + 1, cells));
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_rows_trimmed_and_blank_lines_skipped() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "first_name, last_name ,email,family_unit").unwrap();
        writeln!(file).unwrap();
        writeln!(file, " Ann ,Lee,ann@example.com,1").unwrap();
        writeln!(file, ",,,").unwrap();
        writeln!(file, "Bo,Kim,bo@example.com").unwrap();
        file.flush().unwrap();

        let rows = CsvParser.parse_rows(file.path()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].1[1], "last_name");
        assert_eq!(rows[1].1[0], "Ann");
        // 行长度不一致也接受
        assert_eq!(rows[2].1.len(), 3);
        // 行号保留原文件位置
        assert!(rows[2].0 > rows[1].0);
    }

    #[test]
    fn test_sheet_line_numbers_follow_used_range() {
        // 数据从 B3 开始（0 基: 行 2, 列 1）
        let mut range: Range<Data> = Range::new((2, 1), (4, 2));
        range.set_value((2, 1), Data::String("first_name".to_string()));
        range.set_value((2, 2), Data::String("email".to_string()));
        range.set_value((4, 1), Data::String(" Ann ".to_string()));
        range.set_value((4, 2), Data::String("ann@example.com".to_string()));

        let rows = collect_rows(&range);

        // 中间的空白行被跳过，行号仍按表格位置
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 3);
        assert_eq!(rows[1].0, 5);
        assert_eq!(rows[1].1, vec!["Ann".to_string(), "ann@example.com".to_string()]);
    }

    #[test]
    fn test_parser_for_extension() {
        assert!(parser_for(Path::new("roster.csv")).is_ok());
        assert!(parser_for(Path::new("roster.XLSX")).is_ok());
        assert!(matches!(
            parser_for(Path::new("roster.txt")),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = CsvParser.parse_rows(Path::new("/nonexistent/roster.csv")).unwrap_err();
        assert!(matches!(err, ImportError::FileNotFound(_)));
    }
}
