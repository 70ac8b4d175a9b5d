// ==========================================
// 礼物交换抽签系统 - 导入层
// ==========================================
// 职责: 外部名单导入，生成参与者记录
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod roster_importer;

pub use error::ImportError;
pub use file_parser::{parser_for, CsvParser, ExcelParser, RawRow, RosterFileParser};
pub use roster_importer::{
    is_valid_email, ColumnMap, ImportSummary, RosterImporter, RowOutcome, RowStatus, SkipReason,
};
