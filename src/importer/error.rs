// ==========================================
// 礼物交换抽签系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 行级校验失败不是错误（记为跳过），这里只有整批失败
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(#[from] csv::Error),

    // ===== 数据库错误 =====
    #[error("名单落库失败: {0}")]
    Repository(#[from] RepositoryError),
}
