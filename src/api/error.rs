// ==========================================
// 礼物交换抽签系统 - API层错误类型
// ==========================================
// 职责: 汇总各层错误，转换为用户友好的错误消息
// 退出码: 0 成功 / 2 无可行配对 / 3 名单校验失败 / 1 其他
// ==========================================

use crate::engine::error::{DeliveryError, SessionError};
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 抽签结果
    // ==========================================
    /// 无可行配对（正常结果，可放宽约束后重试）
    #[error("无可行配对: {0}")]
    Infeasible(String),

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    // ==========================================
    // 通知错误
    // ==========================================
    #[error("通知投递失败: {0}")]
    DeliveryError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    pub fn is_infeasible(&self) -> bool {
        matches!(self, ApiError::Infeasible(_))
    }

    /// 命令行退出码
    pub fn exit_code(&self) -> i32 {
        match self {
            ApiError::Infeasible(_) => 2,
            ApiError::ValidationError(_) | ApiError::InvalidInput(_) => 3,
            _ => 1,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 SessionError 转换
// ==========================================
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(msg) => ApiError::ValidationError(msg),
            e @ SessionError::Infeasible { .. } => ApiError::Infeasible(e.to_string()),
            e @ SessionError::HistoryLoad { .. } => ApiError::DatabaseError(e.to_string()),
            e @ SessionError::Persistence { .. } => ApiError::DatabaseTransactionError(e.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::Repository(e) => ApiError::from(e),
            ImportError::UnsupportedFormat(_) | ImportError::FileNotFound(_) => {
                ApiError::InvalidInput(err.to_string())
            }
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

// ==========================================
// 从 DeliveryError 转换
// ==========================================
impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        ApiError::DeliveryError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Round;
    use crate::engine::error::Infeasible;

    #[test]
    fn test_exit_codes() {
        let infeasible: ApiError = SessionError::Infeasible {
            round: Round(2025),
            cause: Infeasible { givers: 3, explored: 9 },
        }
        .into();
        assert!(infeasible.is_infeasible());
        assert_eq!(infeasible.exit_code(), 2);

        let validation: ApiError = SessionError::Validation("名单至少需要 2 人".to_string()).into();
        assert_eq!(validation.exit_code(), 3);

        let persistence: ApiError = SessionError::Persistence {
            round: Round(2025),
            source: RepositoryError::DatabaseTransactionError("locked".to_string()),
        }
        .into();
        assert!(!persistence.is_infeasible());
        assert_eq!(persistence.exit_code(), 1);
    }

    #[test]
    fn test_repository_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Participant".to_string(),
            id: "9".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(ref m) if m.contains("Participant")));
    }
}
