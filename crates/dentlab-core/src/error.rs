//! 错误定义模块

use thiserror::Error;

/// 技工所系统统一错误类型
#[derive(Error, Debug)]
pub enum LabError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("数据库错误: {0}")]
    Database(String),

    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("验证错误: {0}")]
    Validation(String),

    #[error("资源冲突: {0}")]
    Conflict(String),

    #[error("系统内部错误: {0}")]
    Internal(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("无效状态转换: 从 {from} 经 {event}")]
    InvalidStateTransition { from: String, event: String },
}

impl LabError {
    /// 病例不存在
    pub fn case_not_found(case_id: &str) -> Self {
        LabError::NotFound(format!("case {}", case_id))
    }

    /// 员工不存在
    pub fn staff_not_found(staff_id: &str) -> Self {
        LabError::NotFound(format!("staff {}", staff_id))
    }
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for LabError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => LabError::NotFound("row".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                LabError::Conflict(db_err.message().to_string())
            }
            // 日志行引用的病例已被删除
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                LabError::NotFound(db_err.message().to_string())
            }
            other => LabError::Database(other.to_string()),
        }
    }
}

/// 技工所系统统一结果类型
pub type Result<T> = std::result::Result<T, LabError>;

#[cfg(all(test, feature = "database"))]
mod tests {
    use super::*;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::error::Error as StdError;
    use std::fmt;

    #[derive(Debug)]
    struct ConstraintError(ErrorKind);

    impl fmt::Display for ConstraintError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "constraint violated: {:?}", self.0)
        }
    }

    impl StdError for ConstraintError {}

    impl DatabaseError for ConstraintError {
        fn message(&self) -> &str {
            "constraint violated"
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            match self.0 {
                ErrorKind::UniqueViolation => ErrorKind::UniqueViolation,
                ErrorKind::ForeignKeyViolation => ErrorKind::ForeignKeyViolation,
                _ => ErrorKind::Other,
            }
        }
    }

    fn db_error(kind: ErrorKind) -> sqlx::Error {
        sqlx::Error::Database(Box::new(ConstraintError(kind)))
    }

    #[test]
    fn test_sqlx_constraint_mapping() {
        assert!(matches!(
            LabError::from(db_error(ErrorKind::UniqueViolation)),
            LabError::Conflict(_)
        ));
        assert!(matches!(
            LabError::from(db_error(ErrorKind::ForeignKeyViolation)),
            LabError::NotFound(_)
        ));
        assert!(matches!(
            LabError::from(db_error(ErrorKind::Other)),
            LabError::Database(_)
        ));
        assert!(matches!(LabError::from(sqlx::Error::RowNotFound), LabError::NotFound(_)));
    }
}
