//! # 技工所数据库模块
//!
//! 负责病例、员工、备注和附件的持久化，提供两种实现相同存储接口的后端：
//! - `MemoryStore`：进程内存储，用于开发和测试
//! - `DatabaseQueries`：基于PostgreSQL连接池的存储，流程和暂停记录以JSONB整体保存

pub mod connection;
pub mod memory;
pub mod models;
pub mod queries;

// 重新导出主要类型
pub use connection::DatabasePool;
pub use memory::MemoryStore;
pub use models::*;
pub use queries::DatabaseQueries;
