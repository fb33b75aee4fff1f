//! # 牙科技工所病例流转管理
//!
//! 聚合工作区各模块，供演示程序和外部集成使用。

pub use dentlab_core;
pub use dentlab_database;
pub use dentlab_workflow;
