// ==========================================
// 礼物交换抽签系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 约束分配引擎 + 抽签会话 (外部协作方只做 I/O)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分配引擎与抽签会话
pub mod engine;

// 导入层 - 名单文件
pub mod importer;

// 通知层 - 消息渲染与投递
pub mod notify;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口（试运行/正式抽签）
pub mod api;

// 应用层 - 装配与调度
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    Assignment, GroupTag, HistoryMap, Participant, ParticipantId, Pairing, RevealRecord, Round,
};

pub use engine::{AssignmentEngine, ExclusionRule, ExclusionRules, Infeasible, PairingSession, SessionError};

pub use api::{ApiError, DrawApi, TrackingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "礼物交换抽签系统";
