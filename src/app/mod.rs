// ==========================================
// 礼物交换抽签系统 - 应用层
// ==========================================
// 职责: 组装共享状态，连接命令行与后端
// ==========================================

pub mod schedule;
pub mod state;

// 重导出
pub use schedule::{draw_day, should_run_scheduled};
pub use state::{get_default_db_path, AppState, DB_PATH_ENV};
