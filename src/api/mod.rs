// ==========================================
// 礼物交换抽签系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行调用
// ==========================================

pub mod draw_api;
pub mod error;
pub mod tracking_api;

// 重导出核心类型
pub use draw_api::{
    CommittedDraw, DrawApi, DrawPreview, LiveDrawSummary, MasterListStatus, PairingView, TrialDraw,
};
pub use error::{ApiError, ApiResult};
pub use tracking_api::TrackingApi;
