// ==========================================
// 礼物交换抽签系统 - 引擎层
// ==========================================
// 职责: 分配引擎（纯计算）+ 抽签会话（编排历史/提交/揭晓）
// 红线: Engine 不拼 SQL, 所有否决必须可追溯到具体规则
// ==========================================

pub mod assignment;
pub mod error;
pub mod exclusion;
pub mod ports;
pub mod session;
pub mod validation;

// 重导出核心引擎
pub use assignment::{AssignmentEngine, SearchStats};
pub use error::{DeliveryError, Infeasible, SessionError};
pub use exclusion::{ExclusionRule, ExclusionRules};
pub use ports::{CommitSink, HistoryStore, NotificationSink};
pub use session::{reveal_records, PairingSession};
pub use validation::{has_dominant_group, largest_group, validate_roster, MIN_PARTICIPANTS};
