// ==========================================
// 礼物交换抽签系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod pairing;
pub mod participant;
pub mod types;

// 重导出核心类型
pub use pairing::{Assignment, HistoryMap, OpenStat, Pairing, RevealRecord, StoredPairing};
pub use participant::{NewParticipant, Participant, ParticipantRecord};
pub use types::{DrawMode, GroupTag, ParticipantId, Round};
