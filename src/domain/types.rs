// ==========================================
// 礼物交换抽签系统 - 领域类型定义
// ==========================================
// 值类型: 参与者ID / 分组标签 / 轮次
// 红线: 纯值类型，不含 I/O
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 参与者ID (Participant Id)
// ==========================================
// 与 participants.id 一一对应，不透明、唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub i64);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 分组标签 (Group Tag)
// ==========================================
// 家庭/户为单位的排除单元，不是层级结构
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupTag(pub i64);

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 轮次 (Round)
// ==========================================
// 以年份等标签全序排列，"上一轮" = label - 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Round(pub i32);

impl Round {
    /// 上一轮；标签已到下界时返回 None
    pub fn previous(self) -> Option<Round> {
        self.0.checked_sub(1).map(Round)
    }

    pub fn next(self) -> Option<Round> {
        self.0.checked_add(1).map(Round)
    }

    pub fn label(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ==========================================
// 运行模式 (Draw Mode)
// ==========================================
// 只属于调用方上下文，引擎不感知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DrawMode {
    Trial,      // 试运行：不落库、不发信
    CommitOnly, // 仅落库：不发信、不清打开计数（补录历史 / 重测某轮）
    Live,       // 正式：落库 + 通知
}

impl fmt::Display for DrawMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawMode::Trial => write!(f, "TRIAL"),
            DrawMode::CommitOnly => write!(f, "COMMIT_ONLY"),
            DrawMode::Live => write!(f, "LIVE"),
        }
    }
}
