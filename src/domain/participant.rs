// ==========================================
// 礼物交换抽签系统 - 参与者实体
// ==========================================
// 一轮抽签期间不可变
// ==========================================

use crate::domain::types::{GroupTag, ParticipantId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Participant - 参与者
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub first_name: String,
    pub last_name: String,
    pub group: GroupTag,
    /// 联系地址（邮箱）；缺失时跳过投递
    pub email: Option<String>,
}

impl Participant {
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        group: i64,
        email: Option<&str>,
    ) -> Self {
        Self {
            id: ParticipantId(id),
            first_name: first_name.into(),
            last_name: last_name.into(),
            group: GroupTag(group),
            email: email.map(|e| e.to_string()),
        }
    }

    /// 展示名: "名 姓"（姓为空时只保留名）
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    /// 有效联系地址（去空白后非空）
    pub fn contact_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

// ==========================================
// NewParticipant - 待入库参与者（导入用）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipant {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub group: GroupTag,
}

// ==========================================
// ParticipantRecord - 带审计字段的入库记录
// ==========================================
#[derive(Debug, Clone)]
pub struct ParticipantRecord {
    pub participant: Participant,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let p = Participant::new(1, "Ada", "Lovelace", 1, None);
        assert_eq!(p.display_name(), "Ada Lovelace");

        let p = Participant::new(2, "Cher", "", 1, None);
        assert_eq!(p.display_name(), "Cher");
    }

    #[test]
    fn test_contact_address_blank_is_none() {
        let p = Participant::new(1, "A", "B", 1, Some("   "));
        assert_eq!(p.contact_address(), None);

        let p = Participant::new(1, "A", "B", 1, Some(" a@b.org "));
        assert_eq!(p.contact_address(), Some("a@b.org"));
    }
}
