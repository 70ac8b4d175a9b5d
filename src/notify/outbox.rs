// ==========================================
// 礼物交换抽签系统 - 发件箱投递
// ==========================================
// 职责: NotificationSink 的文件实现，每条消息写出一个 JSON 文件
// 边界: 外部邮件中继负责扫描发件箱并实际发送
// 写出: 先写 .tmp 再 rename，中继不会读到半截文件
// ==========================================

use crate::config::DrawConfigReader;
use crate::domain::{RevealRecord, Round};
use crate::engine::error::DeliveryError;
use crate::engine::ports::NotificationSink;
use crate::notify::render::{
    render_master_list, render_reveal, render_test_message, OutboundMessage, RenderContext,
};
use crate::repository::RepositoryResult;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use uuid::Uuid;

// ==========================================
// OutboxNotifier - 发件箱投递器
// ==========================================
pub struct OutboxNotifier {
    dir: PathBuf,
    ctx: RenderContext,
    admin_email: Option<String>,
}

impl OutboxNotifier {
    /// # 参数
    /// - dir: 发件箱目录（不存在时首次投递自动创建）
    /// - ctx: 渲染上下文
    /// - admin_email: 汇总名单收件人
    pub fn new(dir: impl Into<PathBuf>, ctx: RenderContext, admin_email: Option<String>) -> Self {
        Self {
            dir: dir.into(),
            ctx,
            admin_email,
        }
    }

    /// 按当前配置构造（发件箱目录、发件人、管理员地址）
    pub fn from_config(config: &dyn DrawConfigReader) -> RepositoryResult<Self> {
        let ctx = RenderContext {
            base_url: config.base_url()?,
            from_email: config.from_email()?,
            from_name: config.from_name()?,
        };
        let dir = config.outbox_dir()?;
        debug!(outbox = %dir.display(), "发件箱目录");

        Ok(Self::new(dir, ctx, config.admin_email()?))
    }

    /// 写出一条自检消息，返回文件路径
    pub async fn send_test(&self, to: &str, round: Round) -> Result<PathBuf, DeliveryError> {
        let to = to.trim();
        if to.is_empty() {
            return Err(DeliveryError::Rejected("未指定自检收件地址".to_string()));
        }

        let message = render_test_message(&self.ctx, to, round);
        self.write_message(&message, "test").await
    }

    /// 写出单条消息，返回最终文件路径
    pub async fn write_message(&self, message: &OutboundMessage, tag: &str) -> Result<PathBuf, DeliveryError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let payload = serde_json::to_vec_pretty(message)?;
        let name = format!("{}-{}-{}", message.round, tag, Uuid::new_v4());
        let tmp_path = self.dir.join(format!("{}.tmp", name));
        let final_path = self.dir.join(format!("{}.json", name));

        tokio::fs::write(&tmp_path, payload).await?;
        tokio::fs::rename(&tmp_path, &final_path).await?;

        debug!(path = %final_path.display(), to = %message.to, "消息已写入发件箱");
        Ok(final_path)
    }
}

#[async_trait]
impl NotificationSink for OutboxNotifier {
    async fn deliver_reveal(&self, record: &RevealRecord) -> Result<(), DeliveryError> {
        let message = render_reveal(&self.ctx, record)?;
        self.write_message(&message, &format!("reveal-{}", record.giver.id))
            .await?;
        Ok(())
    }

    async fn deliver_report(&self, round: Round, records: &[RevealRecord]) -> Result<(), DeliveryError> {
        let admin = self
            .admin_email
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| DeliveryError::Rejected("未配置管理员地址".to_string()))?;

        let message = render_master_list(&self.ctx, admin, round, records);
        self.write_message(&message, "master").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Participant;
    use crate::notify::render::MessageKind;
    use std::path::Path;
    use tempfile::TempDir;

    fn ctx() -> RenderContext {
        RenderContext {
            base_url: "http://localhost:8080".to_string(),
            from_email: None,
            from_name: "Secret Santa Bot".to_string(),
        }
    }

    fn record() -> RevealRecord {
        RevealRecord {
            round: Round(2025),
            giver: Participant::new(1, "Ann", "Lee", 1, Some("ann@example.com")),
            receiver: Participant::new(2, "Bo", "Kim", 2, Some("bo@example.com")),
        }
    }

    fn read_messages(dir: &Path) -> Vec<OutboundMessage> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            assert_eq!(path.extension().and_then(|e| e.to_str()), Some("json"));
            let bytes = std::fs::read(&path).unwrap();
            out.push(serde_json::from_slice(&bytes).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_reveal_written_as_json() {
        let tmp = TempDir::new().unwrap();
        let outbox = tmp.path().join("outbox");
        let notifier = OutboxNotifier::new(&outbox, ctx(), None);

        notifier.deliver_reveal(&record()).await.unwrap();

        let messages = read_messages(&outbox);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Reveal);
        assert_eq!(messages[0].to, "ann@example.com");
    }

    #[tokio::test]
    async fn test_report_requires_admin() {
        let tmp = TempDir::new().unwrap();
        let without = OutboxNotifier::new(tmp.path(), ctx(), None);
        let err = without.deliver_report(Round(2025), &[record()]).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected(_)));

        let with = OutboxNotifier::new(tmp.path(), ctx(), Some("admin@example.com".to_string()));
        with.deliver_report(Round(2025), &[record()]).await.unwrap();

        let messages = read_messages(tmp.path());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::MasterList);
        assert_eq!(messages[0].to, "admin@example.com");
    }

    #[tokio::test]
    async fn test_send_test_writes_one_message() {
        let tmp = TempDir::new().unwrap();
        let notifier = OutboxNotifier::new(tmp.path(), ctx(), None);

        let path = notifier.send_test(" ops@example.com ", Round(2025)).await.unwrap();
        assert!(path.starts_with(tmp.path()));

        let messages = read_messages(tmp.path());
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, MessageKind::Test);
        assert_eq!(messages[0].to, "ops@example.com");

        let err = notifier.send_test("  ", Round(2025)).await.unwrap_err();
        assert!(matches!(err, DeliveryError::Rejected(_)));
        assert_eq!(read_messages(tmp.path()).len(), 1);
    }
}
