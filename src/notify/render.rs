// ==========================================
// 礼物交换抽签系统 - 通知渲染
// ==========================================
// 职责: 揭晓记录 → 待投递消息（HTML + 纯文本）
// 红线: 纯函数，不做 IO；所有用户输入的名字必须转义
// ==========================================

use crate::domain::{RevealRecord, Round};
use crate::engine::error::DeliveryError;
use serde::{Deserialize, Serialize};

/// 消息类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Reveal,
    MasterList,
    /// 投递链路自检
    Test,
}

/// 待投递消息（写入发件箱后由外部中继发送）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub kind: MessageKind,
    pub round: Round,
    pub from: Option<String>,
    pub from_name: String,
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// 渲染所需的上下文（来自配置）
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// 公开访问地址，末尾无 '/'
    pub base_url: String,
    pub from_email: Option<String>,
    pub from_name: String,
}

impl RenderContext {
    /// 打开追踪像素地址
    pub fn pixel_url(&self, record: &RevealRecord) -> String {
        format!(
            "{}/open?pid={}&round={}",
            self.base_url.trim_end_matches('/'),
            record.giver.id,
            record.round
        )
    }
}

/// HTML 转义
pub fn html_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 渲染给送礼人的揭晓消息
///
/// # 返回
/// - Err(DeliveryError::MissingAddress): 送礼人没有联系地址
pub fn render_reveal(ctx: &RenderContext, record: &RevealRecord) -> Result<OutboundMessage, DeliveryError> {
    let to = record
        .giver
        .contact_address()
        .ok_or(DeliveryError::MissingAddress(record.giver.id))?
        .to_string();

    let giver_name = html_escape(&record.giver.first_name);
    let receiver_name = html_escape(&record.receiver.display_name());
    let pixel_url = html_escape(&ctx.pixel_url(record));
    let round = record.round;

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Secret Santa {round}</title>
</head>
<body style="margin:0;padding:0;background:#0b1b33;font-family:Arial,Helvetica,sans-serif;">
  <div style="max-width:600px;margin:0 auto;padding:20px;">
    <div style="background:#b30000;border-radius:12px;padding:20px;text-align:center;color:#ffffff;">
      <h1 style="font-size:32px;margin:0 0 10px;">Secret Santa {round}</h1>
      <p style="font-size:16px;margin:10px 0 20px;">Hi <strong>{giver_name}</strong>!</p>
      <div style="background:#ffffff;border-radius:8px;padding:16px;color:#222222;">
        <p style="font-size:14px;margin:0 0 10px;">Your Secret Santa person is:</p>
        <div style="font-size:30px;font-weight:bold;color:#b30000;">{receiver_name}</div>
        <p style="font-size:13px;color:#666666;">Please keep this a secret!</p>
      </div>
      <img src="{pixel_url}" alt="" width="1" height="1" style="display:none;">
    </div>
  </div>
</body>
</html>
"#
    );

    let text_body = format!(
        "Hi {},\n\nYour Secret Santa person for {} is {}.\n\nPlease keep this a secret!",
        record.giver.first_name,
        round,
        record.receiver.display_name()
    );

    Ok(OutboundMessage {
        kind: MessageKind::Reveal,
        round,
        from: ctx.from_email.clone(),
        from_name: ctx.from_name.clone(),
        to,
        to_name: record.giver.display_name(),
        subject: format!("Your Secret Santa Person for {}", round),
        html_body,
        text_body,
    })
}

/// 渲染发给管理员的汇总名单（保持揭晓记录顺序）
pub fn render_master_list(
    ctx: &RenderContext,
    admin_email: &str,
    round: Round,
    records: &[RevealRecord],
) -> OutboundMessage {
    let rows_html: String = records
        .iter()
        .map(|r| {
            format!(
                "      <tr><td style=\"padding:6px 12px;\">{}</td><td style=\"padding:6px 12px;\">{}</td></tr>\n",
                html_escape(&r.giver.display_name()),
                html_escape(&r.receiver.display_name())
            )
        })
        .collect();

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Secret Santa Master List {round}</title>
</head>
<body style="font-family:Arial,Helvetica,sans-serif;background:#f5f5f5;padding:20px;">
  <h2>Secret Santa Master List - {round}</h2>
  <table style="border-collapse:collapse;background:#ffffff;">
    <thead>
      <tr style="background:#006600;color:#ffffff;"><th style="padding:6px 12px;">Giver</th><th style="padding:6px 12px;">Receiver</th></tr>
    </thead>
    <tbody>
{rows_html}    </tbody>
  </table>
</body>
</html>
"#
    );

    let lines: Vec<String> = records
        .iter()
        .map(|r| format!("{} -> {}", r.giver.display_name(), r.receiver.display_name()))
        .collect();
    let text_body = format!("Secret Santa {} master list:\n\n{}", round, lines.join("\n"));

    OutboundMessage {
        kind: MessageKind::MasterList,
        round,
        from: ctx.from_email.clone(),
        from_name: ctx.from_name.clone(),
        to: admin_email.to_string(),
        to_name: "Admin".to_string(),
        subject: format!("Secret Santa Pairings for {}", round),
        html_body,
        text_body,
    }
}

/// 渲染投递链路自检消息（不含任何配对信息）
pub fn render_test_message(ctx: &RenderContext, to: &str, round: Round) -> OutboundMessage {
    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>Secret Santa Delivery Test</title>
</head>
<body style="margin:0;padding:0;background:#0b1b33;font-family:Arial,Helvetica,sans-serif;">
  <div style="max-width:600px;margin:0 auto;padding:20px;">
    <div style="background:#b30000;border-radius:12px;padding:20px;text-align:center;color:#ffffff;">
      <h1 style="font-size:32px;margin:0 0 10px;">Secret Santa Delivery Test</h1>
      <p style="font-size:16px;margin:10px 0 20px;">This is a <strong>test message</strong> for {round}.</p>
      <div style="background:#ffffff;border-radius:8px;padding:16px;color:#222222;">
        <p style="font-size:14px;margin:0;">If you can read this, mail delivery is working.</p>
      </div>
    </div>
  </div>
</body>
</html>
"#
    );

    OutboundMessage {
        kind: MessageKind::Test,
        round,
        from: ctx.from_email.clone(),
        from_name: ctx.from_name.clone(),
        to: to.to_string(),
        to_name: to.to_string(),
        subject: "Secret Santa Delivery Test".to_string(),
        html_body,
        text_body: "Secret Santa delivery test.\n\nIf you received this, mail delivery is working.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Participant;

    fn ctx() -> RenderContext {
        RenderContext {
            base_url: "https://santa.example.com".to_string(),
            from_email: Some("santa@example.com".to_string()),
            from_name: "Secret Santa Bot".to_string(),
        }
    }

    fn record(giver_email: Option<&str>) -> RevealRecord {
        RevealRecord {
            round: Round(2025),
            giver: Participant::new(7, "Ann", "Lee", 1, giver_email),
            receiver: Participant::new(8, "Bo <b>", "O'Neil", 2, Some("bo@example.com")),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_reveal_contents() {
        let msg = render_reveal(&ctx(), &record(Some("ann@example.com"))).unwrap();

        assert_eq!(msg.kind, MessageKind::Reveal);
        assert_eq!(msg.to, "ann@example.com");
        assert_eq!(msg.to_name, "Ann Lee");
        assert!(msg.subject.contains("2025"));
        // 名字转义后出现在 HTML 中，原文出现在纯文本中
        assert!(msg.html_body.contains("Bo &lt;b&gt; O&#39;Neil"));
        assert!(!msg.html_body.contains("Bo <b>"));
        assert!(msg.text_body.contains("Bo <b> O'Neil"));
        assert!(msg
            .html_body
            .contains("https://santa.example.com/open?pid=7&amp;round=2025"));
    }

    #[test]
    fn test_reveal_missing_address() {
        let err = render_reveal(&ctx(), &record(None)).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingAddress(id) if id.0 == 7));

        let err = render_reveal(&ctx(), &record(Some("   "))).unwrap_err();
        assert!(matches!(err, DeliveryError::MissingAddress(_)));
    }

    #[test]
    fn test_master_list_keeps_order() {
        let first = record(Some("ann@example.com"));
        let second = RevealRecord {
            round: Round(2025),
            giver: first.receiver.clone(),
            receiver: first.giver.clone(),
        };
        let msg = render_master_list(&ctx(), "admin@example.com", Round(2025), &[first, second]);

        assert_eq!(msg.kind, MessageKind::MasterList);
        assert_eq!(msg.to, "admin@example.com");
        let lines: Vec<&str> = msg.text_body.lines().skip(2).collect();
        assert_eq!(lines, vec!["Ann Lee -> Bo <b> O'Neil", "Bo <b> O'Neil -> Ann Lee"]);
    }

    #[test]
    fn test_test_message_has_no_pairing() {
        let msg = render_test_message(&ctx(), "ops@example.com", Round(2025));

        assert_eq!(msg.kind, MessageKind::Test);
        assert_eq!(msg.to, "ops@example.com");
        assert_eq!(msg.from.as_deref(), Some("santa@example.com"));
        assert!(msg.html_body.contains("2025"));
        assert!(!msg.html_body.contains("/open?"));
    }
}
