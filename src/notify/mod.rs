// ==========================================
// 礼物交换抽签系统 - 通知层
// ==========================================
// 职责: 揭晓消息渲染 + 发件箱投递 + 并发分发
// 边界: 不含 SMTP，发件箱目录即投递边界
// ==========================================

pub mod dispatch;
pub mod outbox;
pub mod render;

pub use dispatch::{deliver_all, DeliveryFailure, DeliveryReport};
pub use outbox::OutboxNotifier;
pub use render::{
    html_escape, render_master_list, render_reveal, render_test_message, MessageKind, OutboundMessage,
    RenderContext,
};
