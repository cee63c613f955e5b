pub mod chat;
pub mod media;
pub mod memory;
pub mod nodes;
pub mod research;
pub mod rooms;
pub mod social;
pub mod wait;

use std::sync::Arc;

use crate::registry::ToolRegistry;

/// Builds a registry containing every built-in tool (spec §4.6 groups:
/// chat-messaging, social-posting, media, room-management, node-control,
/// research, memory, waits).
pub fn default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(wait::WaitTool));
    registry.register(Arc::new(chat::SendChatMessageTool));
    registry.register(Arc::new(chat::ReplyChatMessageTool));
    registry.register(Arc::new(social::SendSocialPostTool));
    registry.register(Arc::new(social::ReplySocialPostTool));
    registry.register(Arc::new(social::ReactTool));
    registry.register(Arc::new(media::GenerateImageTool));
    registry.register(Arc::new(media::DescribeImageTool));
    registry.register(Arc::new(rooms::AcceptInviteTool));
    registry.register(Arc::new(rooms::LeaveRoomTool));
    registry.register(Arc::new(nodes::ExpandNodeTool));
    registry.register(Arc::new(nodes::CollapseNodeTool));
    registry.register(Arc::new(nodes::PinNodeTool));
    registry.register(Arc::new(nodes::UnpinNodeTool));
    registry.register(Arc::new(nodes::RefreshSummaryTool));
    registry.register(Arc::new(nodes::GetExpansionStatusTool));
    registry.register(Arc::new(research::SearchTool));
    registry.register(Arc::new(memory::StoreMemoryTool));
    registry
}
