/// Event contracts between the chat view and its children.
pub mod events;
pub mod message_input;
pub mod message_list;
pub mod scroll_manager;
pub mod sidebar;
pub mod view;

pub use events::{SidebarEvent, Submit};
pub use message_input::MessageInput;
pub use message_list::MessageList;
pub use scroll_manager::ScrollManager;
pub use sidebar::{ChatSidebar, ConversationEntry, SidebarSnapshot};
pub use view::ChatView;
