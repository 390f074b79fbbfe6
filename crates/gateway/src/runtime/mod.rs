pub mod birthdays;
pub mod conversation_lock;
pub mod dispatch;
pub mod history;
pub mod prompts;
pub mod reply;
pub mod sent_log;
