//! HTTP handlers.

pub mod chat;
pub mod listings;
pub mod matching;
pub mod pages;
pub mod requests;

pub use chat::create_chat_completion;
pub use listings::list_listings;
pub use matching::match_listings;
pub use pages::{clone_page, generate_funnel};
pub use requests::poll_request;
