//! Concrete background workers for each job kind.

pub mod chat;
pub mod clone;
pub mod crawl;
pub mod matching;

pub use chat::ChatCompletionHandler;
pub use clone::PageCloneHandler;
pub use crawl::PageCrawlHandler;
pub use matching::ListingMatchHandler;
