pub mod api;
pub mod browser;
pub mod error;
pub mod llm;
pub mod scrape;
pub mod utils;
