pub mod html_parser;
pub mod search_result;

pub use html_parser::PageExtractor;
pub use search_result::*;
