pub mod extractor;
pub mod http;

pub use extractor::{ExtractError, FactExtractor};
pub use http::HttpExtractor;
