pub mod client;
pub mod dto;
pub mod queries;
pub mod results;

pub use client::{ShopifyClientConfig, ShopifyOperationClient};
pub use results::HttpResultFetcher;
