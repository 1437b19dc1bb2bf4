mod browser;
mod http;

pub use browser::UnconfiguredBrowser;
pub use http::HttpFetcher;
