//! External market-data adapters: Yahoo Finance prices and profiles, Finnhub
//! and Polygon company news, and the ticker directory.

mod rate_limit;

pub mod finnhub;
pub mod news;
pub mod polygon;
pub mod tickers;
pub mod yahoo;

pub use finnhub::FinnhubClient;
pub use news::NewsFeed;
pub use polygon::PolygonNewsClient;
pub use tickers::TickerDirectory;
pub use yahoo::YahooFinanceClient;
