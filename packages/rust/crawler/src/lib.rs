//! Site discovery and page fetching.
//!
//! This crate provides:
//! - [`fetcher`]: Shared HTTP client with a fixed header profile and per-host throttle
//! - [`engine`]: Breadth-first crawler over the navigator tree
//! - [`pagination`]: Pager expansion with the odd/even retention rule

pub mod engine;
pub mod fetcher;
pub mod pagination;

pub use engine::{NavigationCrawler, NavigationReport};
pub use fetcher::{FetchedPage, PageFetcher};
pub use pagination::{PaginationExpander, page_number, retain_pages, sort_by_page_number};
