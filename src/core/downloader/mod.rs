pub mod client;

pub use client::{fetch_with_deadline, Fetcher, HttpFetcher};
