//! Command-line front end for redscrape: request caching and file output on
//! top of `redscrape-core` and `reddit-client`.

pub mod harvester;
pub mod output;

pub use harvester::Harvester;
