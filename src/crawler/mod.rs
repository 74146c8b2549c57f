// file: src/crawler/mod.rs
// description: listing crawler module exports
// reference: internal module structure

pub mod client;
pub mod facets;
pub mod listing;

pub use client::{FacetReport, ListingCrawler};
pub use facets::{LISTING_FACETS, ListingFacet};
pub use listing::map_listing_item;
