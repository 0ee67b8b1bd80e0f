//! URL handling module
//!
//! Resolves links found in forum markup against the site origin or the page
//! they were found on, and compares page URLs for loop detection.

mod normalize;
mod resolve;

pub use normalize::{normalize_url, same_page};
pub use resolve::{parse_origin, resolve_from_origin, resolve_from_page};
