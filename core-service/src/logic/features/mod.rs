//! Features Module - URL Feature Extraction
//!
//! Turns a raw URL into the fixed-width numeric vector the classifier and
//! the rule engine both consume.

pub mod layout;
pub mod vector;
pub mod extractor;


// Re-export common types
pub use layout::{feature_index, feature_name, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use vector::FeatureVector;
pub use extractor::{extract, UrlFeatureExtractor, UrlParts};
