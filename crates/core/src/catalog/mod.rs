//! Training module catalog.

pub mod duplicate;
pub mod types;

#[cfg(test)]
mod duplicate_props;

pub use duplicate::{
    COPY_CODE_SUFFIX, COPY_TITLE_SUFFIX, CatalogError, MAX_CODE_LEN, MAX_TITLE_LEN,
};
pub use types::{ModuleContent, PricingType};
