//! Utility functions for identifier slugs and output formatting.
//!
//! - [`slug`] - Business-name normalization and id sanitization
//! - [`qr_template`] - Template filename adjustment and tracking-link URLs

pub mod qr_template;
pub mod slug;
