//! Page types and layout.
//!
//! This module contains:
//! - [`Page`] - The raw 4KB data container
//! - [`SlotLayout`] - Fixed-width tuple slots within a heap page

#[allow(clippy::module_inception)]
mod page;
mod slot_layout;

pub use page::Page;
pub use slot_layout::SlotLayout;
