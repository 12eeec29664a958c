//! Media module for canonical items and normalization.

pub mod item;
pub mod normalize;

pub use item::{CanonicalItem, ItemStats, ItemType, MediaContent, VideoInfo};
pub use normalize::{normalize, select_best_rendition, Rendition};
