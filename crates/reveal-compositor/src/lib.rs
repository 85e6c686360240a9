//! On-device crossfade compositor.
//!
//! Produces the frames of the fallback animation: an ordered sequence of
//! alpha blends from the "before" image to the "after" image. Pure CPU work
//! with no network access, cancellable between frames.

pub mod blend;
pub mod error;
pub mod frame;

pub use blend::{blend_channel, composite, crossfade_opacities};
pub use error::{CompositorError, CompositorResult};
pub use frame::{load_image, load_image_from_memory, CompositeFrame};
