//! Alpha crossfade between two images.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{CompositorError, CompositorResult};
use crate::frame::CompositeFrame;

/// Blend one channel: `before * (1 - opacity) + after * opacity`, rounded.
pub fn blend_channel(before: u8, after: u8, opacity: f64) -> u8 {
    let value = before as f64 * (1.0 - opacity) + after as f64 * opacity;
    value.round().clamp(0.0, 255.0) as u8
}

/// Opacities of a crossfade with `steps` intervals: `0, 1/steps, ..., 1`.
pub fn crossfade_opacities(steps: u32) -> CompositorResult<Vec<f64>> {
    if steps == 0 {
        return Err(CompositorError::InvalidSteps(steps));
    }
    Ok((0..=steps).map(|i| i as f64 / steps as f64).collect())
}

/// Produce `steps + 1` frames overlaying `after` on `before` at increasing opacity.
///
/// Frame `i` has opacity `i / steps`, so the first frame equals `before` and
/// the last equals `after`. When the images differ in size, `after` is
/// resized onto `before`'s canvas first. The token is checked before each
/// frame.
pub fn composite(
    before: &RgbaImage,
    after: &RgbaImage,
    steps: u32,
    token: &CancellationToken,
) -> CompositorResult<Vec<CompositeFrame>> {
    let opacities = crossfade_opacities(steps)?;

    let (width, height) = before.dimensions();
    if width == 0 || height == 0 {
        return Err(CompositorError::EmptyImage("before".to_string()));
    }
    if after.width() == 0 || after.height() == 0 {
        return Err(CompositorError::EmptyImage("after".to_string()));
    }

    let after: Cow<'_, RgbaImage> = if after.dimensions() == (width, height) {
        Cow::Borrowed(after)
    } else {
        debug!(
            from_width = after.width(),
            from_height = after.height(),
            width,
            height,
            "Resizing after image onto before canvas"
        );
        Cow::Owned(imageops::resize(after, width, height, FilterType::Triangle))
    };

    let mut frames = Vec::with_capacity(opacities.len());
    for (index, opacity) in opacities.into_iter().enumerate() {
        if token.is_cancelled() {
            return Err(CompositorError::Cancelled);
        }

        let mut image = before.clone();
        for (out, top) in image.pixels_mut().zip(after.pixels()) {
            for (channel, &over) in out.0.iter_mut().zip(top.0.iter()) {
                *channel = blend_channel(*channel, over, opacity);
            }
        }

        frames.push(CompositeFrame::new(index as u32, steps, image));
    }

    debug!(frames = frames.len(), width, height, "Composited crossfade");
    Ok(frames)
}
