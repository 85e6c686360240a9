//! Clients for the remote render and animation encoder services.
//!
//! The render service turns two uploaded images into a transition video as
//! an asynchronous job; the encoder service turns an ordered list of frames
//! into an animated image. Both clients are thin request/response adapters:
//! they never retry and every call aborts promptly when its cancellation
//! token fires.

pub mod client;
pub mod encoder;
pub mod error;
pub mod http;
pub mod types;

pub use client::{HttpRenderClient, RenderJobClient};
pub use encoder::{AnimationEncoder, HttpAnimationEncoder};
pub use error::{RenderError, RenderResult};
pub use http::ServiceConfig;
pub use types::{
    AnimationOptions, AnimationRequest, EncodedAnimation, RemoteJob, RemoteJobState,
    RenderJobRequest, SubmittedJob,
};
