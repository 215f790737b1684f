//! Frame attachment: making the API objects discoverable by content

pub mod manager;
pub mod registry;
pub mod target;

pub use manager::{AttachmentManager, PublishReport};
pub use registry::{PublishedRegistry, Publication};
pub use target::{FrameChain, FrameTarget, LocalFrame, TargetHandle};
