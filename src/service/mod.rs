//! Service layer
//!
//! One service per resource. Each service validates inputs first, then
//! performs authorization checks, then issues store calls. The caller
//! identity is always an explicit argument, never ambient request state.

mod comment;
mod playlist;
mod subscription;
mod video;

pub use comment::CommentService;
pub use playlist::PlaylistService;
pub use subscription::{SubscriptionService, SubscriptionToggle};
pub use video::{PublishVideoInput, UpdateVideoInput, UploadedFile, VideoListRequest, VideoService};
