//! Repositories for database operations.

mod activity;
mod channel;
mod comment;
mod counter;
mod like;
mod post;
mod subscription;
mod user;
mod video;

pub use activity::ActivityRepository;
pub use channel::ChannelRepository;
pub use comment::CommentRepository;
pub use counter::{CounterField, CounterRepository};
pub use like::LikeRepository;
pub use post::PostRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;
pub use video::VideoRepository;
