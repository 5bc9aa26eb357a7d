//! Database entities.

#![allow(missing_docs)]

pub mod activity;
pub mod channel;
pub mod comment;
pub mod like;
pub mod post;
pub mod subscription;
pub mod user;
pub mod video;

pub use activity::Entity as Activity;
pub use channel::Entity as Channel;
pub use comment::Entity as Comment;
pub use like::Entity as Like;
pub use post::Entity as Post;
pub use subscription::Entity as Subscription;
pub use user::Entity as User;
pub use video::Entity as Video;
