//! Publishing destination for rendered release notes.
//!
//! [`Publisher`] is the seam the publish loop posts through; [`RedditPublisher`]
//! is the production implementation that submits self posts to a subreddit.

pub mod reddit;

use std::future::Future;

use releasebot_shared::Result;

pub use reddit::{RedditClient, RedditPublisher};

/// Flair label attached to every published entry.
pub const RELEASE_NOTE_FLAIR: &str = "Release Note";

/// A destination that accepts one post per call.
pub trait Publisher {
    /// Submit a post and return the id the destination assigned to it.
    fn submit(
        &self,
        title: &str,
        body: &str,
        flair: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}
