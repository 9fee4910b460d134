pub mod auth;
pub mod completion;
pub mod jobs;
pub mod sync_queue;
pub mod timer;
