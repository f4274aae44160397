pub mod classify;
pub mod compose;
pub mod feed;
pub mod fetch;
pub mod gc;
pub mod init;
pub mod stats;
pub mod subscriber;
