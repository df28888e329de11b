//! Object storage (Spaces) sessions

mod session;

pub use session::{Bucket, StorageSession, SIGNING_REGION};
