pub mod code;
pub mod id;

pub use id::prefixed_ulid;
