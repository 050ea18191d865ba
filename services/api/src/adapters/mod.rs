pub mod blob;
pub mod db;
pub mod mailer;
pub mod memory;
pub mod password;

pub use blob::LocalBlobStore;
pub use db::DbAdapter;
pub use mailer::{HttpMailChannel, LogMailChannel};
pub use memory::MemoryStore;
pub use password::Argon2Hasher;
