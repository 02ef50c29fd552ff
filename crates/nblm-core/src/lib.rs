pub mod codes;
pub mod id;
pub mod wire;

pub use codes::{table, CodeMap};
pub use id::{conversation_id, RequestCounter};
pub use wire::{notebook_path, rpc};
