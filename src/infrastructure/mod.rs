//! Infrastructure layer - external concerns

pub mod callback;
pub mod storage;
pub mod transport;

pub use callback::HttpCallbackSender;
pub use storage::InMemoryStore;
pub use transport::SessionEmitter;
