pub mod core;
pub mod decoder;
pub mod models;
pub mod session;

pub use self::core::{
    ACCESS_DENIED_NOTICE, CancelFlag, ChatClient, ChatClientBuilder, DEFAULT_SESSION_ID,
};
pub use self::decoder::StreamDecoder;
pub use self::models::{Role, Transcript, Turn};
pub use self::session::ChatSession;
