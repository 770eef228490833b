//! # Answering-service protocol
//!
//! Everything between "the user asked a question" and "a typed event reached
//! the conversation": the wire types, the byte-stream decoder, the event
//! dispatcher and the two event producers (the live HTTP client and the demo
//! simulator).
//!
//! ```text
//!   AskRequest ──► AnswerProvider ──► StreamEvent* ──► dispatch() ──► StreamHandler
//!                   ├─ CorpusProvider (HTTP + StreamDecoder)
//!                   └─ DemoProvider   (local script)
//! ```

pub mod decoder;
pub mod dispatch;
pub mod provider;
pub mod providers;
pub mod types;

pub use decoder::{StreamDecoder, decode_stream};
pub use dispatch::{StreamHandler, dispatch};
pub use provider::{AnswerProvider, ProviderError, stream_to_channel};
pub use providers::{CorpusProvider, DemoProvider, DemoSession};
pub use types::{AskRequest, HistoryTurn, Role, Source, StreamEvent};
