//! # TUI Components
//!
//! Stateless components receive everything as props (struct fields) and are
//! rebuilt each frame:
//! - `TitleBar`: mode, filters and status line
//! - `Message`: one conversation turn
//! - `SourcesPanel`: material behind the latest answer
//! - `LandingPage`: greeting and starter questions
//!
//! Stateful components keep local state in `TuiState` and turn `TuiEvent`s
//! into higher-level events:
//! - `InputBox`: the question editor
//! - `MessageList`: scrollable conversation with cached message heights
//!
//! ```text
//! components/
//! ├── mod.rs
//! ├── title_bar.rs
//! ├── message.rs
//! ├── message_list.rs
//! ├── sources_panel.rs
//! ├── landing.rs
//! └── input_box.rs
//! ```

pub mod input_box;
pub mod landing;
pub mod message;
pub mod message_list;
pub mod sources_panel;
mod title_bar;

pub use input_box::{InputBox, InputEvent};
pub use landing::LandingPage;
pub use message_list::{MessageList, MessageListState};
pub use sources_panel::SourcesPanel;
pub use title_bar::TitleBar;
