pub mod demo;
pub mod live;

pub use demo::{DemoProvider, DemoRole, DemoSession, DemoUser};
pub use live::CorpusProvider;
