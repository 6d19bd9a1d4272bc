pub mod event;

pub use event::{Backend, LoginEvent};
