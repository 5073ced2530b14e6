//! Request handlers.

pub mod form;
pub mod health;
pub mod history;
pub mod persons;
pub mod search;
pub mod videos;

pub use health::*;
pub use history::*;
pub use persons::*;
pub use search::*;
pub use videos::*;
