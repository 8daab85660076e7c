// src/runner/mod.rs

//! The quiz runner: filtering, answering and progress tracking.

pub mod deeplink;
pub mod filter;
pub mod persistence;
pub mod registry;
pub mod session;

pub use filter::{Mode, QuizFilter, Selector};
pub use registry::SessionRegistry;
pub use session::{QuizSession, SessionError};
