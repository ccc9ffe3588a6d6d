//! Session state shared by the processors and synthesizers

pub mod classes;
pub mod queue;
pub mod session;

pub use classes::ClassStack;
pub use queue::ActionQueue;
pub use session::Session;
