//! Text generator adapters.

pub mod mock;

pub use mock::{MockReply, MockTextGenerator};
