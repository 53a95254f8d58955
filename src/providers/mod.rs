pub mod groq;
pub mod traits;

pub use groq::GroqProvider;
pub use traits::{CompletionProvider, TextStream};
