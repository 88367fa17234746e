// Adapters layer: concrete implementations of the domain ports
// (file/memory storage, Gemini HTTP client).

pub mod gemini;
pub mod storage;

pub use gemini::GeminiClient;
pub use storage::{LocalStorage, MemoryStorage};
