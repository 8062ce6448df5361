//! LLM collaborator abstraction for nimbus.
//!
//! The weather assistant uses a language model for two things: phrasing
//! answers from raw tool output, and single-shot function calling where the
//! model picks a weather tool itself.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  LlmBackend trait                       │
//! │  - generate() -> GenerateResponse       │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!     ┌─────────┐         ┌────────┐
//!     │ Gemini  │         │  Mock  │
//!     └─────────┘         └────────┘
//! ```

pub mod backend;
pub mod error;
pub mod gemini;
pub mod types;

pub use backend::{LlmBackend, MockBackend, MockResponse, SharedBackend};
pub use error::{LlmError, Result};
pub use gemini::{GeminiBackend, GeminiConfig, create_shared_backend};
pub use types::{
    Content, FunctionCall, FunctionDeclaration, FunctionResponse, GenerateRequest,
    GenerateResponse, Part, Role,
};
