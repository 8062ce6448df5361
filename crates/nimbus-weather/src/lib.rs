//! Weather assistant built on a stdio tool server session.
//!
//! User text is routed by [`router::route`] to either a tool call
//! (`get_forecast` for a known city, `get_alerts` for a state code) or a
//! guidance message. Tool calls go through a [`SharedSession`], and an
//! optional LLM phrases the answer.
//!
//! ```text
//!   "umbrella in Seattle?"
//!            │
//!            ▼
//!   ┌─────────────────┐   guidance   ┌──────────────────┐
//!   │  router::route  │─────────────▶│  reply text      │
//!   └─────────────────┘              └──────────────────┘
//!            │ tool call
//!            ▼
//!   ┌─────────────────┐   result     ┌──────────────────┐
//!   │  SharedSession  │─────────────▶│  LLM (optional)  │
//!   └─────────────────┘              └──────────────────┘
//! ```

pub mod assistant;
pub mod cities;
pub mod error;
pub mod reply;
pub mod router;
pub mod session;

pub use assistant::WeatherAssistant;
pub use cities::{CITIES, City, Coordinate};
pub use error::{Result, WeatherError};
pub use router::{Guidance, Intent, StateCode, Subject, ToolCall, route};
pub use session::SharedSession;
