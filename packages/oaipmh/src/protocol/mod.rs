//! The OAI-PMH protocol surface.
//!
//! Requests are parsed and validated in [`request`], paged with stateless
//! tokens from [`resumption`], answered by the provider and rendered by
//! [`xml`]. [`dispatch`] ties these together.

pub mod dispatch;
pub mod request;
pub mod resumption;
pub mod xml;

pub use dispatch::{handle, handle_at};
pub use request::{parse_datestamp, Bound, OaiRequest, Selection, Verb};
pub use resumption::{Page, ResumptionState};
