//! External collaborators used by the research pipeline
//!
//! The pipeline never talks to the network directly. Web search goes through
//! a [`search::SearchProvider`] and outbound notifications through
//! [`email::ResendMailer`]; both live here so the research stages stay pure
//! orchestration.
//!
//! # Module Structure
//!
//! - [`search`](crate::tools::search) - Web search (DuckDuckGo via daedra)
//! - [`email`](crate::tools::email) - Email delivery (Resend HTTP API)
//!
//! ```ignore
//! let provider = DaedraSearch::new();
//! let hits = provider.search("rust async runtimes", 5).await?;
//! for hit in hits {
//!     println!("{}: {}", hit.title, hit.url);
//! }
//! ```

/// Email delivery through the Resend API.
pub mod email;
/// Web search provider trait and DuckDuckGo implementation.
pub mod search;
