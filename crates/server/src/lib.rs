//! HTTP front end for the Snaptag tagging pipeline.
//!
//! Open routes: `GET /`, `/health`, `/ready`, `/metrics`.
//!
//! Under `/api/v1`, every request carries an API key (`X-API-Key` or a bearer
//! token) and the caller's `X-User-Id`:
//!
//! | route | body | reply |
//! |---|---|---|
//! | `POST images` | `{ image, file_name? }` | stored record, 201 |
//! | `POST images/delete` | `{ url: [..] }` | `{ deleted }` |
//! | `POST images/search` | `{ image }` | `{ thumbnail_urls }` |
//! | `POST thumbnails/lookup` | `{ thumbnail_url }` | `{ image_url, tags }` |
//! | `POST tags` | `{ type: 0\|1, tags, url }` | `{ updated }` |
//! | `POST tags/search` | `{ tags: ["dog", "cat, 2"] }` | `{ links }` |
//! | `POST`/`GET subscriptions` | `{ tags }` | `{ subscribed_tags }` |
//!
//! Failures reply `{ "error": { code, message, details? } }`; see
//! [`ServerError`].

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
