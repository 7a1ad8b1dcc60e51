//! REST API server for document entity extraction.
//!
//! An Axum server that turns uploaded documents or raw text into entities.
//!
//! # Endpoints
//!
//! - `GET /` - Info page
//! - `GET /health` - Engine availability and API key status
//! - `GET /models` - Supported models
//! - `POST /extract` - Extract entities from an uploaded file (multipart form data)
//! - `POST /extract-text` - Extract entities from raw text (form or multipart)
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use doclex::api::serve;
//!
//! #[tokio::main]
//! async fn main() -> doclex::Result<()> {
//!     serve("127.0.0.1", 8000).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use doclex::{Settings, api::create_router};
//! use axum::Router;
//!
//! # fn main() -> doclex::Result<()> {
//! let doclex_router = create_router(Settings::load()?)?;
//! let app: Router = Router::new().nest("/doclex", doclex_router);
//! # Ok(())
//! # }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! curl -F "file=@contract.pdf" \
//!      -F "prompt_description=Extract the parties and amounts" \
//!      -F "extraction_classes=person,organization,money" \
//!      http://localhost:8000/extract
//!
//! curl -d "text=John Smith visited New York." \
//!      -d "prompt_description=Extract people and places" \
//!      -d "extraction_classes=person,location" \
//!      http://localhost:8000/extract-text
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::{ApiError, INTERNAL_ERROR_MESSAGE};
pub use handlers::TEXT_INPUT_FILENAME;
pub use server::{body_limit_bytes, create_router, create_router_with_state, serve, serve_default, serve_with_settings};
pub use types::{ApiState, ErrorResponse, HealthResponse, ModelsResponse};
