//! Front end for the neutron activation and scattering calculator.
//!
//! Form input becomes a [`query::Query`], a [`transport::Transport`] carries
//! it to the calculation backend, and the [`render::Renderer`] turns each
//! [`response::Response`] into an HTML block for the results area.

pub mod cli;
pub mod config;
pub mod controller;
pub mod elements;
pub mod error;
pub mod format;
pub mod query;
pub mod render;
pub mod response;
pub mod sort;
pub mod transport;

pub use config::{FrontendConfig, SessionConfig};
pub use controller::Controller;
pub use query::{build_query, Calculation, FormSnapshot, Query};
pub use response::Response;
pub use transport::{Transport, TransportEvent};
