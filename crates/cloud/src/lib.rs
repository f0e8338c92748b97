//! Outbound job execution for the golf analyzer trigger.
//!
//! [`JobRunner`] is the seam the HTTP layer depends on. [`CloudRunClient`]
//! implements it against the Cloud Run Admin API v2 over plain REST using
//! [`reqwest`], authenticating with an [`AccessTokenProvider`].

pub mod cloud_run;
pub mod error;
pub mod runner;
pub mod token;

pub use cloud_run::{CloudRunClient, CloudRunConfig};
pub use error::CloudError;
pub use runner::{JobRunner, RunOutcome};
pub use token::AccessTokenProvider;
