//! licensegate - client-side license verification
//!
//! Asks a remote validation server whether a license key is usable and folds
//! the answer into a closed set of [`Outcome`]s. Optionally the server proves
//! its identity by signing a per-request challenge with its RSA private key.
//!
//! # Example
//!
//! ```rust,no_run
//! use licensegate::LicenseGate;
//!
//! # async fn run() {
//! let gate = LicenseGate::new("my-account").use_challenges();
//! if gate.verify_simple("ABCD-EFGH", None, None).await {
//!     println!("licensed");
//! }
//! # }
//! ```

// Core modules
pub mod config;
pub mod errors;
pub mod outcome;

// Verification client
pub mod client {
    pub mod challenge;
    pub mod classifier;
    pub mod diagnostics;
    pub mod gate;
    pub mod responses;
    pub mod signature;
    pub mod transport;
    pub mod url;
}

pub use client::gate::LicenseGate;
pub use outcome::Outcome;
