//! crownpeak-dqm - Crownpeak DQM workflow node
//!
//! A `crownpeak` workflow node that calls the Crownpeak DQM (Digital Quality
//! Management) CMS API: list, inspect, create, update and delete content
//! assets, and read websites, checkpoints, spellcheck results and page
//! highlights.
//!
//! ## Key Features
//!
//! - **Typed operations**: 15 API operations as a closed enum, each with its
//!   own validated request shape
//! - **Per-item batches**: one call per input item, in order, with
//!   `{{ input.field }}` templates in node parameters
//! - **Encrypted credentials**: API key profiles sealed with AES-256-GCM
//! - **Structured errors**: stable error codes, API bodies passed through
//!
//! ## Example
//!
//! ```yaml
//! nodes:
//!   - id: check-assets
//!     type: crownpeak
//!     config:
//!       operation: getAssetErrorsByCheckpoint
//!       credential: crownpeak
//!       assetId: "{{ input.asset_id }}"
//!       checkpointId: "{{ input.checkpoint_id }}"
//! ```

pub mod config;
pub mod credentials;
pub mod dqm;
pub mod error;
pub mod nodes;

pub use error::{Error, Result};
