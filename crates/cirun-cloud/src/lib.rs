//! Cirun cloud credential provisioning
//!
//! Creates a dedicated identity for Cirun in the operator's cloud account by
//! driving the provider's own command-line tool, then hands back a credential
//! bundle ready for `cloud-connect`.
//!
//! # Supported Providers
//!
//! - **AWS**: IAM user + access key (via `aws`)
//! - **Azure**: service principal + client secret (via `az`)
//! - **GCP**: service account + JSON key (via `gcloud`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          cirun cloud create <provider>        │
//! └─────────────────────┬────────────────────────┘
//!                       │
//! ┌─────────────────────▼────────────────────────┐
//! │                 cirun-cloud                   │
//! │  provision()  ──▶  trait ProviderProvisioner  │
//! │  retry()           ExternalCli (subprocess)   │
//! └───────┬──────────────────┬──────────────┬────┘
//!         │                  │              │
//!    ┌────▼────┐        ┌────▼────┐    ┌────▼────┐
//!    │   aws   │        │   az    │    │ gcloud  │
//!    └─────────┘        └─────────┘    └─────────┘
//! ```

pub mod aws;
pub mod azure;
pub mod command;
pub mod error;
pub mod gcp;
pub mod provisioner;
pub mod retry;
pub mod workflow;

// Re-exports
pub use aws::AwsProvisioner;
pub use azure::AzureProvisioner;
pub use command::ExternalCli;
pub use error::{CloudError, Result};
pub use gcp::GcpProvisioner;
pub use provisioner::{Identity, Principal, ProviderProvisioner, ProvisionPlan};
pub use retry::{RetryConfig, retry};
pub use workflow::{ProvisionObserver, ProvisionStep, Provisioned, provision};
