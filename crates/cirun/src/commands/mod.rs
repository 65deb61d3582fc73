pub mod access;
pub mod cloud;
pub mod create;
pub mod repo;

use cirun_client::{CirunError, report};
use cirun_cloud::CloudError;
use colored::Colorize;

/// Render a failed command on stderr
///
/// API and GitHub failures were already rendered by the client, so only
/// the remaining errors are printed here.
pub fn report_failure(err: &anyhow::Error) {
    let cirun_error = err.downcast_ref::<CirunError>().or_else(|| {
        match err.downcast_ref::<CloudError>() {
            Some(CloudError::Client(inner)) => Some(inner),
            _ => None,
        }
    });
    if matches!(
        cirun_error,
        Some(CirunError::Api { .. } | CirunError::Github { .. })
    ) {
        return;
    }

    if matches!(err.downcast_ref::<CloudError>(), Some(CloudError::Aborted)) {
        eprintln!("{}", err.to_string().yellow());
        return;
    }

    report::print_error_message(&format!("ERROR: {err:#}"));
}
