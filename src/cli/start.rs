use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use tracing::debug;

/// Parses the command line, sets up logging and resolves the action to run.
///
/// # Errors
///
/// Returns an error if logging cannot be initialized or the arguments do not
/// describe a runnable command
pub fn start() -> Result<Action> {
    let matches = commands::new().get_matches();

    telemetry::init(commands::portal::log_level(&matches))?;
    debug!(
        version = env!("CARGO_PKG_VERSION"),
        commit = crate::GIT_COMMIT_HASH,
        "starting mcc-admin"
    );

    dispatch::handler(&matches)
}
