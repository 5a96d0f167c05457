use crate::cli::actions::{Action, content, login, password, session};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Login(args) => login::execute(args).await,
        Action::Status(args) => session::status(&args),
        Action::Logout(args) => session::logout(&args),
        Action::ForgotPassword(args) => password::forgot(args).await,
        Action::ResetPassword(args) => password::reset(args).await,
        Action::Content(args) => content::execute(args).await,
    }
}
