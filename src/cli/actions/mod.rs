pub mod content;
pub mod login;
pub mod password;
pub mod session;

// Internal "interpreter" for `Action`; the match lives in `run`.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(login::Args),
    Status(session::Args),
    Logout(session::Args),
    ForgotPassword(password::ForgotArgs),
    ResetPassword(password::ResetArgs),
    Content(content::Args),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
