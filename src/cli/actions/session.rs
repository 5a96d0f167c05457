use crate::auth::SessionState;
use crate::cli::globals::GlobalArgs;
use anyhow::Result;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
}

/// Print who is signed in, if anyone.
/// # Errors
/// Returns an error if the session cannot be restored.
pub fn status(args: &Args) -> Result<()> {
    let authenticator = args.globals.authenticator()?;
    println!("{}", describe(&authenticator.state()));
    Ok(())
}

/// Sign out. Succeeds even when nobody was signed in.
/// # Errors
/// Returns an error if the session cannot be restored.
pub fn logout(args: &Args) -> Result<()> {
    let authenticator = args.globals.authenticator()?;
    authenticator.logout();
    println!("Signed out");
    Ok(())
}

fn describe(state: &SessionState) -> String {
    match state {
        SessionState::Authenticated(user) => {
            format!("Signed in as {} <{}> ({})", user.name, user.email, user.role)
        }
        SessionState::OtpPending { email } => format!("Waiting for the OTP sent to {email}"),
        SessionState::Restoring => "Restoring session".to_string(),
        SessionState::Anonymous => "Not signed in".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, User};

    #[test]
    fn describe_authenticated_user() {
        let state = SessionState::Authenticated(User {
            id: "demo-admin-001".to_string(),
            email: "admin@mcc.edu.in".to_string(),
            name: "Admin User".to_string(),
            role: Role::Admin,
        });
        assert_eq!(
            describe(&state),
            "Signed in as Admin User <admin@mcc.edu.in> (admin)"
        );
        assert_eq!(describe(&SessionState::Anonymous), "Not signed in");
    }
}
