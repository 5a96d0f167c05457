use crate::cli::globals::GlobalArgs;
use anyhow::Result;
use secrecy::SecretString;

#[derive(Debug)]
pub struct ForgotArgs {
    pub globals: GlobalArgs,
    pub email: String,
}

#[derive(Debug)]
pub struct ResetArgs {
    pub globals: GlobalArgs,
    pub token: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// Request a reset link.
/// # Errors
/// Returns an error if the email is invalid or the request fails.
pub async fn forgot(args: ForgotArgs) -> Result<()> {
    if let Some((authenticator, backend)) = args.globals.demo_authenticator() {
        authenticator.forgot_password(&args.email).await?;
        args.globals.save_demo_resets(&backend)?;
        if let Some(token) = backend.last_reset_token(&args.email) {
            println!("Demo mode, no mail is sent. Reset token: {token}");
        }
        return Ok(());
    }

    let authenticator = args.globals.authenticator()?;
    authenticator.forgot_password(&args.email).await?;

    println!(
        "If an account exists for {}, a password reset link is on its way.",
        args.email.trim()
    );
    Ok(())
}

/// Check the reset token, then set the new password.
/// # Errors
/// Returns an error if the token is rejected or the new password fails the policy.
pub async fn reset(args: ResetArgs) -> Result<()> {
    if let Some((authenticator, backend)) = args.globals.demo_authenticator() {
        authenticator.validate_reset_token(&args.token).await?;
        authenticator
            .reset_password(&args.token, &args.password, &args.confirm_password)
            .await?;
        args.globals.save_demo_resets(&backend)?;

        println!("Password reset. Demo accounts keep their built-in password in later runs.");
        return Ok(());
    }

    let authenticator = args.globals.authenticator()?;
    authenticator.validate_reset_token(&args.token).await?;
    authenticator
        .reset_password(&args.token, &args.password, &args.confirm_password)
        .await?;

    println!("Password reset. You can now sign in with the new password.");
    Ok(())
}
