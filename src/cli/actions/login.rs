use crate::auth::{LoginOutcome, utils::OTP_LENGTH};
use crate::cli::globals::GlobalArgs;
use anyhow::{Context, Result};
use secrecy::SecretString;
use std::io::Write;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email: String,
    pub password: SecretString,
    pub otp: Option<String>,
}

/// Execute the login action: password step, then the OTP step when the
/// server asks for one.
/// # Errors
/// Returns an error if either step is rejected or the OTP cannot be read.
pub async fn execute(args: Args) -> Result<()> {
    let authenticator = args.globals.authenticator()?;

    let user = match authenticator.login(&args.email, &args.password).await? {
        LoginOutcome::Authenticated(user) => user,
        LoginOutcome::OtpRequired => {
            let code = match args.otp {
                Some(code) => code,
                None => prompt_otp(&args.email).await?,
            };
            authenticator.verify_otp(&code).await?
        }
    };

    println!("Signed in as {} <{}>", user.name, user.email);
    Ok(())
}

async fn prompt_otp(email: &str) -> Result<String> {
    let prompt = format!("Enter the {OTP_LENGTH}-digit code sent to {email}: ");
    tokio::task::spawn_blocking(move || -> std::io::Result<String> {
        let mut stderr = std::io::stderr();
        stderr.write_all(prompt.as_bytes())?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin().read_line(&mut line)?;
        Ok(line.trim().to_string())
    })
    .await
    .context("OTP prompt was interrupted")?
    .context("failed to read the OTP")
}
