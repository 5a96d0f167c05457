//! Maps validated CLI matches to an [`Action`] with its resolved configuration.

use crate::app::{AppConfig, config::apply_overrides};
use crate::cli::{
    actions::{Action, content, login, password, session},
    commands::{auth, content as content_cmd, portal},
    globals::GlobalArgs,
};
use crate::content::Resource;
use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use secrecy::SecretString;

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let mut config = AppConfig::default();
    apply_overrides(&mut config, portal::overrides(matches));
    let globals = GlobalArgs::new(config);

    let Some((name, sub)) = matches.subcommand() else {
        bail!("missing command; see `mcc-admin --help`");
    };

    let action = match name {
        auth::CMD_LOGIN => Action::Login(login::Args {
            globals,
            email: required(sub, auth::ARG_EMAIL)?,
            password: SecretString::from(required(sub, auth::ARG_PASSWORD)?),
            otp: sub.get_one::<String>(auth::ARG_OTP).cloned(),
        }),
        auth::CMD_STATUS => Action::Status(session::Args { globals }),
        auth::CMD_LOGOUT => Action::Logout(session::Args { globals }),
        auth::CMD_FORGOT_PASSWORD => Action::ForgotPassword(password::ForgotArgs {
            globals,
            email: required(sub, auth::ARG_EMAIL)?,
        }),
        auth::CMD_RESET_PASSWORD => Action::ResetPassword(password::ResetArgs {
            globals,
            token: required(sub, auth::ARG_TOKEN)?,
            password: SecretString::from(required(sub, auth::ARG_PASSWORD)?),
            confirm_password: SecretString::from(required(sub, auth::ARG_CONFIRM_PASSWORD)?),
        }),
        content_cmd::CMD_CONTENT => {
            let resource = required(sub, content_cmd::ARG_RESOURCE)?
                .parse::<Resource>()
                .map_err(|err| anyhow!(err))?;
            let operation = required(sub, content_cmd::ARG_OPERATION)?;
            let request = content::Request::parse(
                &operation,
                optional(sub, content_cmd::ARG_ID),
                optional(sub, content_cmd::ARG_DATA),
                optional(sub, content_cmd::ARG_FILE),
            )?;
            Action::Content(content::Args {
                globals,
                resource,
                request,
            })
        }
        other => bail!("unknown command: {other}"),
    };

    Ok(action)
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    matches
        .get_one::<String>(id)
        .cloned()
        .with_context(|| format!("missing required argument: --{id}"))
}

fn optional<'a>(matches: &'a ArgMatches, id: &str) -> Option<&'a str> {
    matches.get_one::<String>(id).map(String::as_str)
}
