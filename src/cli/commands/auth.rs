use clap::{Arg, Command};

pub const CMD_LOGIN: &str = "login";
pub const CMD_STATUS: &str = "status";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_OTP: &str = "otp";
pub const ARG_TOKEN: &str = "token";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(login())
        .subcommand(Command::new(CMD_STATUS).about("Show the current admin session"))
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the persisted session"))
        .subcommand(forgot_password())
        .subcommand(reset_password())
}

fn email_arg() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long(ARG_EMAIL)
        .help("Administrator email address")
        .env("MCC_ADMIN_EMAIL")
        .required(true)
}

fn login() -> Command {
    Command::new(CMD_LOGIN)
        .about("Sign in with email and password, then the one-time passcode")
        .arg(email_arg())
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("Account password")
                .env("MCC_ADMIN_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_OTP)
                .long(ARG_OTP)
                .help("One-time passcode; prompted for when required and not given"),
        )
}

fn forgot_password() -> Command {
    Command::new(CMD_FORGOT_PASSWORD)
        .about("Request a password reset link")
        .arg(email_arg())
}

fn reset_password() -> Command {
    Command::new(CMD_RESET_PASSWORD)
        .about("Set a new password using a reset token")
        .arg(
            Arg::new(ARG_TOKEN)
                .short('t')
                .long(ARG_TOKEN)
                .help("Reset token from the emailed link")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PASSWORD)
                .short('p')
                .long(ARG_PASSWORD)
                .help("New password")
                .env("MCC_NEW_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_CONFIRM_PASSWORD)
                .long(ARG_CONFIRM_PASSWORD)
                .help("New password, repeated")
                .required(true),
        )
}
