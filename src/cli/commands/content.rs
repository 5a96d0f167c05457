use crate::content::Resource;
use clap::{Arg, Command, builder::PossibleValuesParser};

pub const CMD_CONTENT: &str = "content";

pub const ARG_RESOURCE: &str = "resource";
pub const ARG_OPERATION: &str = "operation";
pub const ARG_ID: &str = "id";
pub const ARG_DATA: &str = "data";
pub const ARG_FILE: &str = "file";

pub const OPERATIONS: [&str; 6] = ["list", "get", "create", "update", "delete", "upload"];

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_CONTENT)
            .about("Manage portal content")
            .arg(
                Arg::new(ARG_RESOURCE)
                    .help("Content collection")
                    .required(true)
                    .value_parser(PossibleValuesParser::new(
                        Resource::ALL.map(Resource::name),
                    )),
            )
            .arg(
                Arg::new(ARG_OPERATION)
                    .help("Operation to run on the collection")
                    .required(true)
                    .value_parser(PossibleValuesParser::new(OPERATIONS)),
            )
            .arg(
                Arg::new(ARG_ID)
                    .long(ARG_ID)
                    .help("Record id for get, update and delete"),
            )
            .arg(
                Arg::new(ARG_DATA)
                    .short('d')
                    .long(ARG_DATA)
                    .help("Record as JSON for create and update"),
            )
            .arg(
                Arg::new(ARG_FILE)
                    .short('f')
                    .long(ARG_FILE)
                    .help("Local file for media upload"),
            ),
    )
}
