use crate::cli::globals::GlobalArgs;
use crate::content::Resource;
use anyhow::{Context, Result, anyhow, bail};
use serde_json::Value;
use std::path::PathBuf;

/// One content operation with the inputs it needs.
#[derive(Debug, PartialEq)]
pub enum Request {
    List,
    Get { id: String },
    Create { record: Value },
    Update { id: String, record: Value },
    Delete { id: String },
    Upload { file: PathBuf },
}

impl Request {
    /// Builds a request from the raw `operation` name and its optional inputs.
    ///
    /// # Errors
    /// Returns an error when an input the operation needs is missing or the
    /// record is not valid JSON.
    pub fn parse(
        operation: &str,
        id: Option<&str>,
        data: Option<&str>,
        file: Option<&str>,
    ) -> Result<Self> {
        let require_id = || {
            id.map(ToString::to_string)
                .ok_or_else(|| anyhow!("--id is required for {operation}"))
        };
        let require_record = || -> Result<Value> {
            let data = data.ok_or_else(|| anyhow!("--data is required for {operation}"))?;
            serde_json::from_str(data).context("--data must be valid JSON")
        };

        Ok(match operation {
            "list" => Self::List,
            "get" => Self::Get { id: require_id()? },
            "create" => Self::Create { record: require_record()? },
            "update" => Self::Update {
                id: require_id()?,
                record: require_record()?,
            },
            "delete" => Self::Delete { id: require_id()? },
            "upload" => Self::Upload {
                file: file
                    .map(PathBuf::from)
                    .ok_or_else(|| anyhow!("--file is required for upload"))?,
            },
            other => bail!("unknown content operation: {other}"),
        })
    }
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub resource: Resource,
    pub request: Request,
}

/// Execute a content operation as the signed-in administrator.
/// # Errors
/// Returns an error if nobody is signed in or the API call fails.
pub async fn execute(args: Args) -> Result<()> {
    let authenticator = args.globals.authenticator()?;
    if !authenticator.is_authenticated() {
        bail!("Not signed in; run `mcc-admin login` first");
    }
    let client = args.globals.content_client(&authenticator)?;
    let resource = args.resource;

    let output = match args.request {
        Request::List => client.list(resource).await?,
        Request::Get { id } => client.get(resource, &id).await?,
        Request::Create { record } => client.create(resource, &record).await?,
        Request::Update { id, record } => client.update(resource, &id, &record).await?,
        Request::Delete { id } => {
            client.delete(resource, &id).await?;
            println!("Deleted {resource}/{id}");
            return Ok(());
        }
        Request::Upload { file } => {
            if resource != Resource::Media {
                bail!("only media accepts uploads");
            }
            client.upload_media(&file).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_update_needs_id_and_data() -> Result<()> {
        let request = Request::parse("update", Some("7"), Some(r#"{"title":"Holiday"}"#), None)?;
        assert_eq!(
            request,
            Request::Update {
                id: "7".to_string(),
                record: json!({"title": "Holiday"}),
            }
        );

        assert!(Request::parse("update", None, Some("{}"), None).is_err());
        assert!(Request::parse("update", Some("7"), None, None).is_err());
        Ok(())
    }

    #[test]
    fn parse_rejects_invalid_json() {
        let result = Request::parse("create", None, Some("{title:"), None);
        assert!(result.is_err());
        if let Err(err) = result {
            assert!(err.to_string().contains("valid JSON"));
        }
    }

    #[test]
    fn parse_upload_needs_file() -> Result<()> {
        assert!(Request::parse("upload", None, None, None).is_err());
        assert_eq!(
            Request::parse("upload", None, None, Some("brochure.pdf"))?,
            Request::Upload {
                file: PathBuf::from("brochure.pdf")
            }
        );
        Ok(())
    }

    #[test]
    fn parse_list_ignores_inputs() -> Result<()> {
        assert_eq!(Request::parse("list", Some("1"), None, None)?, Request::List);
        Ok(())
    }
}
