use crate::app::AppConfig;
use crate::auth::backend::DemoMail;
use crate::auth::{AuthBackend, Authenticator, DemoBackend, FileStore, HttpBackend};
use crate::content::ContentClient;
use anyhow::{Context, Result, bail};
use std::{fs, io, path::PathBuf, sync::Arc, time::Duration};
use tracing::{debug, info, warn};

/// Simulated round trip of the demo backend, so the CLI feels like the portal.
const DEMO_LATENCY: Duration = Duration::from_millis(800);

/// Settings shared by every command.
#[derive(Clone, Debug)]
pub struct GlobalArgs {
    pub config: AppConfig,
}

impl GlobalArgs {
    #[must_use]
    pub const fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// # Errors
    /// Returns an error if the API base URL cannot be used.
    pub fn backend(&self) -> Result<Arc<dyn AuthBackend>> {
        if self.config.is_demo() {
            return Ok(self.demo_backend());
        }

        let backend = HttpBackend::new(&self.config).context("invalid portal API configuration")?;
        Ok(Arc::new(backend))
    }

    fn demo_backend(&self) -> Arc<DemoBackend> {
        info!("using the demo backend");
        Arc::new(
            DemoBackend::new()
                .with_latency(DEMO_LATENCY)
                .with_pending_resets(self.load_demo_resets()),
        )
    }

    /// Unused demo reset tokens are kept next to the session file, so a token
    /// printed by `forgot-password` still works in a later `reset-password`.
    fn demo_resets_file(&self) -> PathBuf {
        self.config.session_file.with_extension("resets.json")
    }

    fn load_demo_resets(&self) -> Vec<DemoMail> {
        let path = self.demo_resets_file();
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %path.display(), "ignoring demo reset tokens: {err}");
                return Vec::new();
            }
        };
        serde_json::from_slice(&raw).unwrap_or_else(|err| {
            warn!(path = %path.display(), "ignoring demo reset tokens: {err}");
            Vec::new()
        })
    }

    /// Persist the demo backend's unused reset tokens.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written or removed.
    pub fn save_demo_resets(&self, backend: &DemoBackend) -> Result<()> {
        let path = self.demo_resets_file();
        let pending = backend.pending_resets();
        if pending.is_empty() {
            return match fs::remove_file(&path) {
                Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err)
                    .with_context(|| format!("failed to remove {}", path.display())),
                _ => Ok(()),
            };
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, serde_json::to_vec_pretty(&pending)?)
            .with_context(|| format!("failed to write {}", path.display()))
    }

    /// Authenticator with the persisted session already restored.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be built.
    pub fn authenticator(&self) -> Result<Authenticator> {
        Ok(self.restore(self.backend()?))
    }

    /// Demo-mode authenticator together with its backend, so callers can read
    /// the demo outbox. `None` outside demo mode.
    #[must_use]
    pub fn demo_authenticator(&self) -> Option<(Authenticator, Arc<DemoBackend>)> {
        if !self.config.is_demo() {
            return None;
        }
        let backend = self.demo_backend();
        Some((self.restore(backend.clone()), backend))
    }

    fn restore(&self, backend: Arc<dyn AuthBackend>) -> Authenticator {
        let store = Arc::new(FileStore::new(self.config.session_file.clone()));
        debug!(session_file = %self.config.session_file.display(), "restoring session");

        let authenticator = Authenticator::new(backend, store)
            .with_unknown_email_disclosure(self.config.is_demo());
        authenticator.restore();
        authenticator
    }

    /// Content client carrying the session token of `authenticator`.
    ///
    /// # Errors
    /// Returns an error in demo mode or when the API base URL is invalid.
    pub fn content_client(&self, authenticator: &Authenticator) -> Result<ContentClient> {
        if self.config.is_demo() {
            bail!("content commands need the portal API; set --api-base-url and drop --demo");
        }
        ContentClient::new(&self.config, authenticator.bearer_token())
            .context("invalid portal API configuration")
    }
}
