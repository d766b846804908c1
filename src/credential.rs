//! Credential resolution.
//!
//! A [`CredentialResolver`] walks an ordered list of [`CredentialProvider`]s
//! and returns the first non-empty value.  Lower-priority providers are never
//! consulted once a higher-priority one yields.  A provider that cannot be
//! used at all (no secrets file, no terminal) counts as "absent" and
//! resolution moves on.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::observability::CREDENTIAL_MISSES;
use crate::persona::KEY_REQUIRED;
use crate::{Error, Result};

/// Name of the secrets-store key and of the environment variable.
pub const CREDENTIAL_KEY: &str = "GOOGLE_API_KEY";

/// Where a credential came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CredentialSource {
    /// The deployment secrets store.
    SecretsStore,
    /// A process environment variable.
    Environment,
    /// Typed in by the user.
    Interactive,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::SecretsStore => f.write_str("secrets store"),
            CredentialSource::Environment => f.write_str("environment"),
            CredentialSource::Interactive => f.write_str("interactive prompt"),
        }
    }
}

/// An API credential.  The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    value: String,
    source: CredentialSource,
}

impl Credential {
    /// Wrap a credential value.
    pub fn new(value: impl Into<String>, source: CredentialSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }

    /// The secret itself.
    pub fn expose(&self) -> &str {
        &self.value
    }

    /// Where the credential was found.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("value", &"***")
            .field("source", &self.source)
            .finish()
    }
}

/// One place a credential may be found.
pub trait CredentialProvider: Send + Sync {
    /// The source reported on credentials this provider yields.
    fn source(&self) -> CredentialSource;

    /// Look the credential up.
    ///
    /// `Ok(None)` means the source is usable but holds no value.  An error
    /// means the source could not be used at all.
    fn lookup(&self) -> Result<Option<String>>;
}

/// A YAML mapping file holding deployment secrets.
#[derive(Debug, Clone)]
pub struct SecretsStore {
    path: PathBuf,
}

impl SecretsStore {
    /// Default location, relative to the working directory.
    pub const DEFAULT_PATH: &'static str = ".aurora/secrets.yaml";

    /// A store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one key.  A missing or unreadable file is
    /// [`Error::SecretsUnavailable`]; a file without the key is `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(Error::secrets_unavailable(format!(
                    "no secrets file at {}",
                    self.path.display()
                )));
            }
            Err(err) => {
                return Err(Error::secrets_unavailable(format!(
                    "cannot read {}: {err}",
                    self.path.display()
                )));
            }
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        let secrets: BTreeMap<String, serde_yaml::Value> = serde_yaml::from_str(&content)
            .map_err(|err| {
                tracing::warn!(path = %self.path.display(), error = %err, "malformed secrets file");
                Error::secrets_unavailable(format!("cannot parse {}: {err}", self.path.display()))
            })?;
        Ok(secrets
            .get(key)
            .and_then(|value| value.as_str())
            .map(String::from))
    }
}

impl CredentialProvider for SecretsStore {
    fn source(&self) -> CredentialSource {
        CredentialSource::SecretsStore
    }

    fn lookup(&self) -> Result<Option<String>> {
        self.get(CREDENTIAL_KEY)
    }
}

/// A process environment variable.
#[derive(Debug, Clone)]
pub struct EnvironmentVariable {
    name: String,
}

impl EnvironmentVariable {
    /// Read the variable called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for EnvironmentVariable {
    fn default() -> Self {
        Self::new(CREDENTIAL_KEY)
    }
}

impl CredentialProvider for EnvironmentVariable {
    fn source(&self) -> CredentialSource {
        CredentialSource::Environment
    }

    fn lookup(&self) -> Result<Option<String>> {
        match env::var(&self.name) {
            Ok(value) => Ok(Some(value)),
            Err(env::VarError::NotPresent) => Ok(None),
            Err(env::VarError::NotUnicode(_)) => Err(Error::validation(format!(
                "{} is not valid unicode",
                self.name
            ))),
        }
    }
}

type PromptFn = dyn Fn() -> Result<Option<String>> + Send + Sync;

/// Ask the user.
pub struct InteractivePrompt {
    prompt: Box<PromptFn>,
}

impl InteractivePrompt {
    /// Use `prompt` to obtain the value.
    pub fn new<F>(prompt: F) -> Self
    where
        F: Fn() -> Result<Option<String>> + Send + Sync + 'static,
    {
        Self {
            prompt: Box::new(prompt),
        }
    }

    /// Prompt on the terminal without echoing what is typed.
    pub fn masked(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(move || {
            rpassword::prompt_password(&message)
                .map(Some)
                .map_err(|err| Error::io("cannot read the API key from the terminal", err))
        })
    }

    /// A value the user already supplied, e.g. through a web form.
    pub fn answered(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::new(move || Ok(Some(value.clone())))
    }
}

impl CredentialProvider for InteractivePrompt {
    fn source(&self) -> CredentialSource {
        CredentialSource::Interactive
    }

    fn lookup(&self) -> Result<Option<String>> {
        (self.prompt)()
    }
}

/// Ordered credential lookup.
#[derive(Default)]
pub struct CredentialResolver {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialResolver {
    /// An empty resolver; it resolves nothing until providers are added.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with lower priority than every provider so far.
    pub fn with_provider(mut self, provider: impl CredentialProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Number of providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns true if no provider was added.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Return the first non-empty credential, or
    /// [`Error::MissingCredential`] if every provider came up empty.
    pub fn resolve(&self) -> Result<Credential> {
        for provider in &self.providers {
            let source = provider.source();
            match provider.lookup() {
                Ok(Some(value)) if !value.trim().is_empty() => {
                    tracing::debug!(%source, "credential resolved");
                    return Ok(Credential::new(value.trim(), source));
                }
                Ok(_) => {
                    tracing::debug!(%source, "no credential");
                }
                Err(err) if err.is_secrets_unavailable() => {
                    tracing::debug!(%source, error = %err, "source not configured");
                }
                Err(err) => {
                    tracing::warn!(%source, error = %err, "credential source failed");
                }
            }
        }
        CREDENTIAL_MISSES.click();
        Err(Error::missing_credential(KEY_REQUIRED))
    }
}

/// Resolve `GOOGLE_API_KEY` from the secrets store at `secrets`, then the
/// environment, then a masked terminal prompt.
pub fn resolve_credential(secrets: &Path) -> Result<Credential> {
    CredentialResolver::new()
        .with_provider(SecretsStore::new(secrets))
        .with_provider(EnvironmentVariable::default())
        .with_provider(InteractivePrompt::masked("Enter your Google API Key: "))
        .resolve()
}
