//! Site orchestration: one full generation run.
//!
//! ```text
//! prepare_directories ─► GenerationLock ─► create_output_dirs ─► load_site_content ─► publish_site
//!                        generating/gen.lock                         load, dates, link     both themes
//! ```
//!
//! The lock guard lives for the whole run and is released on every exit
//! path, including errors. A run that finds the lock already present fails
//! with [`GenerateError::LockHeld`] and leaves the lock file alone.
//!
//! [`check_site`] stops after linking: no lock, no output written.

use crate::compose::{self, ComposeError, PublishTally};
use crate::config::{ConfigError, SiteConfiguration};
use crate::content::SiteContent;
use crate::dates::{BuiltinDateResolver, DateResolver, ExternalDateResolver};
use crate::loader::{self, LoadError, LoadSummary};
use crate::lock::{GenerationLock, LockError};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

pub const EXIT_BAD_PARAMETERS: u8 = 1;
pub const EXIT_BAD_CONFIGURATION: u8 = 2;
pub const EXIT_GENERATION_FAILED: u8 = 3;
pub const EXIT_LOCK_HELD: u8 = 4;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("generation already running: lock {} exists", .0.display())]
    LockHeld(PathBuf),
    #[error(transparent)]
    Lock(LockError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl From<LockError> for GenerateError {
    fn from(error: LockError) -> Self {
        match error {
            LockError::Held(path) => GenerateError::LockHeld(path),
            other => GenerateError::Lock(other),
        }
    }
}

impl GenerateError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            GenerateError::Config(_) => EXIT_BAD_CONFIGURATION,
            GenerateError::LockHeld(_) => EXIT_LOCK_HELD,
            GenerateError::Lock(_) | GenerateError::Load(_) | GenerateError::Compose(_) => {
                EXIT_GENERATION_FAILED
            }
        }
    }
}

/// Where post dates are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateSource {
    /// The configured `DATE_COMMAND`, GNU date compatible.
    #[default]
    External,
    /// In-process chrono parsing.
    Builtin,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub date_source: DateSource,
}

/// What a generation run did.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub tally: PublishTally,
    pub summary: LoadSummary,
    pub posts: usize,
    pub publishable: usize,
}

pub fn date_resolver(config: &SiteConfiguration, source: DateSource) -> Box<dyn DateResolver> {
    match source {
        DateSource::External => Box::new(ExternalDateResolver::new(
            config.date_command.clone(),
            &config.generating_dir(),
        )),
        DateSource::Builtin => Box::new(BuiltinDateResolver::new()),
    }
}

/// Load, link and publish the whole site under the generation lock.
pub fn generate_site(
    config: &SiteConfiguration,
    options: &GenerateOptions,
) -> Result<GenerationReport, GenerateError> {
    config.prepare_directories()?;
    let _lock = GenerationLock::acquire(&config.generating_dir())?;
    config.create_output_dirs()?;

    let resolver = date_resolver(config, options.date_source);
    let (site, summary) = loader::load_site_content(config, resolver.as_ref())?;
    let tally = compose::publish_site(&site, config)?;

    info!(
        updated = tally.written(),
        unchanged = tally.unchanged,
        removed = tally.removed.len(),
        "generation finished"
    );
    Ok(GenerationReport {
        tally,
        summary,
        posts: site.posts.len(),
        publishable: site.publishable_posts().count(),
    })
}

/// Load and link the content tree without writing any page.
pub fn check_site(
    config: &SiteConfiguration,
    options: &GenerateOptions,
) -> Result<(SiteContent, LoadSummary), GenerateError> {
    config.check_content_directories()?;
    let resolver = date_resolver(config, options.date_source);
    Ok(loader::load_site_content(config, resolver.as_ref())?)
}
