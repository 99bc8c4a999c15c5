//! # Quotesync Client
//!
//! Keeps a local quote collection in step with a remote copy.
//!
//! The [`SyncOrchestrator`] owns the collection and runs sync cycles:
//! fetch the remote snapshot, merge it with `quotesync-engine`, ask a
//! [`ConflictResolver`] about each conflict, then commit and persist. The
//! [`Scheduler`] runs cycles periodically or on demand, never two at once.
//!
//! Collaborators sit behind traits so they can be swapped:
//! - [`LocalStore`] - key-value persistence ([`MemoryStore`], [`FileStore`])
//! - [`RemoteSource`] - snapshot fetch ([`HttpRemote`], [`FixedRemote`])
//! - [`ConflictResolver`] - decisions ([`AutoResolver`], [`PromptResolver`])

pub mod config;
pub mod error;
pub mod orchestrator;
pub mod remote;
pub mod resolver;
pub mod scheduler;
pub mod storage;

pub use config::{Config, ConfigError, RemoteFormat};
pub use error::{Result, StorageError, SyncError};
pub use orchestrator::{AddReport, ImportReport, SyncOrchestrator, SyncReport};
pub use remote::{
    post_item_mapper, quote_item_mapper, FixedRemote, HttpRemote, ItemMapper, RawServerItem,
    RemoteSource,
};
pub use resolver::{AutoResolver, ConflictResolver, PromptRequest, PromptResolver, ResolverMode};
pub use scheduler::{Scheduler, SyncOutcomes};
pub use storage::{FileStore, LocalStore, MemoryStore};

use std::sync::Arc;
use tokio::sync::mpsc;

/// A configured orchestrator plus, in prompt mode, where its questions arrive.
pub struct Client {
    pub orchestrator: Arc<SyncOrchestrator>,
    pub prompts: Option<mpsc::Receiver<PromptRequest>>,
}

/// Wire up store, remote and resolver from configuration.
pub fn build_client(config: &Config) -> Result<Client> {
    let store = Arc::new(FileStore::open(&config.storage_dir)?);
    let remote = Arc::new(HttpRemote::new(&config.server_url, config.http_timeout)?);

    let (resolver, prompts): (Arc<dyn ConflictResolver>, _) = match config.resolution {
        ResolverMode::Prompt => {
            let (resolver, prompts) = PromptResolver::channel();
            (Arc::new(resolver), Some(prompts))
        }
        ResolverMode::Auto(policy) => (Arc::new(AutoResolver::new(policy)), None),
    };

    let orchestrator = SyncOrchestrator::new(store, remote, resolver)
        .with_mapper(config.remote_format.mapper());

    Ok(Client {
        orchestrator: Arc::new(orchestrator),
        prompts,
    })
}
