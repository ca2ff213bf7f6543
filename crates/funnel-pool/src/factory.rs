use funnel_common::protocol::{FunnelError, Result};

use crate::worker::Worker;

/// Produces not-yet-started workers, decoupling the dispatcher from how a
/// worker process is actually configured and spawned.
pub trait WorkerFactory: Send + Sync {
    /// Builds a new worker pinned to `port`. The worker has not been
    /// started; the caller owns its lifecycle.
    fn create(&self, port: u16) -> Result<Worker>;
}

/// The standard factory: spawns workers from a whitespace-delimited command
/// template.
///
/// The template is parsed once at construction. Factories hold no OS
/// resources between `create` calls and are cheap to clone.
#[derive(Debug, Clone)]
pub struct CommandFactory {
    command: Vec<String>,
}

impl CommandFactory {
    /// Parses the command template.
    ///
    /// # Errors
    ///
    /// `IllegalArgument` when the template contains no command word.
    pub fn new(template: &str) -> Result<Self> {
        let command: Vec<String> = template.split_whitespace().map(str::to_string).collect();
        if command.is_empty() {
            return Err(FunnelError::IllegalArgument(format!(
                "worker command template is empty: {template:?}"
            )));
        }
        Ok(Self { command })
    }
}

impl WorkerFactory for CommandFactory {
    fn create(&self, port: u16) -> Result<Worker> {
        Worker::new(port, self.command.clone())
    }
}
