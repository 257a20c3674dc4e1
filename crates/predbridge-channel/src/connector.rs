use std::thread;

use predbridge_transport::TransportError;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{ChannelError, Result};

/// Run `attempt` until it succeeds or the policy's attempts are used up,
/// sleeping with exponential backoff in between.
pub fn connect_with_retry<T>(
    policy: &RetryPolicy,
    endpoint: &str,
    mut attempt: impl FnMut() -> std::result::Result<T, TransportError>,
) -> Result<T> {
    let attempts = policy.total_attempts();
    let mut tried = 0u32;
    loop {
        tried += 1;
        match attempt() {
            Ok(value) => {
                debug!(endpoint, attempt = tried, "connection established");
                return Ok(value);
            }
            Err(source) if tried >= attempts => {
                return Err(ChannelError::Connect {
                    attempts: tried,
                    source,
                });
            }
            Err(err) => {
                let delay = policy.backoff(tried);
                warn!(endpoint, attempt = tried, error = %err, ?delay, "connection attempt failed; retrying");
                thread::sleep(delay);
            }
        }
    }
}
