use std::{env, fs, path::Path, time::Duration};

use crate::{errors::Error, Result};

/// Typed configuration for the worker, loaded from the environment.
#[derive(Clone, Debug)]
pub struct Config {
    /// Record-store endpoint receiving gift-received records.
    pub gift_received_url: String,
    /// Compensation endpoint notified after failed transfers.
    pub transfer_failed_url: String,
    /// Optional bearer token sent on both backend calls.
    pub backend_auth_token: Option<String>,

    pub http_timeout: Duration,
    pub dedup_window_size: usize,
    pub max_withdraw_batch: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let gift_received_url = env_str("BACKEND_GIFT_RECEIVED_URL")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config(
                    "BACKEND_GIFT_RECEIVED_URL environment variable is required".to_string(),
                )
            })?;
        let transfer_failed_url = env_str("BACKEND_TRANSFER_FAILED_URL")
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config(
                    "BACKEND_TRANSFER_FAILED_URL environment variable is required".to_string(),
                )
            })?;

        let backend_auth_token = env_str("BACKEND_AUTH_TOKEN").and_then(non_empty);

        let http_timeout = Duration::from_millis(env_u64("HTTP_TIMEOUT_MS").unwrap_or(10_000));
        let dedup_window_size = env_usize("DEDUP_WINDOW_SIZE").unwrap_or(100);
        let max_withdraw_batch =
            env_usize("MAX_WITHDRAW_BATCH").unwrap_or(crate::withdraw::MAX_BATCH_GIFTS);

        Ok(Self {
            gift_received_url,
            transfer_failed_url,
            backend_auth_token,
            http_timeout,
            dedup_window_size,
            max_withdraw_batch,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_usize(key: &str) -> Option<usize> {
    env_str(key).and_then(|s| s.trim().parse::<usize>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
