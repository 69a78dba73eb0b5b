use std::collections::HashMap;
use std::sync::OnceLock;

/// Resolves the user's login shell `PATH` and returns it as a single-entry
/// environment map.
///
/// App bundles and minimal launch environments often carry a PATH that
/// omits user-installed directories (`/opt/homebrew/bin`, `/usr/local/bin`,
/// ...). Running the login shell once to ask for its PATH and caching the
/// result avoids paying that cost per spawn.
pub fn coprocess_env() -> HashMap<String, String> {
    static CACHED_PATH: OnceLock<Option<String>> = OnceLock::new();

    let resolved_path = CACHED_PATH.get_or_init(|| {
        #[cfg(unix)]
        {
            let shell = std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string());
            match std::process::Command::new(&shell)
                .args(["-lc", "printf '%s' \"$PATH\""])
                .output()
            {
                Ok(output) if output.status.success() => {
                    let path = String::from_utf8_lossy(&output.stdout).to_string();
                    if path.is_empty() {
                        log::warn!("login shell returned empty PATH");
                        None
                    } else {
                        log::debug!("resolved login shell PATH: {path}");
                        Some(path)
                    }
                }
                Ok(output) => {
                    log::warn!("login shell PATH resolution failed (exit={})", output.status);
                    None
                }
                Err(e) => {
                    log::warn!("failed to run login shell for PATH resolution: {e}");
                    None
                }
            }
        }
        #[cfg(not(unix))]
        {
            None
        }
    });

    let mut env = HashMap::new();
    if let Some(path) = resolved_path {
        env.insert("PATH".to_string(), path.clone());
    }
    env
}
