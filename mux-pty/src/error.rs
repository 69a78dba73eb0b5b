use thiserror::Error;

#[derive(Debug, Error)]
pub enum PtyError {
    #[error("failed to open pty: {0}")]
    Open(#[source] anyhow::Error),

    #[error("failed to spawn command: {0}")]
    Spawn(#[source] anyhow::Error),

    #[error("failed to resize pty: {0}")]
    Resize(#[source] anyhow::Error),

    #[error("pty write failed: {0}")]
    Write(#[source] std::io::Error),

    #[error("pty read failed: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to wait on child process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("failed to kill child process: {0}")]
    Kill(#[source] std::io::Error),
}
