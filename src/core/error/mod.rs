use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid engine state: {0}")]
    InvalidState(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("unable to spawn render thread {index}: {source}")]
    ThreadSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("render thread {0} panicked")]
    ThreadPanicked(usize),
    #[error("photon GI cache: {0}")]
    PhotonGI(String),
    #[error("film: {0}")]
    Film(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

impl RenderError {
    pub fn config(msg: &str) -> Self {
        RenderError::Config(String::from(msg))
    }

    pub fn invalid_state(msg: &str) -> Self {
        RenderError::InvalidState(String::from(msg))
    }
}
