use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed returned status {status}")]
    Status { status: u16 },

    #[error("store error: {0}")]
    Store(#[from] marquee_store::StoreError),
}
