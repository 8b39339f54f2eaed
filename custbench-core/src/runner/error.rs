pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("`max_active_requests` must be a positive integer")]
    InvalidMaxActive,

    #[error("`max_total_requests` must be a positive integer")]
    InvalidMaxTotal,

    #[error("`max_wait_iterations` must be a positive integer")]
    InvalidMaxWaitIterations,

    #[error("`wait_poll_interval` must be a positive duration")]
    InvalidWaitPollInterval,

    #[error("host identity must not be empty")]
    EmptyHostId,
}
