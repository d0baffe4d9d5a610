pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested fanout bound cannot usefully limit directory size.
    #[error("max_children must be at least 100, got {0}")]
    MaxChildrenTooSmall(u64),
}
