pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Unsupported command: {0:?}")]
    UnsupportedCommand(String),
    
    #[error("Invalid argument for {command}: {value:?}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}
