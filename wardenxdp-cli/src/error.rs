#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("invalid IP address '{0}'")]
    BadAddress(String),

    #[error(transparent)]
    Loader(#[from] wardenxdp_loader::LoaderError),
}
