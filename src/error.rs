use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("configuration error")]
    Config,
    #[display("inventory store error")]
    Store,
    #[display("pipeline error")]
    Pipeline,
    #[display("unknown remote provider: {_0}")]
    UnknownProvider(#[error(not(source))] String),
}
