use thiserror::Error;

use crate::endpoint::Endpoint;

#[derive(Error, Debug)]
pub enum TwitterError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("request returned an error: {status} {body}")]
    Request { status: u16, body: String },

    #[error("unexpected {endpoint} response: {msg}")]
    DataShape { endpoint: Endpoint, msg: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl TwitterError {
    pub(crate) fn data_shape(endpoint: Endpoint, msg: impl Into<String>) -> Self {
        Self::DataShape {
            endpoint,
            msg: msg.into(),
        }
    }
}

pub type TwitterResult<T> = Result<T, TwitterError>;
