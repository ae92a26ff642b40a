use thiserror::Error;

/// Transient failures talking to the forecast archive.
/// None of them abort a run, the affected value is treated as absent.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("forecast archive unreachable: {0}")]
    Transport(String),
    #[error("forecast archive answered with http status {0}")]
    Status(u16),
    #[error("malformed forecast archive document: {0}")]
    Document(String),
}
impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> FetchError {
        FetchError::Document(e.to_string())
    }
}
impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> FetchError {
        match e {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            e => FetchError::Transport(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_code_is_kept_apart_from_transport() {
        assert!(matches!(FetchError::from(ureq::Error::StatusCode(503)), FetchError::Status(503)));
        assert!(matches!(FetchError::from(ureq::Error::HostNotFound), FetchError::Transport(_)));
    }

    #[test]
    fn bad_json_is_document_error() {
        let e = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(FetchError::from(e), FetchError::Document(_)));
    }
}
