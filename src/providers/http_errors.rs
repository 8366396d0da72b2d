use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

/// Walks the source chain looking for a matching io error kind or a
/// message fragment, since reqwest buries the io error several levels deep.
fn error_chain_matches(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(source) = current {
        if let Some(io_err) = source.downcast_ref::<std::io::Error>()
            && io_err.kind() == kind
        {
            return true;
        }
        if source.to_string().to_ascii_lowercase().contains(needle) {
            return true;
        }
        current = source.source();
    }
    false
}

pub(crate) fn api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_matches(&err, ErrorKind::TimedOut, "timed out") {
        return anyhow!(
            "Request timed out after {}s while calling '{}'. \
             Increase GEMINI_TIMEOUT_SECS or try again later.",
            timeout_secs,
            api_url
        );
    }

    if err.is_connect() {
        if error_chain_matches(&err, ErrorKind::ConnectionRefused, "connection refused") {
            return anyhow!(
                "Connection refused by the Gemini API at '{}'. \
                 Check GEMINI_BASE_URL if you overrode the endpoint.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to the Gemini API at '{}'. \
             Check network connectivity and GEMINI_BASE_URL.",
            api_url
        );
    }

    anyhow!("Failed to call the Gemini API at '{}': {}", api_url, err)
}
