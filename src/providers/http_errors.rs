use anyhow::anyhow;
use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io::ErrorKind;

fn error_chain_has_kind(
    err: &(dyn StdError + 'static),
    kind: ErrorKind,
    needle: &str,
) -> bool {
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

fn error_chain_has_connection_refused(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::ConnectionRefused, "connection refused")
}

fn error_chain_has_timeout(err: &(dyn StdError + 'static)) -> bool {
    error_chain_has_kind(err, ErrorKind::TimedOut, "timed out")
}

pub(crate) fn model_api_request_error(
    err: reqwest::Error,
    api_url: &str,
    timeout_secs: u64,
) -> anyhow::Error {
    if err.is_timeout() || error_chain_has_timeout(&err) {
        return anyhow!(
            "Model request timed out after {}s while calling '{}'. \
             The model may be cold-starting; retry or increase MODEL_TIMEOUT_SECS.",
            timeout_secs,
            api_url
        );
    }

    if err.is_connect() {
        if error_chain_has_connection_refused(&err) {
            return anyhow!(
                "Connection refused by inference API at '{}'. \
                 Check MODEL_BASE_URL.",
                api_url
            );
        }

        return anyhow!(
            "Failed to connect to inference API at '{}'. \
             Check MODEL_BASE_URL and network connectivity.",
            api_url
        );
    }

    anyhow!("Failed to call inference API at '{}': {}", api_url, err)
}

/// Maps a non-success response into a message the error panel can show as-is.
/// `detail` is the provider's own error text when the body carried one.
pub(crate) fn model_api_status_error(
    status: StatusCode,
    detail: &str,
    model: &str,
) -> anyhow::Error {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => anyhow!(
            "Inference API rejected the credentials (status {}): {}. \
             Check that HUGGINGFACE_API_KEY holds a valid token including the 'hf_' prefix.",
            status,
            detail
        ),
        StatusCode::NOT_FOUND => anyhow!(
            "Model '{}' was not found on the inference API (status {}): {}",
            model,
            status,
            detail
        ),
        StatusCode::SERVICE_UNAVAILABLE => anyhow!(
            "Model '{}' is unavailable or still loading (status {}): {}",
            model,
            status,
            detail
        ),
        _ => anyhow!("Model request failed with status {}: {}", status, detail),
    }
}

#[cfg(test)]
mod tests {
    use super::{error_chain_has_timeout, model_api_request_error, model_api_status_error};
    use reqwest::{Client, StatusCode};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    fn free_local_addr() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        drop(listener);
        addr
    }

    #[tokio::test]
    async fn maps_connection_refused_errors_to_actionable_message() {
        let addr = free_local_addr();
        let api_url = format!("http://{}/models/gpt2", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(300))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with connection-refused");
        let mapped = model_api_request_error(req_err, &api_url, 1);
        let msg = format!("{mapped:#}");

        assert!(
            msg.contains("Connection refused by inference API"),
            "unexpected message: {msg}"
        );
        assert!(msg.contains("MODEL_BASE_URL"), "unexpected message: {msg}");
    }

    #[tokio::test]
    async fn maps_timeout_errors_to_actionable_message() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind should succeed");
        let addr = listener.local_addr().expect("address should be available");
        let server = thread::spawn(move || {
            let (_stream, _) = listener.accept().expect("accept should succeed");
            thread::sleep(Duration::from_secs(1));
        });

        let api_url = format!("http://{}/models/gpt2", addr);
        let client = Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("client should build");

        let req_err = client
            .post(&api_url)
            .send()
            .await
            .expect_err("request should fail with timeout");
        let mapped = model_api_request_error(req_err, &api_url, 2);
        let msg = format!("{mapped:#}");

        assert!(
            msg.contains("Model request timed out after 2s"),
            "unexpected message: {msg}"
        );
        assert!(
            msg.contains("MODEL_TIMEOUT_SECS"),
            "unexpected message: {msg}"
        );

        server.join().expect("server thread should join");
    }

    #[test]
    fn detects_timeout_from_error_kind() {
        let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        assert!(error_chain_has_timeout(&err));
    }

    #[test]
    fn status_errors_name_the_remedy() {
        let auth = format!(
            "{:#}",
            model_api_status_error(StatusCode::UNAUTHORIZED, "Invalid token", "gpt2")
        );
        assert!(auth.contains("HUGGINGFACE_API_KEY"), "unexpected message: {auth}");
        assert!(auth.contains("Invalid token"), "unexpected message: {auth}");

        let loading = format!(
            "{:#}",
            model_api_status_error(
                StatusCode::SERVICE_UNAVAILABLE,
                "Model gpt2 is currently loading",
                "gpt2"
            )
        );
        assert!(loading.contains("still loading"), "unexpected message: {loading}");

        let other = format!(
            "{:#}",
            model_api_status_error(StatusCode::BAD_REQUEST, "bad input", "gpt2")
        );
        assert!(
            other.contains("Model request failed with status 400 Bad Request: bad input"),
            "unexpected message: {other}"
        );
    }
}
