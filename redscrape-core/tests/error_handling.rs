use redscrape_core::{
    ConfigError, CoreError, ErrorExt, ErrorReporter, ExportError, RedditApiError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_ID".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");

    let export_error = CoreError::Export(ExportError::OutputDirectory {
        path: "/nowhere".to_string(),
    });
    assert_eq!(export_error.error_code(), "EXPORT");

    let not_found = RedditApiError::SubredditNotFound {
        subreddit: "nope".to_string(),
    };
    assert_eq!(not_found.error_code(), "REDDIT_SUBREDDIT_NOT_FOUND");

    let utf8 = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
    let encoding_error = ExportError::from(utf8);
    assert_eq!(encoding_error.error_code(), "EXPORT_INVALID_UTF8");
    assert!(encoding_error.to_string().starts_with("Exported text is not valid UTF-8"));
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 });
    assert!(server_error.is_retryable());

    let not_found = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "nope".to_string(),
    });
    assert!(!not_found.is_retryable());

    let non_retryable_error = CoreError::Config(ConfigError::MissingField {
        field: "reddit_client_id".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );

    let timeout_error = CoreError::RedditApi(RedditApiError::RequestTimeout);
    assert_eq!(timeout_error.retry_after(), Some(Duration::from_secs(30)));

    let invalid = CoreError::InvalidInput {
        message: "bad filter".to_string(),
    };
    assert_eq!(invalid.retry_after(), None);
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let missing = CoreError::RedditApi(RedditApiError::SubredditNotFound {
        subreddit: "doesnotexist".to_string(),
    });
    assert!(missing.user_friendly_message().contains("doesnotexist"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "REDDIT_CLIENT_SECRET".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("REDDIT_CLIENT_SECRET"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();
    let warning = CoreError::InvalidInput {
        message: "r/rust: start date is after end date".to_string(),
    };
    reporter.report_warning(&warning);
    assert!(std::ptr::eq(warning.log_warn(), &warning));
    assert!(!warning.is_retryable());

    let error = CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 5 });
    reporter.report_error(&error);
    assert_eq!(error.retry_after(), Some(Duration::from_secs(5)));
}

#[test]
fn test_thread_errors() {
    let bad_url = RedditApiError::InvalidPostUrl {
        url: "https://example.com/x".to_string(),
    };
    assert_eq!(bad_url.error_code(), "REDDIT_INVALID_POST_URL");
    assert!(!bad_url.is_retryable());
    assert_eq!(bad_url.to_string(), "Invalid post URL: https://example.com/x");

    let gone = CoreError::from(RedditApiError::PostNotFound {
        post_id: "abc123".to_string(),
    });
    assert!(matches!(
        gone,
        CoreError::RedditApi(RedditApiError::PostNotFound { .. })
    ));
    assert!(!gone.is_retryable());
}

#[test]
fn test_io_error_conversion() {
    let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
    let error = CoreError::from(io);
    assert!(error.to_string().contains("read-only"));
    assert_eq!(error.retry_after(), None);
}
