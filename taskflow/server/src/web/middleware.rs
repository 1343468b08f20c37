use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::trace::MakeSpan;
use tracing::Span;

const CREDENTIAL_PATH_SUFFIXES: [&str; 2] = ["/users/login", "/users/register"];

/// Custom span maker that flags routes carrying credentials in their body.
/// Headers and bodies are never recorded on the span.
#[derive(Clone, Debug, Default)]
pub struct FilteredMakeSpan;

impl<B> MakeSpan<B> for FilteredMakeSpan {
    fn make_span(&mut self, request: &Request<B>) -> Span {
        let uri = request.uri();
        let method = request.method();
        let matched_path = request
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str);

        if is_credential_route(uri.path()) {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
                sensitive_route = true,
            )
        } else {
            tracing::info_span!(
                "request",
                method = %method,
                uri = %uri,
                matched_path,
            )
        }
    }
}

fn is_credential_route(path: &str) -> bool {
    CREDENTIAL_PATH_SUFFIXES
        .iter()
        .any(|suffix| path.ends_with(suffix))
}
