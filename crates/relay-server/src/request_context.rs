use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use relay_core::RequestContext;
use secrecy::SecretString;

/// Header carrying the caller's stable identity
const USER_ID_HEADER: &str = "x-user-id";

/// Middleware that constructs a `RequestContext` from the incoming request
///
/// Extracts the bearer token and the caller identity header into a
/// unified context for downstream handlers
pub async fn request_context_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();

    let api_key = parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| SecretString::from(token.to_owned()));

    let user_id = parts
        .headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let context = RequestContext {
        parts: parts.clone(),
        api_key,
        user_id,
    };

    let mut request = Request::from_parts(parts, body);
    request.extensions_mut().insert(context);

    next.run(request).await
}
