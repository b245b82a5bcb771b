/// REST client for the analysis backend
///
/// Requests go through [`HttpTransport`] so the response handling below can be
/// exercised without a network. [`ReqwestTransport`] is the real thing; on
/// wasm32 reqwest sits on top of `fetch`.
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::analysis::AnalysisInput;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::model::{
    AnalysisResult, AnalyzeResponse, CategoryStat, Credentials, DashboardEntry, LoginResponse,
    MeResponse, MessageResponse, SaveResponse, SourceStat, SsoTicketResponse, TimelinePoint,
    Topics,
};

/// Header carrying the session token on authenticated calls
pub const TOKEN_HEADER: &str = "x-access-token";

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::GET,
            path: path.to_string(),
            token: None,
            body: None,
        }
    }

    pub fn post(path: &str, body: Option<Value>) -> ApiRequest {
        ApiRequest {
            method: Method::POST,
            path: path.to_string(),
            token: None,
            body,
        }
    }

    pub fn delete(path: &str) -> ApiRequest {
        ApiRequest {
            method: Method::DELETE,
            path: path.to_string(),
            token: None,
            body: None,
        }
    }

    pub fn with_token(mut self, token: &str) -> ApiRequest {
        self.token = Some(token.to_string());
        self
    }
}

/// Raw status and body. Decoding is left to [`decode`] so malformed bodies can
/// be told apart from transport failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpTransport {
    async fn execute(&self, request: ApiRequest) -> AppResult<ApiResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    config: Config,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> ReqwestTransport {
        ReqwestTransport {
            client: reqwest::Client::new(),
            config: config.clone(),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: ApiRequest) -> AppResult<ApiResponse> {
        let mut builder = self
            .client
            .request(request.method, self.config.endpoint(&request.path));

        if let Some(token) = &request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(ApiResponse { status, body })
    }
}

/// Turn a raw response into `R`.
///
/// - non-2xx: the server's `message` when it sent one, else a status message;
///   401/403 become [`AppError::Unauthorized`]
/// - 2xx with a body that is not JSON, or not the expected shape:
///   [`AppError::MalformedResponse`]
pub fn decode<R: DeserializeOwned>(response: &ApiResponse) -> AppResult<R> {
    if !response.is_success() {
        return Err(status_error(response));
    }

    let value: Value =
        serde_json::from_str(&response.body).map_err(|_| AppError::MalformedResponse)?;

    serde_json::from_value(value).map_err(|e| {
        log::warn!("Unexpected response shape: {}", e);
        AppError::MalformedResponse
    })
}

fn status_error(response: &ApiResponse) -> AppError {
    let message = serde_json::from_str::<MessageResponse>(&response.body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.trim().is_empty());

    match response.status {
        401 | 403 => AppError::Unauthorized(
            message.unwrap_or_else(|| "Your session is no longer valid. Please log in again.".to_string()),
        ),
        status => AppError::Server {
            status,
            message: message.unwrap_or_else(|| format!("Request failed with status {}", status)),
        },
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient<T> {
    transport: T,
}

impl<T: HttpTransport> ApiClient<T> {
    pub fn new(transport: T) -> ApiClient<T> {
        ApiClient { transport }
    }

    async fn call<R: DeserializeOwned>(&self, request: ApiRequest) -> AppResult<R> {
        log::debug!("{} /{}", request.method, request.path.trim_start_matches('/'));
        let response = self.transport.execute(request).await?;
        decode(&response)
    }

    pub async fn login(&self, credentials: &Credentials) -> AppResult<LoginResponse> {
        self.call(ApiRequest::post("/login", Some(json!(credentials))))
            .await
    }

    pub async fn register(&self, credentials: &Credentials) -> AppResult<MessageResponse> {
        self.call(ApiRequest::post("/register", Some(json!(credentials))))
            .await
    }

    /// Who does this token belong to? Fails when the token was revoked.
    pub async fn me(&self, token: &str) -> AppResult<MeResponse> {
        self.call(ApiRequest::get("/me").with_token(token)).await
    }

    pub async fn analyze(&self, input: &AnalysisInput, token: &str) -> AppResult<AnalysisResult> {
        input.validate()?;

        let response: AnalyzeResponse = self
            .call(ApiRequest::post("/analyze", Some(input.to_body())).with_token(token))
            .await?;

        response.data.ok_or_else(|| AppError::Server {
            status: 200,
            message: response
                .message
                .unwrap_or_else(|| "Analysis failed.".to_string()),
        })
    }

    pub async fn save_analysis(&self, result: &AnalysisResult, token: &str) -> AppResult<SaveResponse> {
        let mut body = serde_json::to_value(result)
            .map_err(|e| AppError::Validation(format!("Could not encode result: {}", e)))?;
        if let Value::Object(fields) = &mut body {
            fields.insert("save_to_history".to_string(), Value::Bool(true));
        }

        self.call(ApiRequest::post("/save_analysis", Some(body)).with_token(token))
            .await
    }

    pub async fn dashboard(&self, token: &str) -> AppResult<Vec<DashboardEntry>> {
        self.call(ApiRequest::get("/dashboard").with_token(token)).await
    }

    pub async fn category_analysis(&self, token: &str) -> AppResult<Vec<CategoryStat>> {
        self.call(ApiRequest::get("/category_analysis").with_token(token))
            .await
    }

    pub async fn source_analysis(&self, token: &str) -> AppResult<Vec<SourceStat>> {
        self.call(ApiRequest::get("/source_analysis").with_token(token))
            .await
    }

    pub async fn sentiment_timeline(&self, token: &str) -> AppResult<Vec<TimelinePoint>> {
        self.call(ApiRequest::get("/sentiment_timeline").with_token(token))
            .await
    }

    pub async fn topics(&self, token: &str) -> AppResult<Topics> {
        self.call(ApiRequest::get("/topics").with_token(token)).await
    }

    pub async fn create_topic(&self, name: &str, token: &str) -> AppResult<MessageResponse> {
        self.call(ApiRequest::post("/topics", Some(json!({ "name": name }))).with_token(token))
            .await
    }

    pub async fn move_article(&self, article_id: i64, new_category: &str, token: &str) -> AppResult<MessageResponse> {
        let body = json!({ "article_id": article_id, "new_category": new_category });
        self.call(ApiRequest::post("/move_article", Some(body)).with_token(token))
            .await
    }

    pub async fn generate_sso_ticket(&self, token: &str) -> AppResult<String> {
        let response: SsoTicketResponse = self
            .call(ApiRequest::post("/generate_sso_ticket", None).with_token(token))
            .await?;

        response
            .sso_ticket
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Server {
                status: 200,
                message: "No dashboard ticket was issued.".to_string(),
            })
    }

    pub async fn redeem_sso_ticket(&self, ticket: &str) -> AppResult<LoginResponse> {
        self.call(ApiRequest::post(
            "/redeem_sso_ticket",
            Some(json!({ "sso_ticket": ticket })),
        ))
        .await
    }

    /// Trade a Google access token for an application token
    pub async fn exchange_google_token(&self, access_token: &str) -> AppResult<LoginResponse> {
        self.call(ApiRequest::post(
            "/auth/google/token",
            Some(json!({ "access_token": access_token })),
        ))
        .await
    }

    pub async fn delete_account(&self, token: &str) -> AppResult<MessageResponse> {
        self.call(ApiRequest::delete("/account/delete").with_token(token))
            .await
    }

    pub async fn request_password_reset(&self, username: &str) -> AppResult<MessageResponse> {
        self.call(ApiRequest::post(
            "/request-password-reset",
            Some(json!({ "username": username })),
        ))
        .await
    }

    pub async fn perform_password_reset(&self, reset_token: &str, new_password: &str) -> AppResult<MessageResponse> {
        self.call(ApiRequest::post(
            "/perform-password-reset",
            Some(json!({ "token": reset_token, "new_password": new_password })),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, response};

    #[test]
    fn test_decode_success() {
        let me: MeResponse = decode(&response(200, r#"{"email": "reader@example.org"}"#)).unwrap();
        assert_eq!(me.email, "reader@example.org");
    }

    #[test]
    fn test_decode_html_body_is_malformed() {
        let result: AppResult<AnalyzeResponse> =
            decode(&response(200, "<!DOCTYPE html><html><body>Blocked</body></html>"));

        assert_eq!(result.unwrap_err(), AppError::MalformedResponse);
    }

    #[test]
    fn test_decode_wrong_shape_is_malformed() {
        let result: AppResult<Vec<DashboardEntry>> = decode(&response(200, r#"{"oops": true}"#));
        assert_eq!(result.unwrap_err(), AppError::MalformedResponse);
    }

    #[test]
    fn test_decode_prefers_server_message() {
        let result: AppResult<MessageResponse> =
            decode(&response(409, r#"{"message": "User already exists"}"#));

        assert_eq!(
            result.unwrap_err(),
            AppError::Server { status: 409, message: "User already exists".to_string() }
        );
    }

    #[test]
    fn test_decode_falls_back_to_status_message() {
        let result: AppResult<MessageResponse> = decode(&response(502, "<html>Bad gateway</html>"));

        assert_eq!(
            result.unwrap_err(),
            AppError::Server { status: 502, message: "Request failed with status 502".to_string() }
        );
    }

    #[test]
    fn test_decode_unauthorized() {
        let result: AppResult<MeResponse> = decode(&response(401, r#"{"message": "Token is invalid!"}"#));
        assert_eq!(result.unwrap_err(), AppError::Unauthorized("Token is invalid!".to_string()));
    }

    #[tokio::test]
    async fn test_authenticated_calls_carry_token() {
        let transport = ScriptedTransport::new();
        transport.respond(Method::GET, "/me", response(200, r#"{"email": "a@b.c"}"#));
        let api = ApiClient::new(transport.clone());

        api.me("secret-token").await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].token.as_deref(), Some("secret-token"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_html_error_page() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::POST,
            "/analyze",
            response(200, "<!DOCTYPE html><html><head><title>Access denied</title></head></html>"),
        );
        let api = ApiClient::new(transport);

        let err = api
            .analyze(&AnalysisInput::Url("https://news.example.org/a".to_string()), "t")
            .await
            .unwrap_err();

        assert_eq!(err, AppError::MalformedResponse);
    }

    #[tokio::test]
    async fn test_analyze_without_data_uses_message() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::POST,
            "/analyze",
            response(200, r#"{"status": "error", "message": "Could not extract text"}"#),
        );
        let api = ApiClient::new(transport);

        let err = api
            .analyze(&AnalysisInput::Url("https://news.example.org/a".to_string()), "t")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Could not extract text");
    }

    #[tokio::test]
    async fn test_analyze_validation_happens_before_network() {
        let transport = ScriptedTransport::new();
        let api = ApiClient::new(transport.clone());

        let err = api
            .analyze(&AnalysisInput::Url("   ".to_string()), "t")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_save_analysis_marks_history() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::POST,
            "/save_analysis",
            response(200, r#"{"message": "Saved", "count": 12}"#),
        );
        let api = ApiClient::new(transport.clone());
        let result = AnalysisResult {
            title: "Title".to_string(),
            author: None,
            publisher: None,
            publish_date: None,
            url: None,
            sentiment: 0.3,
            keywords: vec!["one".to_string()],
            article_text: None,
            category: None,
        };

        let saved = api.save_analysis(&result, "t").await.unwrap();

        assert_eq!(saved, SaveResponse { message: "Saved".to_string(), count: 12 });
        let body = transport.requests()[0].body.clone().unwrap();
        assert_eq!(body["save_to_history"], Value::Bool(true));
        assert_eq!(body["title"], "Title");
    }

    #[tokio::test]
    async fn test_generate_sso_ticket_requires_ticket() {
        let transport = ScriptedTransport::new();
        transport.respond(Method::POST, "/generate_sso_ticket", response(200, "{}"));
        let api = ApiClient::new(transport);

        assert!(api.generate_sso_ticket("t").await.is_err());
    }

    #[tokio::test]
    async fn test_transport_error_passes_through() {
        let transport = ScriptedTransport::new();
        transport.fail(Method::GET, "/dashboard", "connection refused");
        let api = ApiClient::new(transport);

        let err = api.dashboard("t").await.unwrap_err();

        assert_eq!(err, AppError::Transport("connection refused".to_string()));
    }
}
