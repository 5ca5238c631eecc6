//! IAM token exchange.
//!
//! Trades the long-lived OAuth token for a short-lived IAM token. Tokens
//! are not cached; every completion call performs a fresh exchange.
//! Docs: <https://yandex.cloud/docs/iam/operations/iam-token/create>

use prorab_core::error::ProrabError;
use serde::{Deserialize, Serialize};
use tracing::debug;

const IAM_TOKEN_URL: &str = "https://iam.api.cloud.yandex.net/iam/v1/tokens";

#[derive(Serialize)]
struct IamTokenRequest<'a> {
    #[serde(rename = "yandexPassportOauthToken")]
    yandex_passport_oauth_token: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IamTokenResponse {
    #[serde(rename = "iamToken")]
    pub iam_token: Option<String>,
}

/// Exchange the OAuth credential for a fresh IAM token.
///
/// Fails with `Config` before any network call when the credential is empty,
/// and with `Auth` on any exchange failure. No retry.
pub async fn fetch_iam_token(
    client: &reqwest::Client,
    oauth_token: &str,
) -> Result<String, ProrabError> {
    if oauth_token.is_empty() {
        return Err(ProrabError::Config("OAUTH_TOKEN is not set".into()));
    }

    let resp = client
        .post(IAM_TOKEN_URL)
        .json(&IamTokenRequest {
            yandex_passport_oauth_token: oauth_token,
        })
        .send()
        .await
        .map_err(|e| ProrabError::Auth(format!("IAM token request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(ProrabError::Auth(format!(
            "IAM token endpoint returned {status}: {body}"
        )));
    }

    let parsed: IamTokenResponse = resp
        .json()
        .await
        .map_err(|e| ProrabError::Auth(format!("IAM token response parse failed: {e}")))?;

    let token = parsed
        .iam_token
        .ok_or_else(|| ProrabError::Auth("IAM response carried no iamToken".into()))?;

    debug!("obtained IAM token ({} chars)", token.len());
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_oauth_token_fails_without_network() {
        let client = reqwest::Client::new();
        let err = fetch_iam_token(&client, "").await.unwrap_err();
        assert!(matches!(err, ProrabError::Config(_)));
    }

    #[test]
    fn test_request_wire_format() {
        let req = IamTokenRequest {
            yandex_passport_oauth_token: "y0_secret",
        };
        let json = serde_json::to_string(&req).unwrap();
        assert_eq!(json, r#"{"yandexPassportOauthToken":"y0_secret"}"#);
    }

    #[test]
    fn test_response_parsing() {
        let resp: IamTokenResponse =
            serde_json::from_str(r#"{"iamToken":"t1.9eu","expiresAt":"2025-01-01T00:00:00Z"}"#)
                .unwrap();
        assert_eq!(resp.iam_token.as_deref(), Some("t1.9eu"));

        let empty: IamTokenResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.iam_token.is_none());
    }
}
