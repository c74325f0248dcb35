use keygate_domain::{ResolvedContext, Token};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Identity and scope a token is requested for.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/issue-token-auth-request.ts"
)]
pub struct IssueTokenAuthRequest {
    pub subject: String,
    #[serde(default)]
    pub groups: Vec<String>,
    /// `system`, `domain:<id>` or `project:<id>`.
    pub scope: String,
}

/// Incoming payload for token issuance.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/issue-token-request.ts"
)]
pub struct IssueTokenRequest {
    pub auth: IssueTokenAuthRequest,
}

/// API representation of an issued token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/token-response.ts"
)]
pub struct TokenResponse {
    pub subject: String,
    pub scope_kind: String,
    pub scope_id: Option<String>,
    pub roles: Vec<String>,
    pub issued_at: String,
    pub expires_at: String,
}

impl TokenResponse {
    /// Builds the response from a token and the context it resolves to.
    pub fn from_resolved(token: &Token, context: &ResolvedContext) -> Self {
        Self {
            subject: token.subject().to_owned(),
            scope_kind: token.scope().kind().as_str().to_owned(),
            scope_id: token.scope().target_id().map(str::to_owned),
            roles: context.role_names.iter().cloned().collect(),
            issued_at: token.issued_at().to_rfc3339(),
            expires_at: token.expires_at().to_rfc3339(),
        }
    }
}

/// Token issuance response envelope.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/token-envelope-response.ts"
)]
pub struct TokenEnvelopeResponse {
    pub token: TokenResponse,
}
