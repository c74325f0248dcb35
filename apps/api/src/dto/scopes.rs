use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Domain fields accepted on registration.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/domain-registration.ts"
)]
pub struct DomainRegistration {
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Incoming payload for `PUT /v3/domains/{domain_id}`.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/register-domain-request.ts"
)]
pub struct RegisterDomainRequest {
    #[serde(default)]
    pub domain: DomainRegistration,
}

/// Project fields accepted on registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/project-registration.ts"
)]
pub struct ProjectRegistration {
    pub domain_id: String,
}

/// Incoming payload for `PUT /v3/projects/{project_id}`.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/register-project-request.ts"
)]
pub struct RegisterProjectRequest {
    pub project: ProjectRegistration,
}

/// Registered domain.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/domain-response.ts"
)]
pub struct DomainResponse {
    pub id: String,
    pub parent_id: Option<String>,
}

/// Envelope around one registered domain.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/domain-envelope-response.ts"
)]
pub struct DomainEnvelopeResponse {
    pub domain: DomainResponse,
}

/// Registered project.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/project-response.ts"
)]
pub struct ProjectResponse {
    pub id: String,
    pub domain_id: String,
}

/// Envelope around one registered project.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/project-envelope-response.ts"
)]
pub struct ProjectEnvelopeResponse {
    pub project: ProjectResponse,
}
