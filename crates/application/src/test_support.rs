//! Hand-written port fakes shared by service tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use keygate_core::{AppError, AppResult};
use keygate_domain::{
    ActorId, Assignment, DomainId, EffectiveAssignment, PolicySet, ProjectId, Role, RoleId,
    ScopeEnforcement, ScopeTarget, Token, TokenId,
};

use crate::{
    AssignmentQuery, AuditEvent, AuditRepository, EnforcementGateway, InheritanceMode,
    RoleChanges, RoleRepository, ScopeResolver, TokenRepository,
};

#[derive(Default)]
struct RoleState {
    roles: BTreeMap<RoleId, Role>,
    assignments: BTreeSet<Assignment>,
    domains: HashMap<DomainId, Option<DomainId>>,
    projects: HashMap<ProjectId, DomainId>,
}

#[derive(Default)]
pub(crate) struct FakeRoleRepository {
    state: Mutex<RoleState>,
    delay: Option<StdDuration>,
}

impl FakeRoleRepository {
    pub(crate) fn slow(delay: StdDuration) -> Self {
        Self {
            state: Mutex::new(RoleState::default()),
            delay: Some(delay),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn effective(state: &RoleState, assignment: &Assignment) -> Option<EffectiveAssignment> {
    state
        .roles
        .get(&assignment.role_id)
        .map(|role| EffectiveAssignment {
            assignment: assignment.clone(),
            role_name: role.name().as_str().to_owned(),
        })
}

#[async_trait]
impl RoleRepository for FakeRoleRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        self.pause().await;
        let mut state = self.state.lock().await;
        if state.roles.values().any(|existing| existing.name() == role.name()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }
        state.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.pause().await;
        Ok(self.state.lock().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(self
            .state
            .lock()
            .await
            .roles
            .values()
            .find(|role| role.name().as_str() == name)
            .cloned())
    }

    async fn update_role(&self, role_id: RoleId, changes: RoleChanges) -> AppResult<Role> {
        let mut state = self.state.lock().await;
        let Some(current) = state.roles.get(&role_id).cloned() else {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        };
        if let Some(name) = &changes.name
            && state
                .roles
                .values()
                .any(|role| role.id() != role_id && role.name() == name)
        {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }
        let updated = current.with_changes(changes.name, changes.description);
        state.roles.insert(role_id, updated.clone());
        Ok(updated)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if state.roles.remove(&role_id).is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' was not found")));
        }
        state
            .assignments
            .retain(|assignment| assignment.role_id != role_id);
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        self.pause().await;
        let mut roles: Vec<Role> = self.state.lock().await.roles.values().cloned().collect();
        roles.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(roles)
    }

    async fn grant(&self, assignment: Assignment) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.roles.contains_key(&assignment.role_id) {
            return Err(AppError::NotFound("role was not found".to_owned()));
        }
        state.assignments.insert(assignment);
        Ok(())
    }

    async fn revoke(&self, assignment: &Assignment) -> AppResult<()> {
        self.state.lock().await.assignments.remove(assignment);
        Ok(())
    }

    async fn assignments_for(&self, actor: &ActorId) -> AppResult<Vec<EffectiveAssignment>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| &assignment.actor == actor)
            .filter_map(|assignment| effective(&state, assignment))
            .collect())
    }

    async fn list_assignments(
        &self,
        query: AssignmentQuery,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .iter()
            .filter(|assignment| query.matches(assignment))
            .filter_map(|assignment| effective(&state, assignment))
            .collect())
    }

    async fn register_domain(
        &self,
        domain_id: DomainId,
        parent: Option<DomainId>,
    ) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if let Some(parent_id) = &parent
            && !state.domains.contains_key(parent_id)
        {
            return Err(AppError::NotFound(format!("domain '{parent_id}' was not found")));
        }
        state.domains.insert(domain_id, parent);
        Ok(())
    }

    async fn register_project(&self, project_id: ProjectId, domain_id: DomainId) -> AppResult<()> {
        let mut state = self.state.lock().await;
        if !state.domains.contains_key(&domain_id) {
            return Err(AppError::NotFound(format!("domain '{domain_id}' was not found")));
        }
        state.projects.insert(project_id, domain_id);
        Ok(())
    }

    async fn scope_lineage(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>> {
        let state = self.state.lock().await;
        let mut next = match scope {
            ScopeTarget::System => return Ok(Vec::new()),
            ScopeTarget::Domain(domain_id) => state
                .domains
                .get(domain_id)
                .ok_or_else(|| AppError::NotFound(format!("domain '{domain_id}' was not found")))?
                .clone(),
            ScopeTarget::Project(project_id) => Some(
                state
                    .projects
                    .get(project_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("project '{project_id}' was not found"))
                    })?
                    .clone(),
            ),
        };

        let mut lineage = Vec::new();
        while let Some(domain_id) = next {
            next = state.domains.get(&domain_id).cloned().flatten();
            lineage.push(domain_id);
        }
        Ok(lineage)
    }
}

#[derive(Default)]
pub(crate) struct FakeTokenRepository {
    tokens: Mutex<HashMap<TokenId, Token>>,
}

#[async_trait]
impl TokenRepository for FakeTokenRepository {
    async fn save_token(&self, token: Token) -> AppResult<()> {
        self.tokens.lock().await.insert(token.id().clone(), token);
        Ok(())
    }

    async fn find_token(&self, token_id: &TokenId) -> AppResult<Option<Token>> {
        Ok(self.tokens.lock().await.get(token_id).cloned())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before - tokens.len())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

pub(crate) fn default_gateway() -> EnforcementGateway {
    EnforcementGateway::new(
        ScopeResolver::new(ScopeEnforcement::Enforced, InheritanceMode::Disabled),
        Arc::new(PolicySet::defaults()),
    )
}

/// Builds a system-scoped token carrying the named roles.
pub(crate) fn system_token(subject: &str, role_names: &[&str]) -> Token {
    let actor = ActorId::user(subject).unwrap_or_else(|_| unreachable!());
    let assignments = role_names
        .iter()
        .map(|role_name| EffectiveAssignment {
            assignment: Assignment::new(actor.clone(), RoleId::new(), ScopeTarget::System),
            role_name: (*role_name).to_owned(),
        })
        .collect();
    let issued_at = Utc::now();
    Token::new(
        TokenId::generate(),
        subject,
        assignments,
        ScopeTarget::System,
        Vec::new(),
        issued_at,
        issued_at + Duration::hours(1),
    )
}
