use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use keygate_application::{AssignmentQuery, RoleChanges, RoleRepository};
use keygate_core::{AppError, AppResult};
use keygate_domain::{
    ActorId, Assignment, DomainId, EffectiveAssignment, ProjectId, Role, RoleId, ScopeTarget,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct RoleStore {
    roles: BTreeMap<RoleId, Role>,
    assignments: BTreeSet<Assignment>,
    domains: HashMap<DomainId, Option<DomainId>>,
    projects: HashMap<ProjectId, DomainId>,
}

impl RoleStore {
    fn name_taken(&self, name: &str, except: Option<RoleId>) -> bool {
        self.roles
            .values()
            .any(|role| Some(role.id()) != except && role.name().as_str() == name)
    }

    fn effective(&self, assignment: &Assignment) -> Option<EffectiveAssignment> {
        self.roles
            .get(&assignment.role_id)
            .map(|role| EffectiveAssignment {
                assignment: assignment.clone(),
                role_name: role.name().as_str().to_owned(),
            })
    }

    fn lineage(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>> {
        let mut next = match scope {
            ScopeTarget::System => return Ok(Vec::new()),
            ScopeTarget::Domain(domain_id) => self
                .domains
                .get(domain_id)
                .ok_or_else(|| domain_not_found(domain_id))?
                .clone(),
            ScopeTarget::Project(project_id) => Some(
                self.projects
                    .get(project_id)
                    .ok_or_else(|| {
                        AppError::NotFound(format!("project '{project_id}' was not found"))
                    })?
                    .clone(),
            ),
        };

        let mut lineage = Vec::new();
        while let Some(domain_id) = next {
            if lineage.contains(&domain_id) {
                return Err(AppError::Internal(format!(
                    "domain hierarchy contains a cycle at '{domain_id}'"
                )));
            }
            next = self.domains.get(&domain_id).cloned().flatten();
            lineage.push(domain_id);
        }

        Ok(lineage)
    }
}

fn domain_not_found(domain_id: &DomainId) -> AppError {
    AppError::NotFound(format!("domain '{domain_id}' was not found"))
}

fn role_not_found(role_id: RoleId) -> AppError {
    AppError::NotFound(format!("role '{role_id}' was not found"))
}

/// In-memory role and assignment store.
///
/// All state sits behind one lock, so a reader never observes a role deletion
/// without the matching assignment cleanup.
#[derive(Debug, Default)]
pub struct InMemoryRoleRepository {
    store: RwLock<RoleStore>,
}

impl InMemoryRoleRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let mut store = self.store.write().await;
        if store.name_taken(role.name().as_str(), None) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.name()
            )));
        }

        store.roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.store.read().await.roles.get(&role_id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let store = self.store.read().await;
        Ok(store
            .roles
            .values()
            .find(|role| role.name().as_str() == name.trim())
            .cloned())
    }

    async fn update_role(&self, role_id: RoleId, changes: RoleChanges) -> AppResult<Role> {
        let mut store = self.store.write().await;
        let current = store
            .roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| role_not_found(role_id))?;

        if let Some(name) = &changes.name
            && store.name_taken(name.as_str(), Some(role_id))
        {
            return Err(AppError::Conflict(format!("role '{name}' already exists")));
        }

        let updated = current.with_changes(changes.name, changes.description);
        store.roles.insert(role_id, updated.clone());
        Ok(updated)
    }

    async fn delete_role(&self, role_id: RoleId) -> AppResult<()> {
        let mut store = self.store.write().await;
        if store.roles.remove(&role_id).is_none() {
            return Err(role_not_found(role_id));
        }

        store
            .assignments
            .retain(|assignment| assignment.role_id != role_id);
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let store = self.store.read().await;
        let mut roles: Vec<Role> = store.roles.values().cloned().collect();
        roles.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(roles)
    }

    async fn grant(&self, assignment: Assignment) -> AppResult<()> {
        let mut store = self.store.write().await;
        if !store.roles.contains_key(&assignment.role_id) {
            return Err(role_not_found(assignment.role_id));
        }
        store.lineage(&assignment.scope)?;

        store.assignments.insert(assignment);
        Ok(())
    }

    async fn revoke(&self, assignment: &Assignment) -> AppResult<()> {
        self.store.write().await.assignments.remove(assignment);
        Ok(())
    }

    async fn assignments_for(&self, actor: &ActorId) -> AppResult<Vec<EffectiveAssignment>> {
        let store = self.store.read().await;
        Ok(store
            .assignments
            .iter()
            .filter(|assignment| &assignment.actor == actor)
            .filter_map(|assignment| store.effective(assignment))
            .collect())
    }

    async fn list_assignments(
        &self,
        query: AssignmentQuery,
    ) -> AppResult<Vec<EffectiveAssignment>> {
        let store = self.store.read().await;
        Ok(store
            .assignments
            .iter()
            .filter(|assignment| query.matches(assignment))
            .filter_map(|assignment| store.effective(assignment))
            .collect())
    }

    async fn register_domain(
        &self,
        domain_id: DomainId,
        parent: Option<DomainId>,
    ) -> AppResult<()> {
        let mut store = self.store.write().await;
        if let Some(existing) = store.domains.get(&domain_id) {
            if existing == &parent {
                return Ok(());
            }
            return Err(AppError::Conflict(format!(
                "domain '{domain_id}' is already registered under a different parent"
            )));
        }

        if let Some(parent_id) = &parent {
            if parent_id == &domain_id {
                return Err(AppError::Validation(format!(
                    "domain '{domain_id}' cannot be its own parent"
                )));
            }
            if !store.domains.contains_key(parent_id) {
                return Err(domain_not_found(parent_id));
            }
        }

        store.domains.insert(domain_id, parent);
        Ok(())
    }

    async fn register_project(&self, project_id: ProjectId, domain_id: DomainId) -> AppResult<()> {
        let mut store = self.store.write().await;
        if !store.domains.contains_key(&domain_id) {
            return Err(domain_not_found(&domain_id));
        }
        if let Some(existing) = store.projects.get(&project_id) {
            if existing == &domain_id {
                return Ok(());
            }
            return Err(AppError::Conflict(format!(
                "project '{project_id}' already belongs to another domain"
            )));
        }

        store.projects.insert(project_id, domain_id);
        Ok(())
    }

    async fn scope_lineage(&self, scope: &ScopeTarget) -> AppResult<Vec<DomainId>> {
        self.store.read().await.lineage(scope)
    }
}
