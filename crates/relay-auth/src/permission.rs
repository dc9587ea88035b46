use relay_core::{AdapterRecord, Operation, Principal, ToolRecord};

/// Resource view the permission rules operate on
pub trait Protected {
    /// Principal id that created the resource
    fn owner(&self) -> &str;
    /// Role values granting non-owner read access
    fn required_roles(&self) -> &[String];
}

impl Protected for AdapterRecord {
    fn owner(&self) -> &str {
        &self.created_by
    }

    fn required_roles(&self) -> &[String] {
        &self.required_roles
    }
}

impl Protected for ToolRecord {
    fn owner(&self) -> &str {
        &self.adapter.created_by
    }

    fn required_roles(&self) -> &[String] {
        &self.adapter.required_roles
    }
}

/// Decides `{read, write}` for a principal over a resource
///
/// Rules, first match wins: owner allows everything; the administrator
/// role allows everything; reads are open when `requiredRoles` is empty
/// and otherwise require any case-insensitive role intersection; writes
/// are owner/admin only.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// Whether the principal may perform the operation on the resource
    pub fn allows<R: Protected>(&self, principal: &Principal, resource: &R, operation: Operation) -> bool {
        if principal.user_id == resource.owner() {
            return true;
        }

        if principal.is_admin() {
            return true;
        }

        match operation {
            Operation::Read => {
                let required = resource.required_roles();
                required.is_empty() || required.iter().any(|role| principal.has_role(role))
            }
            Operation::Write => false,
        }
    }

    /// Keep only the resources the principal may perform `operation`
    /// on, preserving input order
    pub fn filter<R: Protected>(&self, principal: &Principal, resources: Vec<R>, operation: Operation) -> Vec<R> {
        resources
            .into_iter()
            .filter(|r| self.allows(principal, r, operation))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;

    use super::*;

    fn record(owner: &str, required_roles: Vec<&str>) -> AdapterRecord {
        AdapterRecord {
            id: "0".to_owned(),
            name: "a1".to_owned(),
            image_name: "img".to_owned(),
            image_version: "v1".to_owned(),
            environment_variables: HashMap::new(),
            replica_count: 1,
            description: String::new(),
            use_workload_identity: false,
            required_roles: required_roles.into_iter().map(String::from).collect(),
            created_by: owner.to_owned(),
            created_at: Utc::now(),
            last_updated_at: Utc::now(),
        }
    }

    fn principal(user_id: &str, roles: Vec<&str>) -> Principal {
        Principal::new(user_id, user_id, roles.into_iter().map(String::from).collect())
    }

    #[test]
    fn owner_can_read_and_write() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec!["reader"]);
        let p = principal("u1", vec![]);

        assert!(eval.allows(&p, &r, Operation::Read));
        assert!(eval.allows(&p, &r, Operation::Write));
    }

    #[test]
    fn admin_can_read_and_write() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec!["reader"]);
        let p = principal("u2", vec!["MCP.ADMIN"]);

        assert!(eval.allows(&p, &r, Operation::Read));
        assert!(eval.allows(&p, &r, Operation::Write));
    }

    #[test]
    fn non_owner_cannot_write() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec![]);
        let p = principal("u2", vec!["reader", "writer"]);

        assert!(!eval.allows(&p, &r, Operation::Write));
    }

    #[test]
    fn empty_required_roles_allow_read() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec![]);
        let p = principal("u2", vec![]);

        assert!(eval.allows(&p, &r, Operation::Read));
    }

    #[test]
    fn role_holder_can_read() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec!["Reader"]);
        let p = principal("u2", vec!["reader"]);

        assert!(eval.allows(&p, &r, Operation::Read));
    }

    #[test]
    fn non_role_holder_cannot_read() {
        let eval = PermissionEvaluator;
        let r = record("u1", vec!["reader"]);
        let p = principal("u2", vec!["guest"]);

        assert!(!eval.allows(&p, &r, Operation::Read));
    }

    #[test]
    fn filter_preserves_order_and_drops_unreadable() {
        let eval = PermissionEvaluator;
        let records = vec![
            record("u1", vec![]),
            record("u1", vec!["secret"]),
            record("u2", vec!["reader"]),
        ];
        let p = principal("u3", vec!["reader"]);

        let visible = eval.filter(&p, records, Operation::Read);
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].required_roles, Vec::<String>::new());
        assert_eq!(visible[1].required_roles, vec!["reader".to_owned()]);
    }
}
