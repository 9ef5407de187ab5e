use serde::{Deserialize, Serialize};

use crate::error::GrievanceError;

/// Role carried by an already-authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Authority,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Authority => "authority",
            Self::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = GrievanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "faculty" => Ok(Self::Faculty),
            "authority" => Ok(Self::Authority),
            "admin" => Ok(Self::Admin),
            other => Err(GrievanceError::InvalidArgument(format!(
                "unknown role: {other}"
            ))),
        }
    }
}

/// The caller of a core operation.
///
/// Supplied by the auth collaborator at the boundary; the core trusts it and
/// never re-derives identity. There is no implicit or ambient actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    /// Admins and authorities may assign, transition, and read analytics.
    pub fn can_manage_grievances(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Authority)
    }

    pub fn require_manager(&self, action: &str) -> Result<(), GrievanceError> {
        if self.can_manage_grievances() {
            Ok(())
        } else {
            Err(GrievanceError::Forbidden(format!(
                "only admin/authority can {action} (actor {} is {})",
                self.id, self.role
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn managers_are_admin_and_authority() {
        assert!(Actor::new(1, Role::Admin).can_manage_grievances());
        assert!(Actor::new(1, Role::Authority).can_manage_grievances());
        assert!(!Actor::new(1, Role::Student).can_manage_grievances());
        assert!(!Actor::new(1, Role::Faculty).can_manage_grievances());
    }

    #[test]
    fn require_manager_err_for_student() {
        let err = Actor::new(5, Role::Student)
            .require_manager("assign grievances")
            .unwrap_err();
        assert!(matches!(err, GrievanceError::Forbidden(_)));
        assert!(err.to_string().contains("assign grievances"));
    }

    #[test]
    fn role_parse_is_case_insensitive() {
        assert_eq!("Authority".parse::<Role>().unwrap(), Role::Authority);
        assert_eq!(" admin ".parse::<Role>().unwrap(), Role::Admin);
        assert!("janitor".parse::<Role>().is_err());
    }
}
