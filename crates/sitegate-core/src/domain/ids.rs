//! Domain identifiers (strongly-typed numeric IDs).
//!
//! All entities in the ERP are keyed by plain integers. To keep an
//! `EmployeeId` from ever being passed where an `AssignmentId` is expected we
//! wrap the integer in a generic `Id<T>` with a zero-sized marker type.
//!
//! ## Phantom Type パターン
//! `Id<T>` で共通実装を提供しつつ、`T` は実行時には使わないマーカー型として
//! コンパイル時の型安全性だけを提供します。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// IdMarker は各 ID 型のマーカー trait
///
/// Display で使うプレフィックス（"assignment-", "employee-" など）を提供します。
pub trait IdMarker: Send + Sync + 'static {
    fn prefix() -> &'static str;
}

/// ジェネリック ID 型
///
/// On the wire this is just the integer (`#[serde(transparent)]`).
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Id<T: IdMarker> {
    value: u64,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub const fn new(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    pub const fn get(self) -> u64 {
        self.value
    }

    /// Interpret a loosely-typed reference. Only strictly positive integers are ids.
    pub fn from_raw(raw: i64) -> Option<Self> {
        u64::try_from(raw).ok().filter(|v| *v > 0).map(Self::new)
    }

    /// `0` never names a real record.
    pub fn is_valid(self) -> bool {
        self.value > 0
    }
}

impl<T: IdMarker> From<u64> for Id<T> {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.value)
    }
}

// ========================================
// マーカー型の定義
// ========================================

macro_rules! id_marker {
    ($(#[$doc:meta])* $marker:ident, $alias:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum $marker {}

        impl IdMarker for $marker {
            fn prefix() -> &'static str {
                $prefix
            }
        }

        $(#[$doc])*
        pub type $alias = Id<$marker>;
    };
}

id_marker!(
    /// Identifier of a TaskAssignment (the unit being gated).
    Assignment, AssignmentId, "assignment-"
);
id_marker!(
    /// Identifier of an employee (worker or supervisor).
    Employee, EmployeeId, "employee-"
);
id_marker!(
    /// Identifier of a project (owner of the geofence).
    Project, ProjectId, "project-"
);
id_marker!(
    /// Identifier of a task definition in the task catalogue.
    TaskDef, TaskId, "task-"
);
id_marker!(
    /// Identifier of an appended location audit entry.
    LocationLog, LocationLogId, "location-log-"
);

/// Supervisors are employees; the alias only documents intent.
pub type SupervisorId = EmployeeId;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_marker_prefix() {
        assert_eq!(AssignmentId::new(7).to_string(), "assignment-7");
        assert_eq!(EmployeeId::new(3).to_string(), "employee-3");
        assert_eq!(LocationLogId::new(12).to_string(), "location-log-12");
        // let _: EmployeeId = AssignmentId::new(1); // <- does not compile
    }

    #[test]
    fn serializes_as_bare_integer() {
        let s = serde_json::to_string(&ProjectId::new(42)).unwrap();
        assert_eq!(s, "42");

        let de: ProjectId = serde_json::from_str("42").unwrap();
        assert_eq!(de, ProjectId::new(42));
    }

    #[test]
    fn from_raw_rejects_non_positive() {
        assert_eq!(AssignmentId::from_raw(5), Some(AssignmentId::new(5)));
        assert_eq!(AssignmentId::from_raw(0), None);
        assert_eq!(AssignmentId::from_raw(-3), None);
        assert!(!AssignmentId::new(0).is_valid());
    }

    #[test]
    fn marker_does_not_consume_memory() {
        use std::mem::size_of;
        assert_eq!(size_of::<AssignmentId>(), size_of::<u64>());
    }
}
