/// Shared domain enums stored as TEXT columns

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Implements the TEXT column mapping and string conversions for a unit enum.
macro_rules! text_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub const ALL: &'static [$ty] = &[$($ty::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(ParseEnumError { kind: $kind, value: other.to_string() }),
                }
            }
        }

        impl sqlx::Type<sqlx::Postgres> for $ty {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $ty {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let text = <&str as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
                Ok(text.parse::<$ty>()?)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $ty {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <&str as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.as_str(), buf)
            }
        }
    };
}

/// Account role. Variants are declared in privilege order so `Ord` ranks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Unverified,
    Alumni,
    FieldAdmin,
    SuperAdmin,
}

text_enum!(Role, "role", {
    Unverified => "unverified",
    Alumni => "alumni",
    FieldAdmin => "field_admin",
    SuperAdmin => "super_admin",
});

impl Role {
    pub fn at_least(&self, required: Role) -> bool {
        *self >= required
    }

    pub fn is_verified(&self) -> bool {
        self.at_least(Role::Alumni)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

text_enum!(SubmissionStatus, "submission status", {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Going,
    Maybe,
    NotGoing,
}

text_enum!(AttendanceStatus, "attendance status", {
    Going => "going",
    Maybe => "maybe",
    NotGoing => "not_going",
});

/// Notification kinds written by the services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SubmissionReceived,
    SubmissionApproved,
    SubmissionRejected,
    FieldAdminAssigned,
    FieldAdminRemoved,
    EventCreated,
    EventCancelled,
}

text_enum!(NotificationKind, "notification kind", {
    SubmissionReceived => "submission_received",
    SubmissionApproved => "submission_approved",
    SubmissionRejected => "submission_rejected",
    FieldAdminAssigned => "field_admin_assigned",
    FieldAdminRemoved => "field_admin_removed",
    EventCreated => "event_created",
    EventCancelled => "event_cancelled",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_ordered_by_privilege() {
        assert!(Role::SuperAdmin.at_least(Role::FieldAdmin));
        assert!(Role::FieldAdmin.at_least(Role::Alumni));
        assert!(Role::Alumni.at_least(Role::Alumni));
        assert!(!Role::Unverified.at_least(Role::Alumni));
        assert!(!Role::Unverified.is_verified());
        assert!(Role::FieldAdmin.is_verified());
    }

    #[test]
    fn text_values_match_serde_names() {
        for role in Role::ALL {
            let json = serde_json::to_value(role).unwrap();
            assert_eq!(json, serde_json::Value::String(role.as_str().to_string()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        for status in AttendanceStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str(), Some(status.as_str()));
        }
    }

    #[test]
    fn unknown_text_is_rejected() {
        let err = "admin".parse::<Role>().unwrap_err();
        assert_eq!(err.kind, "role");
        assert_eq!(err.to_string(), "invalid role value 'admin'");
        assert!("maybe_not".parse::<AttendanceStatus>().is_err());
    }
}
