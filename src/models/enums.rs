use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(Frequency {
    Once => "once",
    Twice => "twice",
    Thrice => "thrice",
    Custom => "custom",
});

str_enum!(MedicationStatus {
    Active => "active",
    Inactive => "inactive",
});

str_enum!(DoseEventStatus {
    Taken => "taken",
    Skipped => "skipped",
    Missed => "missed",
});

str_enum!(RenewalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

impl Frequency {
    /// Number of daily doses implied by the frequency. `None` for custom,
    /// which takes whatever the user entered.
    pub fn cardinality(&self) -> Option<usize> {
        match self {
            Self::Once => Some(1),
            Self::Twice => Some(2),
            Self::Thrice => Some(3),
            Self::Custom => None,
        }
    }
}
