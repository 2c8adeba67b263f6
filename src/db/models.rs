use chrono::{DateTime, Duration, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Error returned when a stored or submitted enum label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Option list entry for a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabeledVariant<T> {
    pub value: T,
    pub label: &'static str,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal, $label:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            /// Every variant with its label, in declaration order.
            pub fn choices() -> Vec<LabeledVariant<$name>> {
                Self::ALL
                    .iter()
                    .map(|variant| LabeledVariant {
                        value: *variant,
                        label: variant.label(),
                    })
                    .collect()
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                match value {
                    $($text => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

text_enum!(VehicleType, "vehicle type", {
    Car => "car", "Car",
    Truck => "truck", "Truck",
    Motorcycle => "motorcycle", "Motorcycle",
    Bus => "bus", "Bus",
    Van => "van", "Van",
});

text_enum!(FuelType, "fuel type", {
    Gasoline => "gasoline", "Gasoline",
    Diesel => "diesel", "Diesel",
    Electric => "electric", "Electric",
    Hybrid => "hybrid", "Hybrid",
    Lpg => "lpg", "LPG",
});

text_enum!(MaintenanceStatus, "maintenance status", {
    Scheduled => "scheduled", "Scheduled",
    InProgress => "in_progress", "In progress",
    Completed => "completed", "Completed",
    Cancelled => "cancelled", "Cancelled",
});

impl Default for MaintenanceStatus {
    fn default() -> Self {
        MaintenanceStatus::Scheduled
    }
}

/// Serializes a `chrono::Duration` as whole seconds.
pub mod duration_secs {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(value.num_seconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = i64::deserialize(deserializer)?;
        Duration::try_seconds(secs).ok_or_else(|| serde::de::Error::custom("duration out of range"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub color: String,
    pub owner_name: String,
    pub owner_phone: String,
    pub owner_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn full_name(&self) -> String {
        format!("{} {} ({})", self.brand, self.model, self.year)
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} - {}", self.brand, self.model, self.license_plate)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceType {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "estimated_duration_secs", with = "duration_secs")]
    pub estimated_duration: Duration,
    pub base_price: Decimal,
    pub is_active: bool,
}

impl fmt::Display for MaintenanceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub maintenance_type_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    pub start_date: Option<DateTime<Utc>>,
    pub completion_date: Option<DateTime<Utc>>,
    pub status: MaintenanceStatus,
    pub description: String,
    pub cost: Option<Decimal>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEvaluation {
    pub id: Uuid,
    pub maintenance_id: Uuid,
    pub question_text: String,
    pub pub_date: DateTime<Utc>,
    pub is_active: bool,
}

impl fmt::Display for ServiceEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.question_text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationChoice {
    pub id: Uuid,
    pub evaluation_id: Uuid,
    pub choice_text: String,
    pub votes: i32,
}

// Write-side inputs. Ids and bookkeeping timestamps are owned by the store.

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleInput {
    pub license_plate: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub vehicle_type: VehicleType,
    pub fuel_type: FuelType,
    pub color: String,
    pub owner_name: String,
    pub owner_phone: String,
    #[serde(default)]
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceTypeInput {
    pub name: String,
    pub description: String,
    #[serde(rename = "estimated_duration_secs", with = "duration_secs")]
    pub estimated_duration: Duration,
    pub base_price: Decimal,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceInput {
    pub vehicle_id: Uuid,
    pub maintenance_type_id: Uuid,
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: MaintenanceStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationInput {
    pub maintenance_id: Uuid,
    pub question_text: String,
    /// Defaults to the creation time; on update, `None` keeps the stored value.
    #[serde(default)]
    pub pub_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceInput {
    pub choice_text: String,
}

fn default_true() -> bool {
    true
}

/// Money columns are `NUMERIC(10,2)`; round half away from zero like Postgres does.
pub fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehicleFilter {
    /// Case-insensitive substring over plate, brand, model and owner name.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceOrder {
    #[default]
    NewestFirst,
    SoonestFirst,
}

#[derive(Debug, Clone, Default)]
pub struct MaintenanceFilter {
    pub vehicle_id: Option<Uuid>,
    pub status: Option<MaintenanceStatus>,
    /// Inclusive lower bound on `scheduled_date`.
    pub scheduled_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `scheduled_date`.
    pub scheduled_before: Option<DateTime<Utc>>,
    /// Inclusive lower bound on `completion_date`; rows without one never match.
    pub completed_since: Option<DateTime<Utc>>,
    pub order: MaintenanceOrder,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationFilter {
    pub active_only: bool,
    /// Inclusive upper bound on `pub_date`.
    pub published_until: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_labels_round_trip_through_storage_text() {
        for status in MaintenanceStatus::ALL {
            assert_eq!(status.as_str().parse::<MaintenanceStatus>(), Ok(*status));
        }
        assert_eq!(MaintenanceStatus::default(), MaintenanceStatus::Scheduled);
    }

    #[test]
    fn unknown_fuel_type_is_rejected() {
        let err = "steam".parse::<FuelType>().unwrap_err();
        assert_eq!(err.kind, "fuel type");
        assert_eq!(err.to_string(), "unknown fuel type 'steam'");
    }

    #[test]
    fn vehicle_names() {
        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            license_plate: "ABC123".to_string(),
            brand: "Toyota".to_string(),
            model: "Hilux".to_string(),
            year: 2019,
            vehicle_type: VehicleType::Truck,
            fuel_type: FuelType::Diesel,
            color: "white".to_string(),
            owner_name: "Ana Rojas".to_string(),
            owner_phone: "555-0101".to_string(),
            owner_email: None,
            created_at: Utc::now(),
        };
        assert_eq!(vehicle.full_name(), "Toyota Hilux (2019)");
        assert_eq!(vehicle.to_string(), "Toyota Hilux - ABC123");
    }

    #[test]
    fn maintenance_input_defaults_to_scheduled() {
        let input: MaintenanceInput = serde_json::from_value(serde_json::json!({
            "vehicle_id": Uuid::nil(),
            "maintenance_type_id": Uuid::nil(),
            "scheduled_date": "2026-01-10T09:00:00Z",
        }))
        .unwrap();
        assert_eq!(input.status, MaintenanceStatus::Scheduled);
        assert!(input.cost.is_none());
        assert!(input.description.is_empty());
    }

    #[test]
    fn money_rounds_to_cents() {
        assert_eq!(money(Decimal::new(12345, 3)).to_string(), "12.35");
    }
}
