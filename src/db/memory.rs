use crate::db::models::{
    ChoiceInput, EvaluationChoice, EvaluationFilter, EvaluationInput, Maintenance,
    MaintenanceFilter, MaintenanceInput, MaintenanceOrder, MaintenanceType, MaintenanceTypeInput,
    ServiceEvaluation, Vehicle, VehicleFilter, VehicleInput, money,
};
use crate::db::store::EntityStore;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    vehicles: BTreeMap<Uuid, Vehicle>,
    maintenance_types: BTreeMap<Uuid, MaintenanceType>,
    maintenances: BTreeMap<Uuid, Maintenance>,
    evaluations: BTreeMap<Uuid, ServiceEvaluation>,
    // Insertion order doubles as display order.
    choices: Vec<EvaluationChoice>,
}

impl Tables {
    fn ensure_unique_plate(&self, plate: &str, except: Option<Uuid>) -> Result<(), StoreError> {
        let taken = self
            .vehicles
            .values()
            .any(|v| v.license_plate == plate && Some(v.id) != except);
        if taken {
            return Err(StoreError::UniquenessViolation {
                entity: "vehicle",
                field: "license_plate",
                value: plate.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_maintenance_refs(&self, input: &MaintenanceInput) -> Result<(), StoreError> {
        if !self.vehicles.contains_key(&input.vehicle_id) {
            return Err(StoreError::ReferentialIntegrity {
                entity: "maintenance",
                target: "vehicle",
            });
        }
        if !self.maintenance_types.contains_key(&input.maintenance_type_id) {
            return Err(StoreError::ReferentialIntegrity {
                entity: "maintenance",
                target: "maintenance type",
            });
        }
        Ok(())
    }

    fn ensure_evaluation_refs(
        &self,
        input: &EvaluationInput,
        except: Option<Uuid>,
    ) -> Result<(), StoreError> {
        if !self.maintenances.contains_key(&input.maintenance_id) {
            return Err(StoreError::ReferentialIntegrity {
                entity: "evaluation",
                target: "maintenance",
            });
        }
        let taken = self
            .evaluations
            .values()
            .any(|e| e.maintenance_id == input.maintenance_id && Some(e.id) != except);
        if taken {
            return Err(StoreError::UniquenessViolation {
                entity: "evaluation",
                field: "maintenance_id",
                value: input.maintenance_id.to_string(),
            });
        }
        Ok(())
    }

    fn cascade_maintenances(&mut self, doomed: impl Fn(&Maintenance) -> bool) {
        let ids: Vec<Uuid> = self
            .maintenances
            .values()
            .filter(|m| doomed(m))
            .map(|m| m.id)
            .collect();
        for id in ids {
            self.maintenances.remove(&id);
            self.cascade_evaluations(|e| e.maintenance_id == id);
        }
    }

    fn cascade_evaluations(&mut self, doomed: impl Fn(&ServiceEvaluation) -> bool) {
        let ids: Vec<Uuid> = self
            .evaluations
            .values()
            .filter(|e| doomed(e))
            .map(|e| e.id)
            .collect();
        for id in &ids {
            self.evaluations.remove(id);
        }
        self.choices.retain(|c| !ids.contains(&c.evaluation_id));
    }
}

fn matches_search(vehicle: &Vehicle, needle: &str) -> bool {
    [
        &vehicle.license_plate,
        &vehicle.brand,
        &vehicle.model,
        &vehicle.owner_name,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

fn matches_maintenance(m: &Maintenance, filter: &MaintenanceFilter) -> bool {
    filter.vehicle_id.is_none_or(|id| m.vehicle_id == id)
        && filter.status.is_none_or(|status| m.status == status)
        && filter.scheduled_from.is_none_or(|from| m.scheduled_date >= from)
        && filter
            .scheduled_before
            .is_none_or(|before| m.scheduled_date < before)
        && filter
            .completed_since
            .is_none_or(|since| m.completion_date.is_some_and(|done| done >= since))
}

fn take<T>(rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    match limit {
        Some(limit) => rows.into_iter().take(limit.max(0) as usize).collect(),
        None => rows,
    }
}

/// Process-local store with the same constraints as the Postgres schema.
///
/// Each operation runs under a single lock acquisition, which makes every
/// write (including the vote increment) atomic with respect to other callers.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_vehicle(&self, input: VehicleInput) -> Result<Vehicle, StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_unique_plate(&input.license_plate, None)?;

        let vehicle = Vehicle {
            id: Uuid::new_v4(),
            license_plate: input.license_plate,
            brand: input.brand,
            model: input.model,
            year: input.year,
            vehicle_type: input.vehicle_type,
            fuel_type: input.fuel_type,
            color: input.color,
            owner_name: input.owner_name,
            owner_phone: input.owner_phone,
            owner_email: input.owner_email,
            created_at: Utc::now(),
        };
        tables.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn update_vehicle(&self, id: Uuid, input: VehicleInput) -> Result<Vehicle, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.vehicles.contains_key(&id) {
            return Err(StoreError::not_found("vehicle", id));
        }
        tables.ensure_unique_plate(&input.license_plate, Some(id))?;

        let vehicle = tables
            .vehicles
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("vehicle", id))?;
        vehicle.license_plate = input.license_plate;
        vehicle.brand = input.brand;
        vehicle.model = input.model;
        vehicle.year = input.year;
        vehicle.vehicle_type = input.vehicle_type;
        vehicle.fuel_type = input.fuel_type;
        vehicle.color = input.color;
        vehicle.owner_name = input.owner_name;
        vehicle.owner_phone = input.owner_phone;
        vehicle.owner_email = input.owner_email;
        Ok(vehicle.clone())
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .vehicles
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("vehicle", id))?;
        tables.cascade_maintenances(|m| m.vehicle_id == id);
        Ok(())
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.tables.read().await.vehicles.get(&id).cloned())
    }

    async fn list_vehicles(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StoreError> {
        let tables = self.tables.read().await;
        let needle = filter
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut vehicles: Vec<Vehicle> = tables
            .vehicles
            .values()
            .filter(|v| needle.as_deref().is_none_or(|n| matches_search(v, n)))
            .cloned()
            .collect();
        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(take(vehicles, filter.limit))
    }

    async fn count_vehicles(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.vehicles.len() as i64)
    }

    async fn create_maintenance_type(
        &self,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError> {
        let maintenance_type = MaintenanceType {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            estimated_duration: input.estimated_duration,
            base_price: money(input.base_price),
            is_active: input.is_active,
        };
        self.tables
            .write()
            .await
            .maintenance_types
            .insert(maintenance_type.id, maintenance_type.clone());
        Ok(maintenance_type)
    }

    async fn update_maintenance_type(
        &self,
        id: Uuid,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError> {
        let mut tables = self.tables.write().await;
        let maintenance_type = tables
            .maintenance_types
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("maintenance type", id))?;
        maintenance_type.name = input.name;
        maintenance_type.description = input.description;
        maintenance_type.estimated_duration = input.estimated_duration;
        maintenance_type.base_price = money(input.base_price);
        maintenance_type.is_active = input.is_active;
        Ok(maintenance_type.clone())
    }

    async fn delete_maintenance_type(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .maintenance_types
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("maintenance type", id))?;
        tables.cascade_maintenances(|m| m.maintenance_type_id == id);
        Ok(())
    }

    async fn get_maintenance_type(&self, id: Uuid) -> Result<Option<MaintenanceType>, StoreError> {
        Ok(self.tables.read().await.maintenance_types.get(&id).cloned())
    }

    async fn list_maintenance_types(
        &self,
        active_only: bool,
    ) -> Result<Vec<MaintenanceType>, StoreError> {
        let tables = self.tables.read().await;
        let mut types: Vec<MaintenanceType> = tables
            .maintenance_types
            .values()
            .filter(|t| !active_only || t.is_active)
            .cloned()
            .collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(types)
    }

    async fn count_maintenance_types(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.maintenance_types.len() as i64)
    }

    async fn create_maintenance(
        &self,
        input: MaintenanceInput,
    ) -> Result<Maintenance, StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_maintenance_refs(&input)?;

        let now = Utc::now();
        let maintenance = Maintenance {
            id: Uuid::new_v4(),
            vehicle_id: input.vehicle_id,
            maintenance_type_id: input.maintenance_type_id,
            scheduled_date: input.scheduled_date,
            start_date: input.start_date,
            completion_date: input.completion_date,
            status: input.status,
            description: input.description,
            cost: input.cost.map(money),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };
        tables.maintenances.insert(maintenance.id, maintenance.clone());
        Ok(maintenance)
    }

    async fn update_maintenance(
        &self,
        id: Uuid,
        input: MaintenanceInput,
    ) -> Result<Maintenance, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.maintenances.contains_key(&id) {
            return Err(StoreError::not_found("maintenance", id));
        }
        tables.ensure_maintenance_refs(&input)?;

        let maintenance = tables
            .maintenances
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("maintenance", id))?;
        maintenance.vehicle_id = input.vehicle_id;
        maintenance.maintenance_type_id = input.maintenance_type_id;
        maintenance.scheduled_date = input.scheduled_date;
        maintenance.start_date = input.start_date;
        maintenance.completion_date = input.completion_date;
        maintenance.status = input.status;
        maintenance.description = input.description;
        maintenance.cost = input.cost.map(money);
        maintenance.notes = input.notes;
        maintenance.updated_at = Utc::now().max(maintenance.updated_at);
        Ok(maintenance.clone())
    }

    async fn delete_maintenance(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables
            .maintenances
            .remove(&id)
            .ok_or_else(|| StoreError::not_found("maintenance", id))?;
        tables.cascade_evaluations(|e| e.maintenance_id == id);
        Ok(())
    }

    async fn get_maintenance(&self, id: Uuid) -> Result<Option<Maintenance>, StoreError> {
        Ok(self.tables.read().await.maintenances.get(&id).cloned())
    }

    async fn list_maintenances(
        &self,
        filter: &MaintenanceFilter,
    ) -> Result<Vec<Maintenance>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Maintenance> = tables
            .maintenances
            .values()
            .filter(|m| matches_maintenance(m, filter))
            .cloned()
            .collect();
        match filter.order {
            MaintenanceOrder::NewestFirst => {
                rows.sort_by(|a, b| b.scheduled_date.cmp(&a.scheduled_date))
            }
            MaintenanceOrder::SoonestFirst => {
                rows.sort_by(|a, b| a.scheduled_date.cmp(&b.scheduled_date))
            }
        }
        Ok(take(rows, filter.limit))
    }

    async fn count_maintenances(&self, filter: &MaintenanceFilter) -> Result<i64, StoreError> {
        let tables = self.tables.read().await;
        let count = tables
            .maintenances
            .values()
            .filter(|m| matches_maintenance(m, filter))
            .count();
        Ok(count as i64)
    }

    async fn create_evaluation(
        &self,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError> {
        let mut tables = self.tables.write().await;
        tables.ensure_evaluation_refs(&input, None)?;

        let evaluation = ServiceEvaluation {
            id: Uuid::new_v4(),
            maintenance_id: input.maintenance_id,
            question_text: input.question_text,
            pub_date: input.pub_date.unwrap_or_else(Utc::now),
            is_active: input.is_active,
        };
        tables.evaluations.insert(evaluation.id, evaluation.clone());
        Ok(evaluation)
    }

    async fn update_evaluation(
        &self,
        id: Uuid,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.evaluations.contains_key(&id) {
            return Err(StoreError::not_found("evaluation", id));
        }
        tables.ensure_evaluation_refs(&input, Some(id))?;

        let evaluation = tables
            .evaluations
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("evaluation", id))?;
        evaluation.maintenance_id = input.maintenance_id;
        evaluation.question_text = input.question_text;
        if let Some(pub_date) = input.pub_date {
            evaluation.pub_date = pub_date;
        }
        evaluation.is_active = input.is_active;
        Ok(evaluation.clone())
    }

    async fn delete_evaluation(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.evaluations.contains_key(&id) {
            return Err(StoreError::not_found("evaluation", id));
        }
        tables.cascade_evaluations(|e| e.id == id);
        Ok(())
    }

    async fn get_evaluation(&self, id: Uuid) -> Result<Option<ServiceEvaluation>, StoreError> {
        Ok(self.tables.read().await.evaluations.get(&id).cloned())
    }

    async fn get_evaluation_for_maintenance(
        &self,
        maintenance_id: Uuid,
    ) -> Result<Option<ServiceEvaluation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .evaluations
            .values()
            .find(|e| e.maintenance_id == maintenance_id)
            .cloned())
    }

    async fn list_evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> Result<Vec<ServiceEvaluation>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<ServiceEvaluation> = tables
            .evaluations
            .values()
            .filter(|e| !filter.active_only || e.is_active)
            .filter(|e| filter.published_until.is_none_or(|until| e.pub_date <= until))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.pub_date.cmp(&a.pub_date));
        Ok(take(rows, filter.limit))
    }

    async fn count_evaluations(&self) -> Result<i64, StoreError> {
        Ok(self.tables.read().await.evaluations.len() as i64)
    }

    async fn add_choice(
        &self,
        evaluation_id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.evaluations.contains_key(&evaluation_id) {
            return Err(StoreError::ReferentialIntegrity {
                entity: "choice",
                target: "evaluation",
            });
        }

        let choice = EvaluationChoice {
            id: Uuid::new_v4(),
            evaluation_id,
            choice_text: input.choice_text,
            votes: 0,
        };
        tables.choices.push(choice.clone());
        Ok(choice)
    }

    async fn update_choice(
        &self,
        id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError> {
        let mut tables = self.tables.write().await;
        let choice = tables
            .choices
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::not_found("choice", id))?;
        choice.choice_text = input.choice_text;
        Ok(choice.clone())
    }

    async fn delete_choice(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.choices.len();
        tables.choices.retain(|c| c.id != id);
        if tables.choices.len() == before {
            return Err(StoreError::not_found("choice", id));
        }
        Ok(())
    }

    async fn get_choice(&self, id: Uuid) -> Result<Option<EvaluationChoice>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.choices.iter().find(|c| c.id == id).cloned())
    }

    async fn list_choices(
        &self,
        evaluation_id: Uuid,
    ) -> Result<Vec<EvaluationChoice>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .choices
            .iter()
            .filter(|c| c.evaluation_id == evaluation_id)
            .cloned()
            .collect())
    }

    async fn increment_choice_votes(
        &self,
        evaluation_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<EvaluationChoice>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(choice) = tables
            .choices
            .iter_mut()
            .find(|c| c.id == choice_id && c.evaluation_id == evaluation_id)
        else {
            return Ok(None);
        };
        choice.votes = choice
            .votes
            .checked_add(1)
            .ok_or_else(|| StoreError::Database("vote counter overflow".to_string()))?;
        Ok(Some(choice.clone()))
    }
}
