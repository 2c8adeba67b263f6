use crate::db::connection::DbPool;
use crate::db::models::{
    ChoiceInput, EvaluationChoice, EvaluationFilter, EvaluationInput, Maintenance,
    MaintenanceFilter, MaintenanceInput, MaintenanceType, MaintenanceTypeInput, ServiceEvaluation,
    Vehicle, VehicleFilter, VehicleInput,
};
use crate::db::repositories as repo;
use crate::error::StoreError;
use async_trait::async_trait;
use uuid::Uuid;

/// Durable storage for every domain record.
///
/// Implementations enforce the unique license plate, reject dangling references,
/// cascade deletes down the vehicle → maintenance → evaluation → choice chain,
/// and own the `created_at` / `updated_at` bookkeeping.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_vehicle(&self, input: VehicleInput) -> Result<Vehicle, StoreError>;
    async fn update_vehicle(&self, id: Uuid, input: VehicleInput) -> Result<Vehicle, StoreError>;
    async fn delete_vehicle(&self, id: Uuid) -> Result<(), StoreError>;
    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError>;
    async fn list_vehicles(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StoreError>;
    async fn count_vehicles(&self) -> Result<i64, StoreError>;

    async fn create_maintenance_type(
        &self,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError>;
    async fn update_maintenance_type(
        &self,
        id: Uuid,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError>;
    async fn delete_maintenance_type(&self, id: Uuid) -> Result<(), StoreError>;
    async fn get_maintenance_type(&self, id: Uuid) -> Result<Option<MaintenanceType>, StoreError>;
    async fn list_maintenance_types(
        &self,
        active_only: bool,
    ) -> Result<Vec<MaintenanceType>, StoreError>;
    async fn count_maintenance_types(&self) -> Result<i64, StoreError>;

    async fn create_maintenance(&self, input: MaintenanceInput)
    -> Result<Maintenance, StoreError>;
    async fn update_maintenance(
        &self,
        id: Uuid,
        input: MaintenanceInput,
    ) -> Result<Maintenance, StoreError>;
    async fn delete_maintenance(&self, id: Uuid) -> Result<(), StoreError>;
    async fn get_maintenance(&self, id: Uuid) -> Result<Option<Maintenance>, StoreError>;
    async fn list_maintenances(
        &self,
        filter: &MaintenanceFilter,
    ) -> Result<Vec<Maintenance>, StoreError>;
    async fn count_maintenances(&self, filter: &MaintenanceFilter) -> Result<i64, StoreError>;

    async fn create_evaluation(
        &self,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError>;
    async fn update_evaluation(
        &self,
        id: Uuid,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError>;
    async fn delete_evaluation(&self, id: Uuid) -> Result<(), StoreError>;
    async fn get_evaluation(&self, id: Uuid) -> Result<Option<ServiceEvaluation>, StoreError>;
    async fn get_evaluation_for_maintenance(
        &self,
        maintenance_id: Uuid,
    ) -> Result<Option<ServiceEvaluation>, StoreError>;
    async fn list_evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> Result<Vec<ServiceEvaluation>, StoreError>;
    async fn count_evaluations(&self) -> Result<i64, StoreError>;

    async fn add_choice(
        &self,
        evaluation_id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError>;
    async fn update_choice(
        &self,
        id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError>;
    async fn delete_choice(&self, id: Uuid) -> Result<(), StoreError>;
    async fn get_choice(&self, id: Uuid) -> Result<Option<EvaluationChoice>, StoreError>;
    async fn list_choices(&self, evaluation_id: Uuid)
    -> Result<Vec<EvaluationChoice>, StoreError>;

    /// Atomically adds one vote to `choice_id` when it belongs to `evaluation_id`.
    /// `Ok(None)` means no such choice under that evaluation; nothing was written.
    async fn increment_choice_votes(
        &self,
        evaluation_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<EvaluationChoice>, StoreError>;
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn create_vehicle(&self, input: VehicleInput) -> Result<Vehicle, StoreError> {
        repo::create_vehicle(&self.pool, &input).await
    }

    async fn update_vehicle(&self, id: Uuid, input: VehicleInput) -> Result<Vehicle, StoreError> {
        repo::update_vehicle(&self.pool, id, &input).await
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), StoreError> {
        repo::delete_vehicle(&self.pool, id).await
    }

    async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
        repo::get_vehicle(&self.pool, id).await
    }

    async fn list_vehicles(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StoreError> {
        repo::list_vehicles(&self.pool, filter).await
    }

    async fn count_vehicles(&self) -> Result<i64, StoreError> {
        repo::count_vehicles(&self.pool).await
    }

    async fn create_maintenance_type(
        &self,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError> {
        repo::create_maintenance_type(&self.pool, &input).await
    }

    async fn update_maintenance_type(
        &self,
        id: Uuid,
        input: MaintenanceTypeInput,
    ) -> Result<MaintenanceType, StoreError> {
        repo::update_maintenance_type(&self.pool, id, &input).await
    }

    async fn delete_maintenance_type(&self, id: Uuid) -> Result<(), StoreError> {
        repo::delete_maintenance_type(&self.pool, id).await
    }

    async fn get_maintenance_type(&self, id: Uuid) -> Result<Option<MaintenanceType>, StoreError> {
        repo::get_maintenance_type(&self.pool, id).await
    }

    async fn list_maintenance_types(
        &self,
        active_only: bool,
    ) -> Result<Vec<MaintenanceType>, StoreError> {
        repo::list_maintenance_types(&self.pool, active_only).await
    }

    async fn count_maintenance_types(&self) -> Result<i64, StoreError> {
        repo::count_maintenance_types(&self.pool).await
    }

    async fn create_maintenance(
        &self,
        input: MaintenanceInput,
    ) -> Result<Maintenance, StoreError> {
        repo::create_maintenance(&self.pool, &input).await
    }

    async fn update_maintenance(
        &self,
        id: Uuid,
        input: MaintenanceInput,
    ) -> Result<Maintenance, StoreError> {
        repo::update_maintenance(&self.pool, id, &input).await
    }

    async fn delete_maintenance(&self, id: Uuid) -> Result<(), StoreError> {
        repo::delete_maintenance(&self.pool, id).await
    }

    async fn get_maintenance(&self, id: Uuid) -> Result<Option<Maintenance>, StoreError> {
        repo::get_maintenance(&self.pool, id).await
    }

    async fn list_maintenances(
        &self,
        filter: &MaintenanceFilter,
    ) -> Result<Vec<Maintenance>, StoreError> {
        repo::list_maintenances(&self.pool, filter).await
    }

    async fn count_maintenances(&self, filter: &MaintenanceFilter) -> Result<i64, StoreError> {
        repo::count_maintenances(&self.pool, filter).await
    }

    async fn create_evaluation(
        &self,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError> {
        repo::create_evaluation(&self.pool, &input).await
    }

    async fn update_evaluation(
        &self,
        id: Uuid,
        input: EvaluationInput,
    ) -> Result<ServiceEvaluation, StoreError> {
        repo::update_evaluation(&self.pool, id, &input).await
    }

    async fn delete_evaluation(&self, id: Uuid) -> Result<(), StoreError> {
        repo::delete_evaluation(&self.pool, id).await
    }

    async fn get_evaluation(&self, id: Uuid) -> Result<Option<ServiceEvaluation>, StoreError> {
        repo::get_evaluation(&self.pool, id).await
    }

    async fn get_evaluation_for_maintenance(
        &self,
        maintenance_id: Uuid,
    ) -> Result<Option<ServiceEvaluation>, StoreError> {
        repo::get_evaluation_for_maintenance(&self.pool, maintenance_id).await
    }

    async fn list_evaluations(
        &self,
        filter: &EvaluationFilter,
    ) -> Result<Vec<ServiceEvaluation>, StoreError> {
        repo::list_evaluations(&self.pool, filter).await
    }

    async fn count_evaluations(&self) -> Result<i64, StoreError> {
        repo::count_evaluations(&self.pool).await
    }

    async fn add_choice(
        &self,
        evaluation_id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError> {
        repo::add_choice(&self.pool, evaluation_id, &input).await
    }

    async fn update_choice(
        &self,
        id: Uuid,
        input: ChoiceInput,
    ) -> Result<EvaluationChoice, StoreError> {
        repo::update_choice(&self.pool, id, &input).await
    }

    async fn delete_choice(&self, id: Uuid) -> Result<(), StoreError> {
        repo::delete_choice(&self.pool, id).await
    }

    async fn get_choice(&self, id: Uuid) -> Result<Option<EvaluationChoice>, StoreError> {
        repo::get_choice(&self.pool, id).await
    }

    async fn list_choices(
        &self,
        evaluation_id: Uuid,
    ) -> Result<Vec<EvaluationChoice>, StoreError> {
        repo::list_choices(&self.pool, evaluation_id).await
    }

    async fn increment_choice_votes(
        &self,
        evaluation_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<EvaluationChoice>, StoreError> {
        repo::increment_choice_votes(&self.pool, evaluation_id, choice_id).await
    }
}
