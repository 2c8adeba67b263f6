use crate::db::models::EvaluationChoice;
use crate::db::store::EntityStore;
use crate::error::VoteError;
use uuid::Uuid;

/// Records one vote for `choice_id` on `evaluation_id`.
///
/// An unknown evaluation is `NotFound`. A missing selection, or a choice that
/// does not belong to this evaluation, is `InvalidChoice`. On success exactly one
/// choice row has its counter bumped by one, and its new state is returned.
pub async fn vote(
    store: &dyn EntityStore,
    evaluation_id: Uuid,
    choice_id: Option<Uuid>,
) -> Result<EvaluationChoice, VoteError> {
    if store.get_evaluation(evaluation_id).await?.is_none() {
        warn!("vote rejected: evaluation {} not found", evaluation_id);
        return Err(VoteError::NotFound(evaluation_id));
    }

    let Some(choice_id) = choice_id else {
        warn!("vote rejected: no choice selected for {}", evaluation_id);
        return Err(VoteError::InvalidChoice);
    };

    match store.increment_choice_votes(evaluation_id, choice_id).await? {
        Some(choice) => {
            info!(
                "vote recorded: evaluation={} choice={} votes={}",
                evaluation_id, choice.id, choice.votes
            );
            Ok(choice)
        }
        // The evaluation may have been deleted since the first lookup.
        None if store.get_evaluation(evaluation_id).await?.is_none() => {
            warn!("vote rejected: evaluation {} was removed", evaluation_id);
            Err(VoteError::NotFound(evaluation_id))
        }
        None => {
            warn!(
                "vote rejected: choice {} is not part of evaluation {}",
                choice_id, evaluation_id
            );
            Err(VoteError::InvalidChoice)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::models::{
        ChoiceInput, EvaluationFilter, EvaluationInput, FuelType, Maintenance, MaintenanceFilter,
        MaintenanceInput, MaintenanceStatus, MaintenanceType, MaintenanceTypeInput,
        ServiceEvaluation, Vehicle, VehicleFilter, VehicleInput, VehicleType,
    };
    use crate::error::StoreError;
    use async_trait::async_trait;
    use crate::domain::queries::total_votes_for;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;
    use std::sync::Arc;

    struct Fixture {
        store: Arc<MemoryStore>,
        evaluation_id: Uuid,
        choices: Vec<Uuid>,
    }

    async fn fixture(store: Arc<MemoryStore>, plate: &str) -> Fixture {
        let vehicle = store
            .create_vehicle(VehicleInput {
                license_plate: plate.to_string(),
                brand: "Ford".to_string(),
                model: "Transit".to_string(),
                year: 2018,
                vehicle_type: VehicleType::Van,
                fuel_type: FuelType::Diesel,
                color: "blue".to_string(),
                owner_name: "Carla Díaz".to_string(),
                owner_phone: "555-0110".to_string(),
                owner_email: None,
            })
            .await
            .unwrap();
        let kind = store
            .create_maintenance_type(MaintenanceTypeInput {
                name: "Inspection".to_string(),
                description: "Yearly inspection".to_string(),
                estimated_duration: Duration::minutes(90),
                base_price: Decimal::new(2500, 2),
                is_active: true,
            })
            .await
            .unwrap();
        let maintenance = store
            .create_maintenance(MaintenanceInput {
                vehicle_id: vehicle.id,
                maintenance_type_id: kind.id,
                scheduled_date: Utc::now() - Duration::days(1),
                start_date: None,
                completion_date: None,
                status: MaintenanceStatus::Completed,
                description: String::new(),
                cost: None,
                notes: String::new(),
            })
            .await
            .unwrap();
        let evaluation = store
            .create_evaluation(EvaluationInput {
                maintenance_id: maintenance.id,
                question_text: "How would you rate the service?".to_string(),
                pub_date: None,
                is_active: true,
            })
            .await
            .unwrap();

        let mut choices = Vec::new();
        for text in ["Excellent", "Fair", "Poor"] {
            let choice = store
                .add_choice(
                    evaluation.id,
                    ChoiceInput {
                        choice_text: text.to_string(),
                    },
                )
                .await
                .unwrap();
            choices.push(choice.id);
        }

        Fixture {
            store,
            evaluation_id: evaluation.id,
            choices,
        }
    }

    async fn votes_of(store: &MemoryStore, evaluation_id: Uuid) -> Vec<i32> {
        store
            .list_choices(evaluation_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.votes)
            .collect()
    }

    /// Deletes the evaluation right before the increment runs, as a concurrent
    /// admin request would.
    struct DeletedMidVote {
        inner: MemoryStore,
    }

    #[async_trait]
    impl EntityStore for DeletedMidVote {
        async fn increment_choice_votes(
            &self,
            evaluation_id: Uuid,
            choice_id: Uuid,
        ) -> Result<Option<EvaluationChoice>, StoreError> {
            self.inner.delete_evaluation(evaluation_id).await?;
            self.inner.increment_choice_votes(evaluation_id, choice_id).await
        }

        async fn create_vehicle(&self, input: VehicleInput) -> Result<Vehicle, StoreError> {
            self.inner.create_vehicle(input).await
        }

        async fn update_vehicle(&self, id: Uuid, input: VehicleInput) -> Result<Vehicle, StoreError> {
            self.inner.update_vehicle(id, input).await
        }

        async fn delete_vehicle(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_vehicle(id).await
        }

        async fn get_vehicle(&self, id: Uuid) -> Result<Option<Vehicle>, StoreError> {
            self.inner.get_vehicle(id).await
        }

        async fn list_vehicles(&self, filter: &VehicleFilter) -> Result<Vec<Vehicle>, StoreError> {
            self.inner.list_vehicles(filter).await
        }

        async fn count_vehicles(&self) -> Result<i64, StoreError> {
            self.inner.count_vehicles().await
        }

        async fn create_maintenance_type(&self, input: MaintenanceTypeInput) -> Result<MaintenanceType, StoreError> {
            self.inner.create_maintenance_type(input).await
        }

        async fn update_maintenance_type(&self, id: Uuid, input: MaintenanceTypeInput) -> Result<MaintenanceType, StoreError> {
            self.inner.update_maintenance_type(id, input).await
        }

        async fn delete_maintenance_type(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_maintenance_type(id).await
        }

        async fn get_maintenance_type(&self, id: Uuid) -> Result<Option<MaintenanceType>, StoreError> {
            self.inner.get_maintenance_type(id).await
        }

        async fn list_maintenance_types(&self, active_only: bool) -> Result<Vec<MaintenanceType>, StoreError> {
            self.inner.list_maintenance_types(active_only).await
        }

        async fn count_maintenance_types(&self) -> Result<i64, StoreError> {
            self.inner.count_maintenance_types().await
        }

        async fn create_maintenance(&self, input: MaintenanceInput) -> Result<Maintenance, StoreError> {
            self.inner.create_maintenance(input).await
        }

        async fn update_maintenance(&self, id: Uuid, input: MaintenanceInput) -> Result<Maintenance, StoreError> {
            self.inner.update_maintenance(id, input).await
        }

        async fn delete_maintenance(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_maintenance(id).await
        }

        async fn get_maintenance(&self, id: Uuid) -> Result<Option<Maintenance>, StoreError> {
            self.inner.get_maintenance(id).await
        }

        async fn list_maintenances(&self, filter: &MaintenanceFilter) -> Result<Vec<Maintenance>, StoreError> {
            self.inner.list_maintenances(filter).await
        }

        async fn count_maintenances(&self, filter: &MaintenanceFilter) -> Result<i64, StoreError> {
            self.inner.count_maintenances(filter).await
        }

        async fn create_evaluation(&self, input: EvaluationInput) -> Result<ServiceEvaluation, StoreError> {
            self.inner.create_evaluation(input).await
        }

        async fn update_evaluation(&self, id: Uuid, input: EvaluationInput) -> Result<ServiceEvaluation, StoreError> {
            self.inner.update_evaluation(id, input).await
        }

        async fn delete_evaluation(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_evaluation(id).await
        }

        async fn get_evaluation(&self, id: Uuid) -> Result<Option<ServiceEvaluation>, StoreError> {
            self.inner.get_evaluation(id).await
        }

        async fn get_evaluation_for_maintenance(&self, maintenance_id: Uuid) -> Result<Option<ServiceEvaluation>, StoreError> {
            self.inner.get_evaluation_for_maintenance(maintenance_id).await
        }

        async fn list_evaluations(&self, filter: &EvaluationFilter) -> Result<Vec<ServiceEvaluation>, StoreError> {
            self.inner.list_evaluations(filter).await
        }

        async fn count_evaluations(&self) -> Result<i64, StoreError> {
            self.inner.count_evaluations().await
        }

        async fn add_choice(&self, evaluation_id: Uuid, input: ChoiceInput) -> Result<EvaluationChoice, StoreError> {
            self.inner.add_choice(evaluation_id, input).await
        }

        async fn update_choice(&self, id: Uuid, input: ChoiceInput) -> Result<EvaluationChoice, StoreError> {
            self.inner.update_choice(id, input).await
        }

        async fn delete_choice(&self, id: Uuid) -> Result<(), StoreError> {
            self.inner.delete_choice(id).await
        }

        async fn get_choice(&self, id: Uuid) -> Result<Option<EvaluationChoice>, StoreError> {
            self.inner.get_choice(id).await
        }

        async fn list_choices(&self, evaluation_id: Uuid) -> Result<Vec<EvaluationChoice>, StoreError> {
            self.inner.list_choices(evaluation_id).await
        }
    }

    #[tokio::test]
    async fn evaluation_deleted_mid_vote_is_not_found() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;
        let store = DeletedMidVote {
            inner: Arc::try_unwrap(f.store).ok().unwrap(),
        };

        let err = vote(&store, f.evaluation_id, Some(f.choices[0]))
            .await
            .unwrap_err();
        assert!(matches!(err, VoteError::NotFound(id) if id == f.evaluation_id));
    }

    #[tokio::test]
    async fn sequential_votes_accumulate() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;

        for _ in 0..5 {
            vote(&*f.store, f.evaluation_id, Some(f.choices[1]))
                .await
                .unwrap();
        }
        let last = vote(&*f.store, f.evaluation_id, Some(f.choices[1]))
            .await
            .unwrap();

        assert_eq!(last.votes, 6);
        assert_eq!(votes_of(&f.store, f.evaluation_id).await, vec![0, 6, 0]);
        assert_eq!(
            total_votes_for(&*f.store, f.evaluation_id).await.unwrap(),
            6
        );
    }

    #[tokio::test]
    async fn concurrent_votes_are_not_lost() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;

        let mut handles = Vec::new();
        for _ in 0..50 {
            let store = f.store.clone();
            let (evaluation_id, choice_id) = (f.evaluation_id, f.choices[0]);
            handles.push(tokio::spawn(async move {
                vote(&*store, evaluation_id, Some(choice_id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(votes_of(&f.store, f.evaluation_id).await, vec![50, 0, 0]);
    }

    #[tokio::test]
    async fn unknown_evaluation_is_not_found() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;
        vote(&*f.store, f.evaluation_id, Some(f.choices[2]))
            .await
            .unwrap();

        let missing = Uuid::new_v4();
        let err = vote(&*f.store, missing, Some(f.choices[0]))
            .await
            .unwrap_err();

        assert!(matches!(err, VoteError::NotFound(id) if id == missing));
        assert_eq!(votes_of(&f.store, f.evaluation_id).await, vec![0, 0, 1]);
    }

    #[tokio::test]
    async fn choice_from_another_evaluation_is_invalid() {
        let store = Arc::new(MemoryStore::new());
        let f = fixture(store.clone(), "ABC123").await;
        let other = fixture(store.clone(), "XYZ789").await;

        let err = vote(&*store, f.evaluation_id, Some(other.choices[0]))
            .await
            .unwrap_err();

        assert!(matches!(err, VoteError::InvalidChoice));
        assert_eq!(votes_of(&store, f.evaluation_id).await, vec![0, 0, 0]);
        assert_eq!(votes_of(&store, other.evaluation_id).await, vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn missing_selection_is_invalid() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;

        let err = vote(&*f.store, f.evaluation_id, None)
            .await
            .unwrap_err();

        assert!(matches!(err, VoteError::InvalidChoice));
        assert_eq!(votes_of(&f.store, f.evaluation_id).await, vec![0, 0, 0]);
    }

    #[tokio::test]
    async fn nonexistent_choice_id_is_invalid() {
        let f = fixture(Arc::new(MemoryStore::new()), "ABC123").await;

        let err = vote(&*f.store, f.evaluation_id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();

        assert!(matches!(err, VoteError::InvalidChoice));
    }
}
