use crate::db::models::{EvaluationChoice, Maintenance, MaintenanceStatus, ServiceEvaluation};
use crate::db::store::EntityStore;
use crate::error::StoreError;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

impl Maintenance {
    /// A maintenance is overdue only while it is still scheduled and its date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == MaintenanceStatus::Scheduled && now > self.scheduled_date
    }

    /// `completion_date - start_date` when both are set. Not validated, so a
    /// completion recorded before the start yields a negative span.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_date, self.completion_date) {
            (Some(start), Some(done)) => Some(done - start),
            _ => None,
        }
    }
}

impl ServiceEvaluation {
    /// True when `now - 1 day <= pub_date <= now`.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - Duration::days(1) <= self.pub_date && self.pub_date <= now
    }

    /// Active and already published.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.pub_date <= now
    }
}

pub fn total_votes(choices: &[EvaluationChoice]) -> i64 {
    choices.iter().map(|c| i64::from(c.votes)).sum()
}

/// Share of `total` held by `votes`, in percent. Zero when nobody has voted.
pub fn percentage(votes: i32, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    f64::from(votes) / total as f64 * 100.0
}

/// Sum of votes across the evaluation's choices, read fresh from the store.
pub async fn total_votes_for(
    store: &dyn EntityStore,
    evaluation_id: Uuid,
) -> Result<i64, StoreError> {
    let choices = store.list_choices(evaluation_id).await?;
    Ok(total_votes(&choices))
}

pub async fn choice_percentage(
    store: &dyn EntityStore,
    choice: &EvaluationChoice,
) -> Result<f64, StoreError> {
    let total = total_votes_for(store, choice.evaluation_id).await?;
    Ok(percentage(choice.votes, total))
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceTally {
    #[serde(flatten)]
    pub choice: EvaluationChoice,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResults {
    #[serde(flatten)]
    pub evaluation: ServiceEvaluation,
    pub was_published_recently: bool,
    pub total_votes: i64,
    pub choices: Vec<ChoiceTally>,
}

impl EvaluationResults {
    pub fn tally(
        evaluation: ServiceEvaluation,
        choices: Vec<EvaluationChoice>,
        now: DateTime<Utc>,
    ) -> Self {
        let total = total_votes(&choices);
        let choices = choices
            .into_iter()
            .map(|choice| ChoiceTally {
                percentage: percentage(choice.votes, total),
                choice,
            })
            .collect();

        Self {
            was_published_recently: evaluation.was_published_recently(now),
            evaluation,
            total_votes: total,
            choices,
        }
    }
}

pub async fn load_results(
    store: &dyn EntityStore,
    evaluation_id: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<EvaluationResults>, StoreError> {
    let Some(evaluation) = store.get_evaluation(evaluation_id).await? else {
        return Ok(None);
    };
    let choices = store.list_choices(evaluation_id).await?;
    Ok(Some(EvaluationResults::tally(evaluation, choices, now)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, hour, 0, 0).unwrap()
    }

    fn maintenance(status: MaintenanceStatus, scheduled_date: DateTime<Utc>) -> Maintenance {
        Maintenance {
            id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            maintenance_type_id: Uuid::new_v4(),
            scheduled_date,
            start_date: None,
            completion_date: None,
            status,
            description: String::new(),
            cost: None,
            notes: String::new(),
            created_at: scheduled_date,
            updated_at: scheduled_date,
        }
    }

    fn evaluation(pub_date: DateTime<Utc>) -> ServiceEvaluation {
        ServiceEvaluation {
            id: Uuid::new_v4(),
            maintenance_id: Uuid::new_v4(),
            question_text: "Were you satisfied?".to_string(),
            pub_date,
            is_active: true,
        }
    }

    fn choice(evaluation_id: Uuid, votes: i32) -> EvaluationChoice {
        EvaluationChoice {
            id: Uuid::new_v4(),
            evaluation_id,
            choice_text: format!("{votes} votes"),
            votes,
        }
    }

    #[test]
    fn only_scheduled_past_maintenances_are_overdue() {
        let yesterday = at(12) - Duration::days(1);
        let now = at(12);

        assert!(maintenance(MaintenanceStatus::Scheduled, yesterday).is_overdue(now));
        for status in [
            MaintenanceStatus::InProgress,
            MaintenanceStatus::Completed,
            MaintenanceStatus::Cancelled,
        ] {
            assert!(!maintenance(status, yesterday).is_overdue(now));
        }

        // Strictly after the scheduled instant.
        assert!(!maintenance(MaintenanceStatus::Scheduled, now).is_overdue(now));
        assert!(!maintenance(MaintenanceStatus::Scheduled, at(13)).is_overdue(now));
    }

    #[test]
    fn completing_an_overdue_maintenance_clears_it() {
        let now = at(12);
        let mut m = maintenance(MaintenanceStatus::Scheduled, now - Duration::days(1));
        assert!(m.is_overdue(now));
        m.status = MaintenanceStatus::Completed;
        assert!(!m.is_overdue(now));
    }

    #[test]
    fn duration_requires_both_ends_and_may_be_negative() {
        let mut m = maintenance(MaintenanceStatus::Completed, at(8));
        assert_eq!(m.duration(), None);

        m.start_date = Some(at(9));
        assert_eq!(m.duration(), None);

        m.completion_date = Some(at(11));
        assert_eq!(m.duration(), Some(Duration::hours(2)));

        m.completion_date = Some(at(7));
        assert_eq!(m.duration(), Some(Duration::hours(-2)));
    }

    #[test]
    fn recent_publication_window_is_inclusive() {
        let now = at(12);
        assert!(evaluation(now).was_published_recently(now));
        assert!(evaluation(now - Duration::days(1)).was_published_recently(now));
        assert!(
            !evaluation(now - Duration::days(1) - Duration::seconds(1)).was_published_recently(now)
        );
        assert!(!evaluation(now + Duration::seconds(1)).was_published_recently(now));
    }

    #[test]
    fn visibility_requires_active_and_published() {
        let now = at(12);
        assert!(evaluation(now).is_visible(now));
        assert!(!evaluation(at(13)).is_visible(now));

        let mut inactive = evaluation(at(1));
        inactive.is_active = false;
        assert!(!inactive.is_visible(now));
    }

    #[test]
    fn totals_and_percentages() {
        let e = evaluation(at(12));
        let a = choice(e.id, 3);
        let b = choice(e.id, 1);

        assert_eq!(total_votes(&[]), 0);
        assert_eq!(total_votes(&[a.clone(), b.clone()]), 4);

        let results = EvaluationResults::tally(e, vec![a, b], at(12));
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.choices[0].percentage, 75.0);
        assert_eq!(results.choices[1].percentage, 25.0);
        assert!(results.was_published_recently);
    }

    #[test]
    fn no_votes_means_zero_percent() {
        assert_eq!(percentage(0, 0), 0.0);

        let e = evaluation(at(12));
        let results = EvaluationResults::tally(e.clone(), vec![choice(e.id, 0), choice(e.id, 0)], at(12));
        assert!(results.choices.iter().all(|c| c.percentage == 0.0));
    }

    #[test]
    fn results_serialize_flat() {
        let e = evaluation(at(12));
        let results = EvaluationResults::tally(e.clone(), vec![choice(e.id, 2)], at(12));
        let json = serde_json::to_value(&results).unwrap();

        assert_eq!(json["question_text"], "Were you satisfied?");
        assert_eq!(json["total_votes"], 2);
        assert_eq!(json["choices"][0]["votes"], 2);
        assert_eq!(json["choices"][0]["percentage"], 100.0);
    }
}
