//! Practice Service
//!
//! The three practice operations. Each one opens its own practice context,
//! validates everything it can before the first write, then commits.
//!
//! ## Flow
//!
//! ```text
//! assign_task ──► instance (predicted flow frozen)
//!                    │
//!   process_attempt_report ──► solved? ──► solution count, first-solve credits
//!                    │
//!   process_flow_report ──► skill / difficulty update
//! ```

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use flocs_common::{
    Factor, FlocsError, FlowRating, InstanceId, LearnerId, NewTaskInstance, Result, TaskId,
    TaskInstance,
};

use crate::config::PracticeConfig;
use crate::domain::context::{CommitMode, PracticeContext};
use crate::domain::credits::CreditCalculator;
use crate::domain::parameters_update::ParameterUpdater;
use crate::domain::prediction::FlowPredictor;
use crate::domain::selection::{ScoreSelector, TaskSelector};
use crate::infra::instructions::{ConceptInstructions, InstructionsProvider};
use crate::infra::parameter_store::{InMemoryParameterStore, ParameterStore};
use crate::infra::repository::{InMemoryRepository, PracticeRepository};
use crate::infra::session::{InMemorySessionTracker, SessionTracker};
use crate::service::payload::{AttemptOutcome, AttemptReport, TaskAssignment};

/// Adaptive practice operations over the storage collaborators
pub struct PracticeService {
    params: Arc<dyn ParameterStore>,
    repository: Arc<dyn PracticeRepository>,
    sessions: Arc<dyn SessionTracker>,
    instructions: Arc<dyn InstructionsProvider>,
    predictor: FlowPredictor,
    selector: ScoreSelector,
    updater: ParameterUpdater,
    credits: CreditCalculator,
    commit_mode: CommitMode,
}

impl PracticeService {
    pub fn new(
        config: &PracticeConfig,
        params: Arc<dyn ParameterStore>,
        repository: Arc<dyn PracticeRepository>,
        sessions: Arc<dyn SessionTracker>,
        instructions: Arc<dyn InstructionsProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let predictor = FlowPredictor::new(&config.model);
        Ok(Self {
            params,
            repository,
            sessions,
            instructions,
            predictor,
            selector: ScoreSelector::new(predictor, config.selection.clone()),
            updater: ParameterUpdater::new(&config.model),
            credits: CreditCalculator::try_new(&config.credits)?,
            commit_mode: config.storage.commit_mode,
        })
    }

    /// Selector used by [`PracticeService::assign_next_task`]
    pub fn score_selector(&self) -> TaskSelector {
        TaskSelector::Score(self.selector.clone())
    }

    pub fn predictor(&self) -> &FlowPredictor {
        &self.predictor
    }

    pub fn commit_mode(&self) -> CommitMode {
        self.commit_mode
    }

    /// Open a practice context with the configured commit mode
    pub async fn open_context(
        &self,
        learner: LearnerId,
        task: Option<TaskId>,
    ) -> Result<PracticeContext> {
        PracticeContext::open(
            self.params.clone(),
            self.repository.as_ref(),
            learner,
            task,
            self.commit_mode,
        )
        .await
    }

    /// Assign the best-scoring eligible task
    pub async fn assign_next_task(&self, learner: Option<LearnerId>) -> Result<TaskAssignment> {
        self.assign_task(learner, &self.score_selector()).await
    }

    /// Assign a specific task, if it is eligible for the learner
    pub async fn assign_task_by_id(
        &self,
        learner: Option<LearnerId>,
        task: TaskId,
    ) -> Result<TaskAssignment> {
        self.assign_task(learner, &TaskSelector::Pinned(task)).await
    }

    /// Choose a task with `selector` and create a new instance of it
    ///
    /// Fails without side effects if nothing is eligible or the selector
    /// rejects the candidates.
    #[instrument(skip(self, selector))]
    pub async fn assign_task(
        &self,
        learner: Option<LearnerId>,
        selector: &TaskSelector,
    ) -> Result<TaskAssignment> {
        let learner = require_learner(learner)?;

        let mut ctx = self.open_context(learner, None).await?;
        let task_ids = ctx.get_all_task_ids();
        if task_ids.is_empty() {
            return Err(FlocsError::NoEligibleTasks { learner });
        }

        let task_id = selector.select(task_ids, learner, &ctx)?;
        let task = self.repository.get_task(task_id).await?;
        let predicted_flow = self.predictor.predict_flow(learner, task_id, &ctx);

        let session = self.sessions.next_task_in_session(learner).await?;
        let instance = self
            .repository
            .create_instance(NewTaskInstance {
                learner,
                task: task_id,
                session: session.session_id,
                predicted_flow,
            })
            .await?;

        self.on_instance_created(&mut ctx, &instance).await?;

        let instructions = self.instructions.instructions_for(learner, &task).await?;

        info!(
            %learner,
            task = %task_id,
            instance = %instance.id,
            predicted_flow,
            task_in_session = session.task_counter,
            "Task assigned"
        );

        Ok(TaskAssignment {
            task_instance_id: instance.id,
            task: task.to_json(),
            task_in_session: session.task_counter,
            instructions,
        })
    }

    /// Post-creation hook: point the aggregate at the new instance and
    /// record the assignment sequence used for recency
    async fn on_instance_created(
        &self,
        ctx: &mut PracticeContext,
        instance: &TaskInstance,
    ) -> Result<()> {
        let mut aggregate = self
            .repository
            .get_or_create_aggregate(instance.learner, instance.task)
            .await?;
        aggregate.record_assignment(instance.id);
        self.repository.save_aggregate(&aggregate).await?;

        let sequence = ctx.update(Factor::TasksAssigned, None, |n| n + 1.0)?;
        ctx.update(Factor::LastAssigned, Some(instance.task), |_| sequence)?;
        ctx.save().await?;
        Ok(())
    }

    /// Apply an attempt report and award credits for a first-time solve
    ///
    /// Reports older than the stored attempt counter are rejected. A report
    /// with the stored counter is re-applied, so a replay neither counts the
    /// solve again nor awards credits twice.
    #[instrument(skip(self, report), fields(instance = %report.task_instance_id, attempt = report.attempt_count))]
    pub async fn process_attempt_report(
        &self,
        learner: Option<LearnerId>,
        report: &AttemptReport,
    ) -> Result<AttemptOutcome> {
        let learner = require_learner(learner)?;
        let mut instance = self.repository.get_instance(report.task_instance_id).await?;

        if report.attempt_count < instance.attempt_count {
            warn!(%learner, stored = instance.attempt_count, "Obsolete attempt report");
            return Err(FlocsError::StaleReport {
                instance: instance.id,
                reported: report.attempt_count,
                stored: instance.attempt_count,
            });
        }
        check_owner(&instance, learner)?;

        let mut aggregate = self
            .repository
            .get_or_create_aggregate(learner, instance.task)
            .await?;
        let solved_before = aggregate.has_solved();
        let newly_solved = report.solved && !instance.solved;
        let first_time = report.solved && !solved_before;

        // Read difficulty and convert it before anything is written
        let mut ctx = None;
        let mut earned_credits = 0;
        if newly_solved || first_time {
            let opened = self.open_context(learner, Some(instance.task)).await?;
            if first_time {
                let difficulty = opened.get(Factor::TaskBias, Some(instance.task));
                earned_credits = self.credits.difficulty_to_credits(difficulty)?;
            }
            ctx = Some(opened);
        }

        instance.update_after_attempt(report.attempt_count, report.time_spent, report.solved);
        if report.given_up {
            instance.mark_given_up();
        }
        self.repository.save_instance(&instance).await?;

        aggregate.update(&instance);
        self.repository.save_aggregate(&aggregate).await?;

        if let Some(mut ctx) = ctx.filter(|_| newly_solved) {
            ctx.update(Factor::SolutionCount, Some(instance.task), |n| n + 1.0)?;
            ctx.save().await?;
        }

        if first_time {
            info!(%learner, task = %instance.task, earned_credits, "Task solved for the first time");
        } else {
            debug!(%learner, task = %instance.task, solved = instance.solved, "Attempt recorded");
        }

        Ok(AttemptOutcome {
            task_solved_first_time: first_time,
            earned_credits,
        })
    }

    /// Record the learner's flow for an instance and update the model
    ///
    /// Giving up counts as the worst rating. Without any rating the report is
    /// a no-op. An instance accepts one flow report.
    #[instrument(skip(self))]
    pub async fn process_flow_report(
        &self,
        learner: Option<LearnerId>,
        instance_id: InstanceId,
        given_up: bool,
        reported_flow: Option<FlowRating>,
    ) -> Result<()> {
        let learner = require_learner(learner)?;

        let reported = if given_up {
            FlowRating::WORST
        } else {
            match reported_flow {
                Some(flow) => flow,
                None => {
                    debug!(%learner, instance = %instance_id, "No flow reported");
                    return Ok(());
                }
            }
        };

        let mut instance = self.repository.get_instance(instance_id).await?;
        check_owner(&instance, learner)?;
        if instance.reported_flow.is_some() {
            warn!(%learner, instance = %instance_id, "Repeated flow report");
            return Err(FlocsError::FlowAlreadyReported {
                instance: instance_id,
            });
        }

        let mut ctx = self.open_context(learner, Some(instance.task)).await?;
        let shift = self.updater.update_parameters(
            &mut ctx,
            learner,
            instance.task,
            reported,
            instance.predicted_flow,
        )?;

        instance.set_reported_flow(reported);
        if given_up {
            instance.mark_given_up();
        }
        self.repository.save_instance(&instance).await?;
        ctx.save().await?;

        info!(
            %learner,
            task = %instance.task,
            %reported,
            predicted = instance.predicted_flow,
            skill = shift.skill,
            difficulty = shift.difficulty,
            "Flow report applied"
        );
        Ok(())
    }
}

fn require_learner(learner: Option<LearnerId>) -> Result<LearnerId> {
    learner.ok_or_else(|| FlocsError::InvalidArgument("learner is required".to_string()))
}

fn check_owner(instance: &TaskInstance, learner: LearnerId) -> Result<()> {
    if instance.belongs_to(learner) {
        return Ok(());
    }
    warn!(instance = %instance.id, owner = %instance.learner, %learner, "Report for another learner's instance");
    Err(FlocsError::NotOwner {
        instance: instance.id,
        owner: instance.learner,
        claimed: learner,
    })
}

/// A [`PracticeService`] wired to the in-memory collaborators
///
/// Keeps typed handles to the stores for seeding and inspection.
pub struct InMemoryPractice {
    pub service: PracticeService,
    pub params: Arc<InMemoryParameterStore>,
    pub repository: Arc<InMemoryRepository>,
    pub sessions: Arc<InMemorySessionTracker>,
    pub instructions: Arc<ConceptInstructions>,
}

impl InMemoryPractice {
    pub fn new(config: &PracticeConfig) -> Result<Self> {
        let params = Arc::new(InMemoryParameterStore::new());
        let repository = Arc::new(InMemoryRepository::new());
        let sessions = Arc::new(InMemorySessionTracker::with_timeout_minutes(
            config.session.timeout_minutes,
        )?);
        let instructions = Arc::new(ConceptInstructions::default());

        let service = PracticeService::new(
            config,
            params.clone(),
            repository.clone(),
            sessions.clone(),
            instructions.clone(),
        )?;

        Ok(Self {
            service,
            params,
            repository,
            sessions,
            instructions,
        })
    }
}

impl std::ops::Deref for InMemoryPractice {
    type Target = PracticeService;

    fn deref(&self) -> &Self::Target {
        &self.service
    }
}
