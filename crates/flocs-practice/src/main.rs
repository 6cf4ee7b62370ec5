//! FLOCS practice simulation
//!
//! Runs a few simulated learners against a seeded maze catalogue and logs how
//! assignments, credits and the model parameters evolve.

use anyhow::Result;
use serde_json::json;
use tracing::info;

use flocs_common::{Factor, FlowRating, LearnerId, ParameterKey, Task, TaskId, VERSION};
use flocs_practice::{config::PracticeConfig, telemetry, AttemptReport, InMemoryPractice};

const ROUNDS: u32 = 12;

/// (title, level, concepts, true difficulty)
const CATALOGUE: &[(&str, u8, &[&str], f64)] = &[
    ("First steps", 1, &[], -2.5),
    ("Turning around", 1, &[], -1.5),
    ("Diamond on the way", 2, &["tokens"], -0.5),
    ("Ladder", 3, &["loops"], 0.5),
    ("Stairs with a limit", 3, &["loops"], 1.0),
    ("Colorful path", 4, &["colors", "conditions"], 1.5),
    ("Pit avoidance", 4, &["pits", "conditions"], 2.5),
    ("Zig-zag", 5, &["loops", "conditions"], 3.5),
];

/// (learner, true skill)
const LEARNERS: &[(u64, f64)] = &[(1, -1.0), (2, 0.5), (3, 2.0)];

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    info!("Starting FLOCS practice simulation v{}", VERSION);

    let config = PracticeConfig::load()?;
    info!(commit_mode = ?config.storage.commit_mode, "Loaded configuration");

    let practice = InMemoryPractice::new(&config)?;
    for (i, (title, level, concepts, _)) in CATALOGUE.iter().enumerate() {
        let id = TaskId(i as u64 + 1);
        let mut task = Task::new(id, *title)
            .with_level(*level)
            .with_concepts(concepts.iter().copied())
            .with_maze_settings(json!({ "grid-size": 4 + *level }));
        if title.contains("limit") {
            task = task.with_blocks_limit(5);
        }
        practice.repository.add_task(task);
    }

    for &(learner_id, true_skill) in LEARNERS {
        let learner = Some(LearnerId(learner_id));
        let mut credits = 0;

        for round in 1..=ROUNDS {
            let assignment = practice.assign_next_task(learner).await?;
            let task = TaskId(assignment.task["task-id"].as_u64().unwrap_or_default());
            let true_difficulty = (task.0 as usize)
                .checked_sub(1)
                .and_then(|i| CATALOGUE.get(i))
                .map_or(0.0, |entry| entry.3);

            let gap = true_skill - true_difficulty;
            let solved = gap > -1.0;
            let given_up = gap < -2.0;

            let mut report = AttemptReport::new(assignment.task_instance_id, 1, solved)
                .with_time((60.0 * (1.0 - gap).max(0.5)) as u32);
            if given_up {
                report = report.with_given_up();
            }
            let outcome = practice.process_attempt_report(learner, &report).await?;
            credits += outcome.earned_credits;

            let felt = FlowRating::nearest(1.0 + 3.0 / (1.0 + (-gap).exp()));
            practice
                .process_flow_report(learner, assignment.task_instance_id, given_up, Some(felt))
                .await?;

            info!(
                learner = learner_id,
                round,
                %task,
                solved,
                %felt,
                earned = outcome.earned_credits,
                "Round finished"
            );
        }

        let skill = practice
            .params
            .value(LearnerId(learner_id), ParameterKey::learner(Factor::StudentBias))
            .unwrap_or_default();
        info!(learner = learner_id, true_skill, estimated_skill = skill, credits, "Learner summary");
    }

    for (i, (title, _, _, true_difficulty)) in CATALOGUE.iter().enumerate() {
        let key = ParameterKey::task(Factor::TaskBias, TaskId(i as u64 + 1));
        let estimated = practice.params.value(LearnerId(0), key).unwrap_or_default();
        info!(task = *title, true_difficulty, estimated, "Task summary");
    }

    info!(instances = practice.repository.instance_count(), "Simulation finished");
    Ok(())
}
