//! Goal progress evaluation: pure arithmetic over per-task completion
//! aggregates. All displayed percentages round with ceiling.

use serde::Serialize;

use super::data::CalculationType;
use crate::tasks::data::TaskID;

/// Per-task completion aggregate for one resolved period.
#[derive(Debug, Clone)]
pub struct TaskAggregate {
    pub task_id: TaskID,
    pub duration_minutes: i64,
    pub allow_multiple_completions: bool,
    pub completions: i64,
}

impl TaskAggregate {
    /// Tasks that do not allow repeats count at most once per period.
    pub fn effective_completions(&self) -> i64 {
        if self.allow_multiple_completions {
            self.completions
        } else {
            self.completions.min(1)
        }
    }

    fn is_completed(&self) -> bool {
        self.completions > 0
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgress {
    pub completed: i64,
    pub required: i64,
    pub percentage: i64,
    pub is_achieved: bool,
}

fn ceil_percentage(completed: i64, required: i64) -> i64 {
    if required <= 0 {
        return 0;
    }
    (completed as f64 / required as f64 * 100.0).ceil() as i64
}

pub fn evaluate(
    calculation_type: CalculationType,
    target_value: i64,
    aggregates: &[TaskAggregate],
) -> GoalProgress {
    let (completed, required) = match calculation_type {
        CalculationType::PercentageTaskCount => {
            let done = aggregates.iter().filter(|a| a.is_completed()).count() as i64;
            (done, aggregates.len() as i64)
        }
        CalculationType::PercentageTime => {
            let done_minutes: i64 = aggregates
                .iter()
                .filter(|a| a.is_completed())
                .map(|a| a.duration_minutes)
                .sum();
            let total_minutes: i64 = aggregates.iter().map(|a| a.duration_minutes).sum();
            // The completed figure is itself a percent of the available time,
            // then measured against the target percent.
            (ceil_percentage(done_minutes, total_minutes), target_value)
        }
        CalculationType::FixedTaskCount => {
            let done: i64 = aggregates.iter().map(|a| a.effective_completions()).sum();
            (done, target_value)
        }
        CalculationType::FixedTime => {
            let minutes: i64 = aggregates
                .iter()
                .map(|a| a.effective_completions() * a.duration_minutes)
                .sum();
            (minutes, target_value)
        }
    };

    let percentage = ceil_percentage(completed, required);

    GoalProgress {
        completed,
        required,
        percentage,
        is_achieved: percentage >= 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregate(task_id: i64, duration: i64, allow_multiple: bool, completions: i64) -> TaskAggregate {
        TaskAggregate {
            task_id,
            duration_minutes: duration,
            allow_multiple_completions: allow_multiple,
            completions,
        }
    }

    #[test]
    fn task_count_percentage_rounds_up() {
        // 2 of 3 tasks done: 66.67% rounds to 67, never 66.
        let progress = evaluate(
            CalculationType::PercentageTaskCount,
            80,
            &[
                aggregate(1, 10, false, 1),
                aggregate(2, 10, false, 2),
                aggregate(3, 10, false, 0),
            ],
        );
        assert_eq!(progress.completed, 2);
        assert_eq!(progress.required, 3);
        assert_eq!(progress.percentage, 67);
        assert!(!progress.is_achieved);
    }

    #[test]
    fn exactly_one_hundred_achieves_and_ninety_nine_does_not() {
        let all_done = evaluate(
            CalculationType::FixedTaskCount,
            4,
            &[aggregate(1, 0, true, 4)],
        );
        assert_eq!(all_done.percentage, 100);
        assert!(all_done.is_achieved);

        let just_short = evaluate(
            CalculationType::FixedTaskCount,
            100,
            &[aggregate(1, 0, true, 99)],
        );
        assert_eq!(just_short.percentage, 99);
        assert!(!just_short.is_achieved);
    }

    #[test]
    fn fixed_time_sums_completion_minutes() {
        // 20 + 25 minutes against a 60 minute target: ceil(45/60*100) = 75.
        let progress = evaluate(
            CalculationType::FixedTime,
            60,
            &[aggregate(1, 20, false, 1), aggregate(2, 25, false, 1)],
        );
        assert_eq!(progress.completed, 45);
        assert_eq!(progress.required, 60);
        assert_eq!(progress.percentage, 75);
        assert!(!progress.is_achieved);
    }

    #[test]
    fn repeat_completions_count_only_when_allowed() {
        // Task 1 allows repeats (3 × 10 min), task 2 does not (capped at 1 × 20).
        let aggregates = [aggregate(1, 10, true, 3), aggregate(2, 20, false, 5)];

        let count = evaluate(CalculationType::FixedTaskCount, 10, &aggregates);
        assert_eq!(count.completed, 4);

        let time = evaluate(CalculationType::FixedTime, 60, &aggregates);
        assert_eq!(time.completed, 50);
    }

    #[test]
    fn percentage_time_compares_percent_against_target_percent() {
        // 30 of 60 available minutes done = 50%; target is 80% of the time,
        // so progress toward the goal is ceil(50/80*100) = 63.
        let progress = evaluate(
            CalculationType::PercentageTime,
            80,
            &[aggregate(1, 30, false, 1), aggregate(2, 30, false, 0)],
        );
        assert_eq!(progress.completed, 50);
        assert_eq!(progress.required, 80);
        assert_eq!(progress.percentage, 63);
        assert!(!progress.is_achieved);
    }

    #[test]
    fn empty_goals_report_zero_not_panic() {
        let no_tasks = evaluate(CalculationType::PercentageTaskCount, 80, &[]);
        assert_eq!(no_tasks.percentage, 0);
        assert!(!no_tasks.is_achieved);

        let zero_target = evaluate(
            CalculationType::FixedTime,
            0,
            &[aggregate(1, 30, false, 1)],
        );
        assert_eq!(zero_target.percentage, 0);
        assert!(!zero_target.is_achieved);
    }
}
