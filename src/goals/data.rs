use serde::{Deserialize, Serialize};

use crate::lists::data::ListID;
use crate::period::ResetPeriod;
use crate::users::data::UserID;

pub type GoalID = i64;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationType {
    PercentageTaskCount,
    PercentageTime,
    FixedTaskCount,
    FixedTime,
}

impl CalculationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PercentageTaskCount => "percentage_task_count",
            Self::PercentageTime => "percentage_time",
            Self::FixedTaskCount => "fixed_task_count",
            Self::FixedTime => "fixed_time",
        }
    }

    pub fn parse(value: &str) -> Option<CalculationType> {
        match value {
            "percentage_task_count" => Some(Self::PercentageTaskCount),
            "percentage_time" => Some(Self::PercentageTime),
            "fixed_task_count" => Some(Self::FixedTaskCount),
            "fixed_time" => Some(Self::FixedTime),
            _ => None,
        }
    }
}

/// Goal cadences are the bounded subset of list reset periods: a goal always
/// resolves to a concrete range, never to "all-time".
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodType {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annually,
}

impl PeriodType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }

    pub fn parse(value: &str) -> Option<PeriodType> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "quarterly" => Some(Self::Quarterly),
            "annually" => Some(Self::Annually),
            _ => None,
        }
    }

    pub fn as_reset_period(&self) -> ResetPeriod {
        match self {
            Self::Daily => ResetPeriod::Daily,
            Self::Weekly => ResetPeriod::Weekly,
            Self::Monthly => ResetPeriod::Monthly,
            Self::Quarterly => ResetPeriod::Quarterly,
            Self::Annually => ResetPeriod::Annually,
        }
    }
}

/// `list_ids` is a snapshot of list ids taken when the goal was saved; ids
/// of lists deleted afterwards simply stop contributing.
#[derive(Serialize, Debug, Clone)]
pub struct Goal {
    pub id: GoalID,
    pub user_id: UserID,
    pub name: String,
    pub calculation_type: CalculationType,
    pub target_value: i64,
    pub period_type: PeriodType,
    pub list_ids: Vec<ListID>,
}

#[derive(Deserialize, Debug)]
pub struct CreateGoalRequest {
    pub name: String,
    pub calculation_type: CalculationType,
    pub target_value: i64,
    pub period_type: PeriodType,
    pub list_ids: Vec<ListID>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateGoalRequest {
    pub name: Option<String>,
    pub calculation_type: Option<CalculationType>,
    pub target_value: Option<i64>,
    pub period_type: Option<PeriodType>,
    pub list_ids: Option<Vec<ListID>>,
}
