//! Domain models for Sift

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bank account owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    /// The user who owns this account
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A user-defined spending category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    /// The user who owns this category
    pub user_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A transaction as stored, with its current category assignments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Negative = expense, positive = income
    pub amount: f64,
    pub date: DateTime<Utc>,
    /// Categories currently assigned, in assignment order
    pub category_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Description with the missing case folded to an empty string
    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

/// A new transaction to be inserted (before DB insertion)
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub category_ids: Vec<i64>,
}

/// Partial update of a transaction's base fields
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseFieldUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl BaseFieldUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

/// Sort order for paginated transaction scans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionOrder {
    /// Newest first (what rule runs use)
    #[default]
    DateDesc,
    DateAsc,
}

impl TransactionOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::DateDesc => "t.date DESC, t.id DESC",
            Self::DateAsc => "t.date ASC, t.id ASC",
        }
    }
}

/// How the conditions of one rule are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLogic {
    /// Every condition must match
    #[default]
    And,
    /// At least one condition must match
    Or,
}

impl ConditionLogic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl std::str::FromStr for ConditionLogic {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            _ => Err(format!("Unknown condition logic: {}", s)),
        }
    }
}

impl std::fmt::Display for ConditionLogic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction field a condition inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionField {
    Amount,
    Name,
    Description,
    /// Membership of a category id in the transaction's categories
    Category,
    /// The account the transaction is booked on
    Transfer,
}

impl ConditionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Name => "name",
            Self::Description => "description",
            Self::Category => "category",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for ConditionField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "amount" => Ok(Self::Amount),
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "category" => Ok(Self::Category),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown condition field: {}", s)),
        }
    }
}

impl std::fmt::Display for ConditionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Comparison applied between a transaction field and a condition literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOperator {
    Equals,
    Greater,
    Lower,
    Contains,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::Greater => "greater",
            Self::Lower => "lower",
            Self::Contains => "contains",
        }
    }
}

impl std::str::FromStr for ConditionOperator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "equals" | "eq" => Ok(Self::Equals),
            "greater" | "gt" => Ok(Self::Greater),
            "lower" | "lt" => Ok(Self::Lower),
            "contains" => Ok(Self::Contains),
            _ => Err(format!("Unknown condition operator: {}", s)),
        }
    }
}

impl std::fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Transaction field an action writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionField {
    Name,
    Description,
    /// Adds a category to the transaction
    Category,
    /// Stages a mirrored transfer to another account
    Transfer,
}

impl ActionField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::Category => "category",
            Self::Transfer => "transfer",
        }
    }
}

impl std::str::FromStr for ActionField {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            "category" => Ok(Self::Category),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown action field: {}", s)),
        }
    }
}

impl std::fmt::Display for ActionField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user-defined automation rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    /// The rule never matches transactions dated before this instant
    pub effective_from: DateTime<Utc>,
    pub condition_logic: ConditionLogic,
    pub created_at: DateTime<Utc>,
}

/// A predicate over one transaction field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleCondition {
    pub id: i64,
    pub rule_id: i64,
    pub field: ConditionField,
    pub operator: ConditionOperator,
    /// Literal compared against the field, always stored as text
    pub value: String,
}

/// A mutation staged when a rule matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    pub id: i64,
    pub rule_id: i64,
    pub field: ActionField,
    pub value: String,
}

/// A rule hydrated with its conditions and actions (what the engine evaluates)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleWithDetails {
    #[serde(flatten)]
    pub rule: Rule,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
}

impl RuleWithDetails {
    /// Whether evaluating this rule needs the account snapshot
    pub fn references_transfers(&self) -> bool {
        self.conditions
            .iter()
            .any(|c| c.field == ConditionField::Transfer)
            || self.actions.iter().any(|a| a.field == ActionField::Transfer)
    }
}
