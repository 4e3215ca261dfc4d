//! Transport-agnostic notification types and the callback action codec
//!
//! Chat controls carry a compact string payload (Telegram limits it to 64
//! bytes). The payload is decoded exactly once, at the transport boundary,
//! into a [`CallbackAction`]; everything downstream matches on the enum.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::DomainError;
use crate::models::{Action, ActivityKind, ItemRef, MealSlot};

/// Maximum encoded payload length accepted by the chat transport
pub const MAX_CALLBACK_LEN: usize = 64;

/// A decoded control tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CallbackAction {
    /// Complete or skip one exercise or meal
    Item {
        activity_id: Uuid,
        item: ItemRef,
        action: Action,
    },
    /// Complete or skip the whole activity behind a reminder
    Reminder { reminder_id: Uuid, action: Action },
    /// Show the user's progress report
    ShowProgress,
}

impl CallbackAction {
    pub fn item(activity_id: Uuid, item: ItemRef, action: Action) -> Self {
        CallbackAction::Item {
            activity_id,
            item,
            action,
        }
    }

    pub fn reminder(reminder_id: Uuid, action: Action) -> Self {
        CallbackAction::Reminder {
            reminder_id,
            action,
        }
    }

    /// Activity kind targeted by an item action
    pub fn activity_kind(&self) -> Option<ActivityKind> {
        match self {
            CallbackAction::Item { item, .. } => Some(item.activity_kind()),
            _ => None,
        }
    }

    /// Encode into the compact control payload
    pub fn encode(&self) -> String {
        match self {
            CallbackAction::Item {
                activity_id,
                item: ItemRef::Exercise(index),
                action,
            } => format!("ex:{}:{}:{}", activity_id.simple(), index, action_code(*action)),
            CallbackAction::Item {
                activity_id,
                item: ItemRef::Meal(slot),
                action,
            } => format!("ml:{}:{}:{}", activity_id.simple(), slot, action_code(*action)),
            CallbackAction::Reminder {
                reminder_id,
                action,
            } => format!("rm:{}:{}", reminder_id.simple(), action_code(*action)),
            CallbackAction::ShowProgress => "progress".to_string(),
        }
    }
}

fn action_code(action: Action) -> char {
    match action {
        Action::Complete => 'c',
        Action::Skip => 's',
    }
}

fn parse_action(code: &str, raw: &str) -> Result<Action, DomainError> {
    match code {
        "c" => Ok(Action::Complete),
        "s" => Ok(Action::Skip),
        _ => Err(DomainError::InvalidCallback(raw.to_string())),
    }
}

fn parse_id(value: &str, raw: &str) -> Result<Uuid, DomainError> {
    Uuid::parse_str(value).map_err(|_| DomainError::InvalidCallback(raw.to_string()))
}

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for CallbackAction {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidCallback(raw.to_string());
        if raw.len() > MAX_CALLBACK_LEN {
            return Err(invalid());
        }

        let parts: Vec<&str> = raw.split(':').collect();
        match parts.as_slice() {
            ["progress"] => Ok(CallbackAction::ShowProgress),
            ["ex", id, index, code] => {
                let index: u32 = index.parse().map_err(|_| invalid())?;
                Ok(CallbackAction::Item {
                    activity_id: parse_id(id, raw)?,
                    item: ItemRef::Exercise(index),
                    action: parse_action(code, raw)?,
                })
            }
            ["ml", id, slot, code] => {
                let slot: MealSlot = slot.parse().map_err(|_| invalid())?;
                Ok(CallbackAction::Item {
                    activity_id: parse_id(id, raw)?,
                    item: ItemRef::Meal(slot),
                    action: parse_action(code, raw)?,
                })
            }
            ["rm", id, code] => Ok(CallbackAction::Reminder {
                reminder_id: parse_id(id, raw)?,
                action: parse_action(code, raw)?,
            }),
            _ => Err(invalid()),
        }
    }
}

/// One tappable control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Control {
    pub label: String,
    pub action: CallbackAction,
}

impl Control {
    pub fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// A chat message with rows of controls
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Notification {
    pub text: String,
    pub controls: Vec<Vec<Control>>,
}

impl Notification {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            controls: Vec::new(),
        }
    }

    pub fn with_controls(text: impl Into<String>, controls: Vec<Vec<Control>>) -> Self {
        Self {
            text: text.into(),
            controls,
        }
    }

    /// Every control action in display order
    pub fn actions(&self) -> impl Iterator<Item = &CallbackAction> {
        self.controls.iter().flatten().map(|c| &c.action)
    }
}
