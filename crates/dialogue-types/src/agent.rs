//! Agent domain type.
//!
//! An agent is a simulated chat participant with a depletable tea budget.
//! Identity is the `id`; routing exclusion compares `name`.

use serde::{Deserialize, Serialize};

/// A simulated chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Remaining tea budget in millilitres. Zero means the agent has left.
    pub tea_amount_ml: u32,
}

impl Agent {
    /// Whether the agent still has tea left and should stay in the registry.
    pub fn is_alive(&self) -> bool {
        self.tea_amount_ml > 0
    }

    /// Return a copy of this agent with a different tea budget.
    pub fn with_tea(&self, tea_amount_ml: u32) -> Self {
        Self {
            tea_amount_ml,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Agent {
        Agent {
            id: "a1".to_string(),
            name: "Antoain".to_string(),
            description: "A metaphysics nerd.".to_string(),
            tea_amount_ml: 100,
        }
    }

    #[test]
    fn test_is_alive() {
        assert!(sample().is_alive());
        assert!(!sample().with_tea(0).is_alive());
    }

    #[test]
    fn test_with_tea_keeps_identity() {
        let agent = sample().with_tea(7);
        assert_eq!(agent.id, "a1");
        assert_eq!(agent.name, "Antoain");
        assert_eq!(agent.tea_amount_ml, 7);
    }

    #[test]
    fn test_serde_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["tea_amount_ml"], 100);
        assert_eq!(json["name"], "Antoain");
    }

    #[test]
    fn test_negative_budget_is_rejected() {
        let raw = r#"{"id":"x","name":"n","description":"d","tea_amount_ml":-5}"#;
        assert!(serde_json::from_str::<Agent>(raw).is_err());
    }
}
