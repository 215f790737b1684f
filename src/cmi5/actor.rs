//! xAPI actor as handed to cmi5 content

use crate::core::config::LearnerConfig;
use crate::core::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub home_page: String,
    pub name: String,
}

/// An xAPI Agent identified by an account
///
/// Field order matters: the JSON form is passed verbatim in the launch URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub object_type: String,
    pub name: String,
    pub account: Account,
}

impl Actor {
    pub fn agent(
        name: impl Into<String>,
        home_page: impl Into<String>,
        account_name: impl Into<String>,
    ) -> Self {
        Self {
            object_type: "Agent".into(),
            name: name.into(),
            account: Account {
                home_page: home_page.into(),
                name: account_name.into(),
            },
        }
    }

    pub fn from_learner(learner: &LearnerConfig) -> Self {
        Self::agent(&learner.name, &learner.home_page, &learner.id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_json() {
        let actor = Actor::agent("A", "http://h", "a");
        assert_eq!(
            actor.to_json().unwrap(),
            r#"{"objectType":"Agent","name":"A","account":{"homePage":"http://h","name":"a"}}"#
        );
    }

    #[test]
    fn test_from_learner() {
        let learner = LearnerConfig {
            id: "u1".into(),
            name: "Jane".into(),
            home_page: "https://lms.example.com".into(),
        };
        let actor = Actor::from_learner(&learner);
        assert_eq!(actor.account.name, "u1");
        assert_eq!(actor.object_type, "Agent");
    }
}
