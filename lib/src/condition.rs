//! Conditions that gate whether an asteroid set may spawn.

use serde::Deserialize;

/// Exploration milestones tracked by the game for each body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Milestone {
    /// A vessel entered the body's sphere of influence.
    Reached,
    Orbited,
    Landed,
    /// A vessel returned home from the body.
    Returned,
}

/// The slice of game state conditions can observe.
pub trait ProgressTracker {
    fn achieved(&self, body: &str, milestone: Milestone) -> bool;

    /// Number of vessels currently in the body's sphere of influence.
    fn vessels_at(&self, body: &str) -> usize;
}

/// Progress of a new game: nothing achieved, no vessels anywhere.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoProgress;

impl ProgressTracker for NoProgress {
    fn achieved(&self, _body: &str, _milestone: Milestone) -> bool {
        false
    }

    fn vessels_at(&self, _body: &str) -> usize {
        0
    }
}

/// A boolean expression over game state.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Condition {
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Achieved { body: String, milestone: Milestone },
    VesselPresent { body: String },
}

impl Condition {
    pub fn check(&self, progress: &dyn ProgressTracker) -> bool {
        match self {
            Condition::All(cs) => cs.iter().all(|c| c.check(progress)),
            Condition::Any(cs) => cs.iter().any(|c| c.check(progress)),
            Condition::Not(c) => !c.check(progress),
            Condition::Achieved { body, milestone } => progress.achieved(body, *milestone),
            Condition::VesselPresent { body } => progress.vessels_at(body) > 0,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::{testing::Progress, *};

    #[test]
    fn combinators() {
        let progress = Progress::default().with("Duna", Milestone::Orbited);
        let orbited_duna = Condition::Achieved {
            body: "Duna".into(),
            milestone: Milestone::Orbited,
        };
        let landed_duna = Condition::Achieved {
            body: "Duna".into(),
            milestone: Milestone::Landed,
        };
        assert!(orbited_duna.check(&progress));
        assert!(!landed_duna.check(&progress));
        assert!(Condition::Any(vec![orbited_duna.clone(), landed_duna.clone()]).check(&progress));
        assert!(!Condition::All(vec![orbited_duna.clone(), landed_duna.clone()]).check(&progress));
        assert!(Condition::Not(Box::new(landed_duna)).check(&progress));
        assert!(Condition::All(vec![]).check(&progress));
        assert!(!Condition::Any(vec![]).check(&NoProgress));
    }

    #[test]
    fn vessel_presence() {
        let mut progress = Progress::default();
        let cond = Condition::VesselPresent { body: "Eeloo".into() };
        assert!(!cond.check(&progress));
        progress.vessels.insert("Eeloo".into(), 2);
        assert!(cond.check(&progress));
    }

    #[test]
    fn deserializes_as_a_tree() {
        #[derive(Deserialize)]
        struct W {
            when: Condition,
        }
        let w: W = toml::from_str(
            r#"
            [[when.any]]
            achieved = { body = "Jool", milestone = "reached" }
            [[when.any]]
            not = { vessel-present = { body = "Kerbin" } }
            "#,
        )
        .unwrap();
        let progress = Progress::default();
        assert!(w.when.check(&progress));
        assert!(w
            .when
            .check(&Progress::default().with("Jool", Milestone::Reached)));
    }
}
