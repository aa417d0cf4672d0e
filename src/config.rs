use std::path::PathBuf;

use crate::{
    domain::{Owner, Session},
    errors::{Result, TrackerError},
};

/// Resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    pub ledger_path: PathBuf,
    /// The fixed set of selectable owners; empty in single-user mode.
    pub owners: Vec<Owner>,
    pub session: Session,
}

impl Config {
    /// Validates the raw options.
    ///
    /// With a non-empty owner set a session owner is mandatory and must be one
    /// of them.
    pub fn resolve(ledger_path: PathBuf, owners: Vec<String>, user: Option<String>) -> Result<Self> {
        if ledger_path.as_os_str().is_empty() {
            return Err(TrackerError::Configuration(
                "ledger location must not be empty".to_string(),
            ));
        }

        let owners: Vec<Owner> = owners
            .iter()
            .map(|owner| owner.trim())
            .filter(|owner| !owner.is_empty())
            .map(Owner::new)
            .collect();
        let user = user
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty())
            .map(Owner::new);

        let session = match user {
            Some(owner) if owners.is_empty() || owners.contains(&owner) => Session::for_owner(owner),
            Some(owner) => {
                return Err(TrackerError::Configuration(format!(
                    "user '{owner}' is not one of: {}",
                    owner_list(&owners)
                )));
            }
            None if owners.is_empty() => Session::default(),
            None => {
                return Err(TrackerError::Configuration(format!(
                    "select a user, one of: {}",
                    owner_list(&owners)
                )));
            }
        };

        Ok(Config {
            ledger_path,
            owners,
            session,
        })
    }
}

fn owner_list(owners: &[Owner]) -> String {
    owners
        .iter()
        .map(Owner::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
