//! The `branch:<name>` / `commit:<id>` ref grammar.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use wf_types::CommitId;

use crate::error::{RefError, Result};

/// A parsed ref.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "lowercase")]
pub enum RefSpec {
    /// Current unit states of the named branch.
    Branch(String),
    /// Snapshots frozen into the commit.
    Commit(CommitId),
}

impl RefSpec {
    /// Parse a ref string.
    ///
    /// The input is split on the first `:` only, so a commit id may not
    /// itself be recognized as a kind prefix. Both halves must be non-empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use wf_refs::RefSpec;
    ///
    /// assert_eq!(RefSpec::parse("branch:main").unwrap(), RefSpec::Branch("main".into()));
    /// assert!(RefSpec::parse("tag:v1").is_err());
    /// assert!(RefSpec::parse("branch:").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || RefError::InvalidRef {
            input: input.to_string(),
        };
        let (kind, rest) = input.split_once(':').ok_or_else(invalid)?;
        if kind.is_empty() || rest.is_empty() {
            return Err(invalid());
        }
        match kind {
            "branch" => Ok(Self::Branch(rest.to_string())),
            "commit" => Ok(Self::Commit(CommitId::new(rest))),
            _ => Err(invalid()),
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Self::Branch(_))
    }

    pub fn is_commit(&self) -> bool {
        matches!(self, Self::Commit(_))
    }
}

impl FromStr for RefSpec {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for RefSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "branch:{name}"),
            Self::Commit(id) => write!(f, "commit:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_branch_and_commit_refs() {
        assert_eq!(
            RefSpec::parse("branch:main").unwrap(),
            RefSpec::Branch("main".into())
        );
        assert_eq!(
            RefSpec::parse("commit:abc123").unwrap(),
            RefSpec::Commit(CommitId::new("abc123"))
        );
    }

    #[test]
    fn splits_on_first_colon_only() {
        assert_eq!(
            RefSpec::parse("branch:feature:x").unwrap(),
            RefSpec::Branch("feature:x".into())
        );
    }

    #[test]
    fn rejects_malformed_refs() {
        for input in ["", "main", "branch:", ":main", "tag:v1", "Branch:main"] {
            assert_eq!(
                RefSpec::parse(input),
                Err(RefError::InvalidRef {
                    input: input.to_string()
                }),
                "input {input:?} should be rejected"
            );
        }
    }

    #[test]
    fn display_round_trips() {
        for input in ["branch:feature/quests", "commit:c-1"] {
            assert_eq!(RefSpec::parse(input).unwrap().to_string(), input);
        }
    }

    #[test]
    fn from_str_parses() {
        let parsed: RefSpec = "commit:c1".parse().unwrap();
        assert!(parsed.is_commit());
        assert!(!parsed.is_branch());
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_value(RefSpec::Branch("main".into())).unwrap();
        assert_eq!(json, serde_json::json!({"type": "branch", "id": "main"}));
    }
}
