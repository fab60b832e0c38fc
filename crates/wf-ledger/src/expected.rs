use serde::{Deserialize, Deserializer};
use wf_types::CommitId;

/// What a writer believes a branch head to be.
///
/// On the wire this is an optional, nullable commit id: an absent field is
/// [`ExpectedHead::Any`], `null` is [`ExpectedHead::Unborn`] and a string is
/// [`ExpectedHead::Commit`]. Use `#[serde(default)]` on the field so the
/// absent case deserializes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExpectedHead {
    /// No check; commit on top of whatever the head is.
    #[default]
    Any,
    /// The branch must have no commits yet.
    Unborn,
    /// The head must be exactly this commit.
    Commit(CommitId),
}

impl ExpectedHead {
    /// Returns `true` if `current` satisfies the expectation.
    pub fn matches(&self, current: Option<&CommitId>) -> bool {
        match self {
            Self::Any => true,
            Self::Unborn => current.is_none(),
            Self::Commit(id) => current == Some(id),
        }
    }

    /// The head this writer expected, falling back to `observed` when no
    /// expectation was given.
    pub fn resolve(&self, observed: Option<&CommitId>) -> Option<CommitId> {
        match self {
            Self::Any => observed.cloned(),
            Self::Unborn => None,
            Self::Commit(id) => Some(id.clone()),
        }
    }
}

impl From<Option<CommitId>> for ExpectedHead {
    fn from(value: Option<CommitId>) -> Self {
        value.map_or(Self::Unborn, Self::Commit)
    }
}

impl<'de> Deserialize<'de> for ExpectedHead {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<CommitId>::deserialize(deserializer).map(Self::from)
    }
}
