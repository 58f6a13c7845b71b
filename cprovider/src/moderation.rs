//! Moderation collaborator contract.

use crate::{ProviderError, ProviderFuture};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModerationVerdict {
    pub flagged: bool,
    pub categories: Vec<String>,
}

impl ModerationVerdict {
    pub fn safe() -> Self {
        Self::default()
    }

    pub fn flagged(categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            flagged: true,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

pub trait ModerationProvider: Send + Sync {
    fn check<'a>(&'a self, text: &'a str)
    -> ProviderFuture<'a, Result<ModerationVerdict, ProviderError>>;
}
