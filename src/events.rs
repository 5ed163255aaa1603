use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

/// Version watermark threaded through a watch.
///
/// `0` means "no lower bound", any other value is handed to the store as the
/// index to wait from.
pub type Cursor = u64;

/// The kind of modification the store reports for a change.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    Get,
    Set,
    Create,
    Update,
    Delete,
    /// Key was removed because its ttl elapsed
    Expire,
    CompareAndSwap,
    CompareAndDelete,
    /// Action string the store sent that this crate does not know about
    Other(String),
}

impl FromStr for Action {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use Action::*;
        Ok(match s {
            "get" => Get,
            "set" => Set,
            "create" => Create,
            "update" => Update,
            "delete" => Delete,
            "expire" => Expire,
            "compareAndSwap" => CompareAndSwap,
            "compareAndDelete" => CompareAndDelete,
            otherwise => Other(otherwise.to_owned()),
        })
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        use Action::*;
        match self {
            Get => write!(f, "get"),
            Set => write!(f, "set"),
            Create => write!(f, "create"),
            Update => write!(f, "update"),
            Delete => write!(f, "delete"),
            Expire => write!(f, "expire"),
            CompareAndSwap => write!(f, "compareAndSwap"),
            CompareAndDelete => write!(f, "compareAndDelete"),
            Other(raw) => write!(f, "{raw}"),
        }
    }
}

/// A single change reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChangeEvent {
    pub action: Action,
    pub key: String,
    pub dir: bool,
    pub value: Option<String>,
    pub prev_value: Option<String>,
    pub ttl: Option<i64>,
    /// Version the key was left at by this change, usable as the next [`Cursor`].
    pub modified_index: u64,
}

impl ChangeEvent {
    pub fn new(action: Action, key: impl Into<String>, modified_index: u64) -> Self {
        Self {
            action,
            key: key.into(),
            dir: false,
            value: None,
            prev_value: None,
            ttl: None,
            modified_index,
        }
    }

    pub fn with_value(self, value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..self
        }
    }

    pub fn with_prev_value(self, prev_value: impl Into<String>) -> Self {
        Self {
            prev_value: Some(prev_value.into()),
            ..self
        }
    }

    pub fn with_ttl(self, ttl: i64) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }

    pub fn as_dir(self) -> Self {
        Self { dir: true, ..self }
    }
}

impl Display for ChangeEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} @{}", self.action, self.key, self.modified_index)?;

        if let Some(ref value) = self.value {
            write!(f, " = {value}")?;
        }

        Ok(())
    }
}

/// What a watch observes: a single key, or a key and everything nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget {
    pub key: String,
    pub recursive: bool,
}

impl WatchTarget {
    /// Watch exactly `key`.
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            recursive: false,
        }
    }

    /// Watch `prefix` and every key beneath it.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            key: prefix.into(),
            recursive: true,
        }
    }
}

impl Display for WatchTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.recursive {
            write!(f, "{}/**", self.key.trim_end_matches('/'))
        } else {
            write!(f, "{}", self.key)
        }
    }
}
