/// Decides which persisted keys belong to a departing user.
///
/// Invoked by account deletion for every key the provider lists. The
/// surrounding application owns its key naming, so it supplies the rule.
pub trait NamespaceSweep: Send + Sync {
    fn owns(&self, username: &str, key: &str) -> bool;
}

impl<F> NamespaceSweep for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn owns(&self, username: &str, key: &str) -> bool {
        self(username, key)
    }
}

/// Deletes nothing beyond the account itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSweep;

impl NamespaceSweep for NoSweep {
    fn owns(&self, _username: &str, _key: &str) -> bool {
        false
    }
}

/// Keys of the form `<username>_...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixSweep;

impl NamespaceSweep for PrefixSweep {
    fn owns(&self, username: &str, key: &str) -> bool {
        key.strip_prefix(username)
            .is_some_and(|rest| rest.starts_with('_'))
    }
}
