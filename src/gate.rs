use std::collections::HashSet;

/// Guilds allowed to use `/ask` and the passive listener.
pub const ALLOWED_GUILD_IDS: [u64; 2] = [1360032501103333476, 1367322720853032970];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    guild_ids: HashSet<u64>,
}

impl AllowList {
    pub fn new(guild_ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            guild_ids: guild_ids.into_iter().collect(),
        }
    }

    pub fn compiled_in() -> Self {
        Self::new(ALLOWED_GUILD_IDS)
    }

    pub fn contains(&self, guild_id: u64) -> bool {
        self.guild_ids.contains(&guild_id)
    }

    pub fn is_empty(&self) -> bool {
        self.guild_ids.is_empty()
    }

    /// Gate for `/ask`. An empty list disables the gate entirely, so direct
    /// messages pass too.
    ///
    /// This differs from [`AllowList::permits_listener`] and is kept on purpose
    /// until someone confirms which behavior is wanted.
    pub fn permits_command(&self, guild_id: Option<u64>) -> bool {
        self.is_empty() || guild_id.is_some_and(|id| self.contains(id))
    }

    /// Gate for passively observed messages. No guild or no membership means deny.
    pub fn permits_listener(&self, guild_id: Option<u64>) -> bool {
        guild_id.is_some_and(|id| self.contains(id))
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::{ALLOWED_GUILD_IDS, AllowList};

    const OTHER_GUILD: u64 = 42;

    #[test_case(Some(ALLOWED_GUILD_IDS[0]), true ; "first compiled guild")]
    #[test_case(Some(ALLOWED_GUILD_IDS[1]), true ; "second compiled guild")]
    #[test_case(Some(OTHER_GUILD), false ; "unknown guild")]
    #[test_case(None, false ; "direct message")]
    fn compiled_list_gates_both_paths_alike(guild_id: Option<u64>, expected: bool) {
        let list = AllowList::compiled_in();
        assert_eq!(list.permits_command(guild_id), expected);
        assert_eq!(list.permits_listener(guild_id), expected);
    }

    #[test_case(Some(OTHER_GUILD) ; "any guild")]
    #[test_case(None ; "direct message")]
    fn empty_list_opens_commands_but_not_listener(guild_id: Option<u64>) {
        let list = AllowList::default();
        assert!(list.is_empty());
        assert!(list.permits_command(guild_id));
        assert!(!list.permits_listener(guild_id));
    }

    #[test]
    fn duplicate_ids_collapse() {
        let list = AllowList::new([7, 7, 8]);
        assert!(list.contains(7));
        assert!(list.contains(8));
        assert!(!list.contains(9));
    }
}
