use agentvc_types::AgentCard;

use crate::error::RepoResult;

/// Expands external skill pointers before a card is committed.
///
/// Skills may name an external description through their `source` field. A
/// resolver gets the working card and returns the card that will actually be
/// snapshotted; how pointers are looked up is up to the implementation.
pub trait SkillResolver: Send + Sync {
    fn resolve(&self, card: AgentCard) -> RepoResult<AgentCard>;
}

/// Commits the working card exactly as written.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassThroughResolver;

impl SkillResolver for PassThroughResolver {
    fn resolve(&self, card: AgentCard) -> RepoResult<AgentCard> {
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentvc_types::Skill;

    #[test]
    fn pass_through_is_identity() {
        let mut card = AgentCard::new("Scout");
        let mut skill = Skill::new("search", "Search");
        skill.source = Some("skills/search.md".into());
        card.skills.push(skill);
        assert_eq!(PassThroughResolver.resolve(card.clone()).unwrap(), card);
    }
}
