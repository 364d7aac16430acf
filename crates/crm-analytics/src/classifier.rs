//! Message authorship classification.
//!
//! Upstream marks who wrote a message through several independent fields
//! (`direction`, `messageBy`, `authorType`, `fromRole`). Classification is a
//! table of `(field, accepted values) -> origin` rules; a message belongs to
//! every origin with at least one matching rule, so a single message may be
//! both outbound and a contact reply.

use crm_core::Message;

/// Message field a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageField {
    Direction,
    MessageBy,
    AuthorType,
    FromRole,
}

impl MessageField {
    fn value<'a>(&self, message: &'a Message) -> Option<&'a str> {
        match self {
            MessageField::Direction => message.direction.as_deref(),
            MessageField::MessageBy => message.message_by.as_deref(),
            MessageField::AuthorType => message.author_type.as_deref(),
            MessageField::FromRole => message.from_role.as_deref(),
        }
    }
}

/// Who a message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Sent by the business side: a user, agent, bot, or the system.
    Outbound,
    /// Sent by the end customer.
    ContactReply,
}

/// A single matcher: `field` equal (case-sensitive) to any of `accepted`.
#[derive(Debug, Clone, Copy)]
pub struct MatchRule {
    pub field: MessageField,
    pub accepted: &'static [&'static str],
    pub origin: Origin,
}

impl MatchRule {
    pub const fn new(
        field: MessageField,
        accepted: &'static [&'static str],
        origin: Origin,
    ) -> Self {
        Self {
            field,
            accepted,
            origin,
        }
    }

    pub fn matches(&self, message: &Message) -> bool {
        self.field
            .value(message)
            .is_some_and(|v| self.accepted.contains(&v))
    }
}

/// Rules for the field conventions upstream is known to use.
pub const DEFAULT_RULES: &[MatchRule] = &[
    MatchRule::new(MessageField::Direction, &["outbound"], Origin::Outbound),
    MatchRule::new(
        MessageField::MessageBy,
        &["user", "agent", "bot", "system"],
        Origin::Outbound,
    ),
    MatchRule::new(
        MessageField::AuthorType,
        &["User", "Agent", "AI", "System"],
        Origin::Outbound,
    ),
    MatchRule::new(MessageField::Direction, &["inbound"], Origin::ContactReply),
    MatchRule::new(MessageField::MessageBy, &["contact"], Origin::ContactReply),
    MatchRule::new(MessageField::AuthorType, &["Contact"], Origin::ContactReply),
    MatchRule::new(MessageField::FromRole, &["contact"], Origin::ContactReply),
];

/// Result of classifying one message. Both flags may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub outbound: bool,
    pub contact_reply: bool,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<MatchRule>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl Classifier {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    /// Add a rule for an additional upstream convention.
    pub fn with_rule(mut self, rule: MatchRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn is(&self, message: &Message, origin: Origin) -> bool {
        self.rules
            .iter()
            .filter(|r| r.origin == origin)
            .any(|r| r.matches(message))
    }

    pub fn classify(&self, message: &Message) -> Classification {
        Classification {
            outbound: self.is(message, Origin::Outbound),
            contact_reply: self.is(message, Origin::ContactReply),
        }
    }
}
