//! Trigger phrase table
//!
//! Maps configured phrases to canned actions: an optional device command
//! plus a spoken reply. A trigger hit short-circuits the assistant call.

use crate::{Error, Result};

/// One configured trigger action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerEntry {
    /// Phrase matched as a lowercased substring of the transcript
    pub phrase: String,

    /// Optional command forwarded to the device channel on a hit
    pub command: Option<String>,

    /// Reply spoken when the phrase matches
    pub reply: String,
}

/// Ordered, immutable table of trigger entries
///
/// Built once from configuration at startup. Entries are checked in
/// insertion order and the first match wins, so at most one action fires
/// per transcript.
#[derive(Debug, Clone, Default)]
pub struct TriggerTable {
    entries: Vec<TriggerEntry>,
}

impl TriggerTable {
    /// Parse a trigger table from its configuration string
    ///
    /// The format is comma-separated `phrase:command:reply` triples. The
    /// command slot may be empty (`phrase::reply`), and a two-field
    /// `phrase:reply` pair is accepted as a commandless entry.
    ///
    /// # Errors
    ///
    /// Returns error if an entry is malformed, a phrase or reply is empty,
    /// or one configured phrase is a substring of another. Overlapping
    /// phrases would make matching depend silently on table order, so they
    /// are rejected here instead of being discovered at runtime.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for item in raw.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }

            let parts: Vec<&str> = item.splitn(3, ':').collect();
            let (phrase, command, reply) = match parts.as_slice() {
                [phrase, command, reply] => (*phrase, *command, *reply),
                [phrase, reply] => (*phrase, "", *reply),
                _ => {
                    return Err(Error::Config(format!(
                        "malformed trigger entry {item:?}: expected phrase:command:reply"
                    )));
                }
            };

            let phrase = phrase.trim().to_lowercase();
            if phrase.is_empty() {
                return Err(Error::Config(format!(
                    "trigger entry {item:?} has an empty phrase"
                )));
            }

            let reply = reply.trim();
            if reply.is_empty() {
                return Err(Error::Config(format!(
                    "trigger entry {item:?} has an empty reply"
                )));
            }

            let command = command.trim();
            entries.push(TriggerEntry {
                phrase,
                command: if command.is_empty() {
                    None
                } else {
                    Some(command.to_string())
                },
                reply: reply.to_string(),
            });
        }

        let table = Self { entries };
        table.reject_shadowed_phrases()?;

        tracing::debug!(entries = table.entries.len(), "trigger table loaded");
        Ok(table)
    }

    /// Find the first entry whose phrase occurs within `text`
    ///
    /// Matching is case-insensitive substring containment in fixed
    /// insertion order; entries after the first hit are not checked.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<&TriggerEntry> {
        let normalized = text.to_lowercase();
        self.entries.iter().find(|e| normalized.contains(&e.phrase))
    }

    /// Number of configured entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured entries in match order
    #[must_use]
    pub fn entries(&self) -> &[TriggerEntry] {
        &self.entries
    }

    /// Reject tables where one phrase shadows another
    fn reject_shadowed_phrases(&self) -> Result<()> {
        for (i, a) in self.entries.iter().enumerate() {
            for b in &self.entries[i + 1..] {
                if a.phrase.contains(&b.phrase) || b.phrase.contains(&a.phrase) {
                    return Err(Error::Config(format!(
                        "trigger phrase {:?} overlaps {:?}: one would shadow the other",
                        a.phrase, b.phrase
                    )));
                }
            }
        }
        Ok(())
    }
}
