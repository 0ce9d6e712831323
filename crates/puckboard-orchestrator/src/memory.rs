// crates/puckboard-orchestrator/src/memory.rs
// ============================================================================
// Module: Conversation Memory
// Description: Owner-scoped in-memory conversation store.
// Purpose: Persist turns per conversation with strict owner isolation.
// Dependencies: puckboard-core, rand
// ============================================================================

//! ## Overview
//! The in-memory store keys conversations by id and enforces owner scope on
//! every operation: a foreign-owned id behaves exactly like a missing one
//! (`NotFound`), so conversation existence is never disclosed across users.
//! Identifiers combine a boot-scoped random component with a monotonic
//! counter, unique within the process lifetime.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use puckboard_core::Conversation;
use puckboard_core::ConversationId;
use puckboard_core::ConversationStore;
use puckboard_core::ConversationStoreError;
use puckboard_core::Timestamp;
use puckboard_core::Turn;
use puckboard_core::User;
use rand::RngCore;
use rand::rngs::OsRng;

// ============================================================================
// SECTION: Id Generation
// ============================================================================

/// Boot-scoped conversation id generator.
///
/// # Invariants
/// - Issued identifiers are unique within the process lifetime.
#[derive(Debug)]
struct ConversationIdGenerator {
    /// Random component fixed at construction.
    boot_id: u64,
    /// Monotonic counter for ids issued by this process.
    counter: AtomicU64,
}

impl ConversationIdGenerator {
    /// Creates a generator with fresh boot entropy.
    fn new() -> Self {
        Self {
            boot_id: OsRng.next_u64(),
            counter: AtomicU64::new(0),
        }
    }

    /// Issues the next identifier.
    fn issue(&self) -> ConversationId {
        let count = self.counter.fetch_add(1, Ordering::Relaxed);
        ConversationId::new(format!("conv-{:016x}-{count:06}", self.boot_id))
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Owner-scoped in-memory conversation store.
#[derive(Debug)]
pub struct InMemoryConversationStore {
    /// Conversations keyed by id.
    conversations: Mutex<BTreeMap<String, Conversation>>,
    /// Identifier generator.
    ids: ConversationIdGenerator,
}

impl InMemoryConversationStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conversations: Mutex::new(BTreeMap::new()),
            ids: ConversationIdGenerator::new(),
        }
    }

    /// Runs a closure under the store lock.
    fn with_map<T>(
        &self,
        operation: impl FnOnce(&mut BTreeMap<String, Conversation>) -> T,
    ) -> Result<T, ConversationStoreError> {
        self.conversations
            .lock()
            .map(|mut map| operation(&mut map))
            .map_err(|_| ConversationStoreError::Storage("store lock poisoned".to_string()))
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationStore for InMemoryConversationStore {
    fn create(&self, owner: &User, title: &str) -> Result<Conversation, ConversationStoreError> {
        let now = Timestamp::now();
        let conversation = Conversation {
            conversation_id: self.ids.issue(),
            owner_user_id: owner.user_id.clone(),
            title: title.to_string(),
            created_ts: now,
            updated_ts: now,
            turns: Vec::new(),
        };
        self.with_map(|map| {
            map.insert(conversation.conversation_id.as_str().to_string(), conversation.clone());
        })?;
        Ok(conversation)
    }

    fn list(&self, owner: &User) -> Result<Vec<Conversation>, ConversationStoreError> {
        self.with_map(|map| {
            let mut owned: Vec<Conversation> = map
                .values()
                .filter(|conversation| conversation.owner_user_id == owner.user_id)
                .cloned()
                .collect();
            owned.sort_by(|a, b| b.updated_ts.cmp(&a.updated_ts));
            owned
        })
    }

    fn get(
        &self,
        owner: &User,
        id: &ConversationId,
    ) -> Result<Conversation, ConversationStoreError> {
        self.with_map(|map| {
            map.get(id.as_str())
                .filter(|conversation| conversation.owner_user_id == owner.user_id)
                .cloned()
        })?
        .ok_or(ConversationStoreError::NotFound)
    }

    fn append_turn(
        &self,
        owner: &User,
        id: &ConversationId,
        turn: Turn,
    ) -> Result<(), ConversationStoreError> {
        self.with_map(|map| {
            let Some(conversation) = map
                .get_mut(id.as_str())
                .filter(|conversation| conversation.owner_user_id == owner.user_id)
            else {
                return Err(ConversationStoreError::NotFound);
            };
            conversation.updated_ts = Timestamp::now();
            conversation.turns.push(turn);
            Ok(())
        })?
    }

    fn rename(
        &self,
        owner: &User,
        id: &ConversationId,
        title: &str,
    ) -> Result<(), ConversationStoreError> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(ConversationStoreError::Invalid("Title cannot be empty".to_string()));
        }
        self.with_map(|map| {
            let Some(conversation) = map
                .get_mut(id.as_str())
                .filter(|conversation| conversation.owner_user_id == owner.user_id)
            else {
                return Err(ConversationStoreError::NotFound);
            };
            conversation.title = trimmed.to_string();
            conversation.updated_ts = Timestamp::now();
            Ok(())
        })?
    }

    fn delete(&self, owner: &User, id: &ConversationId) -> Result<(), ConversationStoreError> {
        self.with_map(|map| {
            let owned = map
                .get(id.as_str())
                .is_some_and(|conversation| conversation.owner_user_id == owner.user_id);
            if owned {
                map.remove(id.as_str());
                Ok(())
            } else {
                Err(ConversationStoreError::NotFound)
            }
        })?
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
