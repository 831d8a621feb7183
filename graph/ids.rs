/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Entity id minting.
//!
//! Every node, port, edge, frame, and comment id is an opaque UUID. The
//! generator is owned by the store (constructor injection) rather than
//! being a global, so tests and replay fixtures can run a deterministic
//! sequence instead of random v4 ids.

use uuid::Uuid;

/// Mints stable entity ids. Ids are never reused within one store.
#[derive(Debug, Clone)]
pub struct IdGen {
    source: IdSource,
}

#[derive(Debug, Clone)]
enum IdSource {
    Random,
    Sequential(u128),
}

impl IdGen {
    /// Random v4 ids — the production mode.
    pub fn random() -> Self {
        Self {
            source: IdSource::Random,
        }
    }

    /// Counter-derived ids starting at 1, for deterministic tests.
    pub fn sequential() -> Self {
        Self {
            source: IdSource::Sequential(0),
        }
    }

    pub fn next_id(&mut self) -> Uuid {
        match &mut self.source {
            IdSource::Random => Uuid::new_v4(),
            IdSource::Sequential(counter) => {
                *counter += 1;
                Uuid::from_u128(*counter)
            },
        }
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::random()
    }
}
