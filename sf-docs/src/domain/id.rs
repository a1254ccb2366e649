use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $prefix:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Derive a stable id from `key`, so the same input always maps
            /// to the same id across runs.
            pub fn from_key(key: &str) -> Self {
                let hash = blake3::hash(key.as_bytes());
                let hex = hex::encode(&hash.as_bytes()[..6]);
                Self(format!("{}-{}", $prefix, hex))
            }

            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(SourceId, "src");
define_id!(DocId, "doc");
define_id!(ChunkId, "chk");

impl ChunkId {
    pub fn for_chunk(doc_id: &DocId, index: usize) -> Self {
        Self::from_key(&format!("{doc_id}#{index}"))
    }
}
