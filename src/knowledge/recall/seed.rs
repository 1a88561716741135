//! Built-in art concepts loaded into a fresh memory.

use serde_json::json;

use crate::knowledge::recall::entry::{MemoryKind, NewMemory};

/// Concepts every gallery memory starts with.
#[must_use]
pub fn builtin_concepts() -> Vec<NewMemory> {
    vec![NewMemory::new(
        MemoryKind::Concept,
        json!({
            "name": "Sanat Akımları",
            "description": "Sanat tarihindeki önemli akımlar",
            "examples": ["empresyonizm", "kübizm", "sürrealizm"],
        }),
        ["sanat", "tarih", "stil"],
        0.9,
    )]
}
