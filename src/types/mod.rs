use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

use crate::symbol::Symbol;

/// Zero-based source range as recorded by the cross-reference indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Range {
    pub fn new(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// Decode a SCIP range.
    ///
    /// SCIP packs ranges as `[start_line, start_col, end_col]` when the range
    /// sits on one line and `[start_line, start_col, end_line, end_col]`
    /// otherwise. Any other arity, a negative component or an end before the
    /// start yields `None`.
    pub fn from_scip(raw: &[i32]) -> Option<Self> {
        let unsigned = |v: i32| u32::try_from(v).ok();
        let range = match *raw {
            [line, start, end] => Self::new(
                unsigned(line)?,
                unsigned(start)?,
                unsigned(line)?,
                unsigned(end)?,
            ),
            [start_line, start, end_line, end] => Self::new(
                unsigned(start_line)?,
                unsigned(start)?,
                unsigned(end_line)?,
                unsigned(end)?,
            ),
            _ => return None,
        };
        let ordered = (range.start_line, range.start_column) <= (range.end_line, range.end_column);
        ordered.then_some(range)
    }

    pub fn contains(&self, line: u32, column: u32) -> bool {
        if line < self.start_line || line > self.end_line {
            return false;
        }

        if line == self.start_line && column < self.start_column {
            return false;
        }

        if line == self.end_line && column > self.end_column {
            return false;
        }

        true
    }
}

bitflags! {
    /// Role flags attached to an occurrence (SCIP `SymbolRole`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SymbolRoles: u32 {
        const DEFINITION = 0x1;
        const IMPORT = 0x2;
        const WRITE_ACCESS = 0x4;
        const READ_ACCESS = 0x8;
        const GENERATED = 0x10;
        const TEST = 0x20;
        const FORWARD_DEFINITION = 0x40;
    }
}

impl SymbolRoles {
    /// Unknown bits from newer indexers are dropped rather than rejected.
    pub fn from_scip(raw: i32) -> Self {
        Self::from_bits_truncate(raw as u32)
    }
}

bitflags! {
    /// Kinds carried by a declared symbol-to-symbol relationship.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RelationshipKinds: u8 {
        const REFERENCE = 0x1;
        const IMPLEMENTATION = 0x2;
        const TYPE_DEFINITION = 0x4;
        const DEFINITION = 0x8;
    }
}

/// A source file node in the symbol graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolFile {
    pub path: String,
}

impl SymbolFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// One recorded appearance of a symbol.
///
/// Two references are the same reference when they name the same symbol at the
/// same position; the role flags do not take part in identity.
#[derive(Debug, Clone)]
pub struct SymbolReference {
    pub symbol: Symbol,
    pub line: u32,
    pub column: u32,
    pub roles: SymbolRoles,
}

impl SymbolReference {
    pub fn new(symbol: Symbol, line: u32, column: u32, roles: SymbolRoles) -> Self {
        Self {
            symbol,
            line,
            column,
            roles,
        }
    }

    pub fn is_definition(&self) -> bool {
        self.roles.contains(SymbolRoles::DEFINITION)
    }
}

impl PartialEq for SymbolReference {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol && self.line == other.line && self.column == other.column
    }
}

impl Eq for SymbolReference {}

impl Hash for SymbolReference {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
        self.line.hash(state);
        self.column.hash(state);
    }
}
