use serde::{Deserialize, Serialize};
use std::fmt;

/// A decoded field value. The host render sink treats these as typed leaf
/// data; `Flags` carries the already-expanded clause list so the sink never
/// has to know the bit layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Unsigned(u64),
    Signed(i64),
    Text(String),
    Bytes(Vec<u8>),
    Flags { raw: u8, clauses: Vec<String> },
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Unsigned(v) => write!(f, "{}", v),
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Bytes(b) => {
                let hex: Vec<String> = b.iter().take(16).map(|x| format!("{:02X}", x)).collect();
                write!(f, "{}", hex.join(" "))?;
                if b.len() > 16 {
                    write!(f, " ... ({} bytes)", b.len())?;
                }
                Ok(())
            }
            FieldValue::Flags { raw, clauses } => {
                if clauses.is_empty() {
                    write!(f, "0x{:02X} (no error)", raw)
                } else {
                    write!(f, "0x{:02X} ({})", raw, clauses.join(", "))
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub label: String,
    pub value: FieldValue,
    pub children: Vec<FieldNode>,
}

/// Non-fatal problems found while dissecting. These ride along with the
/// tree; none of them abort dissection of the message or the capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A declared field would have read past the end of the buffer.
    OutOfBounds { offset: usize, wanted: usize },
    /// No decode routine registered for this discriminant.
    UnknownVariant { discriminant: u32 },
    /// Declared total length and bytes consumed disagree.
    LengthMismatch { declared: usize, consumed: usize },
    /// A correlation lookup found no matching in-flight command.
    UnresolvedTag { tag: u16 },
    /// Bulk payload on an endpoint whose pipe role was never learned.
    UnresolvedPipeRole { endpoint: u8 },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::OutOfBounds { offset, wanted } => {
                write!(f, "truncated: {} byte read at offset {}", wanted, offset)
            }
            Diagnostic::UnknownVariant { discriminant } => {
                write!(f, "unknown message type 0x{:02X}", discriminant)
            }
            Diagnostic::LengthMismatch { declared, consumed } => {
                write!(f, "declared length {} but consumed {}", declared, consumed)
            }
            Diagnostic::UnresolvedTag { tag } => {
                write!(f, "no in-flight command for tag 0x{:04X}", tag)
            }
            Diagnostic::UnresolvedPipeRole { endpoint } => {
                write!(f, "no pipe role learned for endpoint 0x{:02X}", endpoint)
            }
        }
    }
}

/// The decoded output for one message: an ordered field tree, a one-line
/// summary and any diagnostics collected along the way. This is the whole
/// boundary to the host render sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTree {
    pub nodes: Vec<FieldNode>,
    pub summary: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl FieldTree {
    pub fn new() -> Self {
        FieldTree::default()
    }

    pub fn push(&mut self, label: impl Into<String>, value: FieldValue) {
        self.nodes.push(FieldNode {
            label: label.into(),
            value,
            children: Vec::new(),
        });
    }

    pub fn push_uint(&mut self, label: impl Into<String>, value: u64) {
        self.push(label, FieldValue::Unsigned(value));
    }

    pub fn push_text(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.push(label, FieldValue::Text(value.into()));
    }

    pub fn push_bytes(&mut self, label: impl Into<String>, value: &[u8]) {
        self.push(label, FieldValue::Bytes(value.to_vec()));
    }

    /// Append a node that itself carries child fields.
    pub fn push_group(&mut self, label: impl Into<String>, children: Vec<FieldNode>) {
        self.nodes.push(FieldNode {
            label: label.into(),
            value: FieldValue::Text(format!("{} entries", children.len())),
            children,
        });
    }

    pub fn diagnose(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn set_summary(&mut self, summary: impl Into<String>) {
        self.summary = summary.into();
    }

    pub fn find(&self, label: &str) -> Option<&FieldValue> {
        self.nodes.iter().find(|n| n.label == label).map(|n| &n.value)
    }
}

impl fmt::Display for FieldTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.summary)?;
        for node in &self.nodes {
            writeln!(f, "  {}: {}", node.label, node.value)?;
            for child in &node.children {
                writeln!(f, "    {}: {}", child.label, child.value)?;
            }
        }
        for diag in &self.diagnostics {
            writeln!(f, "  [!] {}", diag)?;
        }
        Ok(())
    }
}

/// Expand an 8-bit error code against a clause table: every set bit
/// contributes its clause, independently of the others.
pub fn expand_bit_flags(raw: u8, clauses: &[(u8, &str)]) -> FieldValue {
    let matched: Vec<String> = clauses
        .iter()
        .filter(|(bit, _)| raw & (1 << bit) != 0)
        .map(|(_, clause)| clause.to_string())
        .collect();
    FieldValue::Flags {
        raw,
        clauses: matched,
    }
}
