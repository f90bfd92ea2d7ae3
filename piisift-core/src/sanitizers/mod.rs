//! Pattern admission for piisift.
//!
//! This module is responsible for turning declarative recognizer patterns into
//! compiled matchers, refusing the ones that are too long, structurally prone to
//! catastrophic backtracking, syntactically invalid or too slow on adversarial
//! probes. It works closely with `config` (for pattern definitions) and
//! `registry` (which owns the compiled result).

pub mod compiler;
