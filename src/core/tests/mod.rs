//! Core module tests
//!
//! Contains test suites for core functionality:
//! - Conflict and overlap detection tests
//! - Keymap parser tests
//! - Relaxed JSON tests
//! - Type tests (KeyChord, ChordSequence, Keybinding)
