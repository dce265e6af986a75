//! # Query Language - Abstract Syntax Tree
//!
//! This module defines the AST for the query language: a compact notation for
//! navigating into JSON documents, slicing and iterating collections, rewriting
//! fields, and piping the result of one statement into the next.
//!
//! ## Architecture Overview
//!
//! - **[commands]** - The command variants a statement is made of
//! - **[query]** - Statements, piped statements and the top-level query
//!
//! ## Quick Start
//!
//! ```text
//! .books.[*].name
//! ```
//!
//! Selects `books`, iterates every element, and returns the list of names.
//!
//! ## Core Concepts
//!
//! ### Commands
//!
//! - **Selector** `.key` / `.[N]` - descend into one child
//! - **Iterator** `.[*]` / `.[a:b]` - address several children
//! - **Assignment** `.key=value` - write a value (terminal)
//! - **Function chain** `#name(args)#...` - apply transforms (terminal)
//! - **List construction** `[a, (query), ...]` - build a list (whole statement)
//!
//! ### Pipes
//!
//! ```text
//! statement | statement | ...
//! ```
//!
//! Each statement consumes the previous result as its document.
//!
//! ### Read and Write Mode
//!
//! A statement ending in an assignment or a modifying function chain is
//! evaluated against a copy of its input and returns the rewritten copy. An
//! iterator in such a statement applies the mutation to every element it
//! addresses instead of collecting results.
//!
//! ## Examples
//!
//! ### Mass Assignment
//!
//! ```text
//! .books.[*].date=s(2014-12-12)
//! ```
//!
//! ### Assignment From a Sibling Field
//!
//! ```text
//! .books.[*].date=(.author)
//! ```
//!
//! ### Function Chain
//!
//! ```text
//! .data#sort()#rsort(value)
//! ```
pub mod commands;
pub mod query;

pub use commands::{Command, Function, IteratorSpec, Operand, SelectorKey};
pub use query::{PipedStatement, Query, Statement};
