//! Graph decompiler: persisted computation graph → constructor statements.
//!
//! Reconstructs one `let` statement per raw node, in dependency order:
//!
//! ```text
//! let dense_matmul = op::MatMul(scope.sub_scope("dense/MatMul"), x, dense_kernel);
//! ```
//!
//! Operands resolve through a memo keyed by cleaned node name. An operand
//! not yet defined is defined first from the current node table. A
//! `*_resource` operand with no node behind it becomes a variable-handle
//! statement on the spot. Anything else degrades to an
//! `unresolved("name")` placeholder instead of failing; a final pass
//! rewrites placeholders whose `_resource` twin was defined later.
//!
//! The main graph is walked first so its nodes populate the memo, but
//! only statements from the marked functions are returned unless
//! [`DecompileOptions::include_main_graph`] is set.

pub mod load;
pub mod raw;

use std::collections::{HashMap, HashSet};

use log::{debug, trace, warn};

use crate::naming::NameRegistry;

pub use load::{
    load_saved_graph, load_saved_graph_with, GraphLoader, JsonGraphLoader, RuntimeGraphLoader,
};
pub use raw::{clean_name, GraphFunction, RawGraphNode, SavedGraph};

use raw::node_table;

pub const DEFAULT_FUNCTION_MARKER: &str = "__inference_learn";
pub const DEFAULT_INTERNAL_CALL_PREFIXES: [&str; 2] = ["StatefulPartitionedCall", "PartitionedCall"];
pub const RESOURCE_SUFFIX: &str = "_resource";
pub const HANDLE_OP: &str = "VarHandleOp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompileOptions {
    /// Functions whose name contains this are decompiled.
    pub function_marker: String,
    /// Nodes whose name starts with any of these are never emitted.
    pub internal_call_prefixes: Vec<String>,
    /// Keep the main graph's statements in the output.
    pub include_main_graph: bool,
}

impl Default for DecompileOptions {
    fn default() -> Self {
        Self {
            function_marker: DEFAULT_FUNCTION_MARKER.to_string(),
            internal_call_prefixes: DEFAULT_INTERNAL_CALL_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            include_main_graph: false,
        }
    }
}

/// One reconstructed statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedVariable {
    pub ident: String,
    /// Cleaned name of the node it stands for.
    pub node: String,
    pub statement: String,
    /// Operand names still written as placeholders.
    pub unresolved: Vec<String>,
}

/// Placeholder text for an operand that could not be resolved.
pub fn placeholder(name: &str) -> String {
    format!("unresolved({:?})", name)
}

const RESERVED: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn", "for",
    "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
    "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use", "where",
    "while", "async", "await", "dyn", "op", "scope",
];

/// `dense/MatMul` → `dense_matmul`.
pub fn to_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if !ident.chars().any(|c| c.is_ascii_alphanumeric()) {
        ident.insert(0, 'v');
    } else if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

#[derive(Debug, Clone, Default)]
pub struct Decompiler {
    options: DecompileOptions,
}

impl Decompiler {
    pub fn new(options: DecompileOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecompileOptions {
        &self.options
    }

    /// Statements joined by newlines.
    pub fn decompile(&self, graph: &SavedGraph) -> String {
        self.decompile_variables(graph)
            .iter()
            .map(|v| v.statement.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn decompile_variables(&self, graph: &SavedGraph) -> Vec<DefinedVariable> {
        let mut session = Session::new(&self.options);

        let main = node_table(&graph.nodes);
        for node in &graph.nodes {
            session.define(&main, node);
        }
        let main_count = session.vars.len();
        debug!("main graph: {} statements", main_count);

        for function in graph.functions_matching(&self.options.function_marker) {
            let table = node_table(&function.nodes);
            let before = session.vars.len();
            for node in &function.nodes {
                session.define(&table, node);
            }
            debug!(
                "function {}: {} statements",
                function.name,
                session.vars.len() - before
            );
        }

        session.backfill();

        let start = if self.options.include_main_graph {
            0
        } else {
            main_count
        };
        let vars = session.vars.split_off(start);
        let unresolved: usize = vars.iter().map(|v| v.unresolved.len()).sum();
        if unresolved > 0 {
            warn!("{} operand(s) left unresolved", unresolved);
        }
        vars
    }
}

// ─── Session ──────────────────────────────────────────────────────

type NodeTable<'n> = HashMap<&'n str, &'n RawGraphNode>;

enum Resolution<'n> {
    Ident(String),
    Define(&'n RawGraphNode),
    Handle,
    Placeholder,
}

/// A node whose operands are being resolved.
struct Frame<'n> {
    node: &'n RawGraphNode,
    next: usize,
    args: Vec<String>,
    unresolved: Vec<String>,
}

impl<'n> Frame<'n> {
    fn new(node: &'n RawGraphNode) -> Self {
        Self {
            node,
            next: 0,
            args: Vec::with_capacity(node.inputs.len()),
            unresolved: Vec::new(),
        }
    }
}

/// State of one decompile run.
struct Session<'o> {
    options: &'o DecompileOptions,
    vars: Vec<DefinedVariable>,
    memo: HashMap<String, usize>,
    in_progress: HashSet<String>,
    idents: HashSet<String>,
    suffixes: NameRegistry,
}

impl<'o> Session<'o> {
    fn new(options: &'o DecompileOptions) -> Self {
        Self {
            options,
            vars: Vec::new(),
            memo: HashMap::new(),
            in_progress: HashSet::new(),
            idents: HashSet::new(),
            suffixes: NameRegistry::new(),
        }
    }

    fn is_internal_call(&self, name: &str) -> bool {
        self.options
            .internal_call_prefixes
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// Define `root` and, depth first, every operand it needs.
    fn define<'n>(&mut self, table: &NodeTable<'n>, root: &'n RawGraphNode) {
        let root_name = clean_name(&root.name);
        if self.is_internal_call(root_name) || self.memo.contains_key(root_name) {
            return;
        }
        self.in_progress.insert(root_name.to_string());
        let mut stack = vec![Frame::new(root)];

        while let Some(frame) = stack.last_mut() {
            let node = frame.node;
            let Some(operand) = node.inputs.get(frame.next) else {
                if let Some(done) = stack.pop() {
                    self.finish(done);
                }
                continue;
            };

            let name = clean_name(operand);
            match self.resolve(table, name) {
                Resolution::Ident(ident) => {
                    frame.args.push(ident);
                    frame.next += 1;
                }
                Resolution::Handle => {
                    let ident = self.handle(name);
                    frame.args.push(ident);
                    frame.next += 1;
                }
                Resolution::Placeholder => {
                    frame.args.push(placeholder(name));
                    frame.unresolved.push(name.to_string());
                    frame.next += 1;
                }
                Resolution::Define(upstream) => {
                    // Revisits the same operand once `upstream` is memoized.
                    self.in_progress.insert(name.to_string());
                    stack.push(Frame::new(upstream));
                }
            }
        }
    }

    fn resolve<'n>(&self, table: &NodeTable<'n>, name: &str) -> Resolution<'n> {
        if let Some(&index) = self.memo.get(name) {
            return Resolution::Ident(self.vars[index].ident.clone());
        }
        if self.in_progress.contains(name) {
            debug!("operand {} is part of a cycle", name);
            return Resolution::Placeholder;
        }
        if !self.is_internal_call(name) {
            if let Some(&node) = table.get(name) {
                return Resolution::Define(node);
            }
        }
        if name.ends_with(RESOURCE_SUFFIX) {
            return Resolution::Handle;
        }
        Resolution::Placeholder
    }

    fn finish(&mut self, frame: Frame<'_>) {
        let name = clean_name(&frame.node.name);
        let args: String = frame.args.iter().map(|a| format!(", {}", a)).collect();
        let statement = format!(
            "let {{}} = op::{}(scope.sub_scope({:?}){});",
            frame.node.op, name, args
        );
        self.in_progress.remove(name);
        self.push(name, statement, frame.unresolved);
    }

    /// Handle statement for a resource operand with no node behind it.
    fn handle(&mut self, name: &str) -> String {
        let statement = format!("let {{}} = op::{}(scope.sub_scope({:?}));", HANDLE_OP, name);
        self.push(name, statement, Vec::new())
    }

    /// Record a statement whose `{}` is replaced by a fresh identifier.
    fn push(&mut self, name: &str, template: String, unresolved: Vec<String>) -> String {
        let ident = self.fresh_ident(name);
        let statement = template.replacen("{}", &ident, 1);
        trace!("{}", statement);
        self.memo.insert(name.to_string(), self.vars.len());
        self.vars.push(DefinedVariable {
            ident: ident.clone(),
            node: name.to_string(),
            statement,
            unresolved,
        });
        ident
    }

    fn fresh_ident(&mut self, name: &str) -> String {
        let base = to_ident(name);
        let mut ident = base.clone();
        while self.idents.contains(&ident) {
            ident = self.suffixes.unique_name(&base);
        }
        self.idents.insert(ident.clone());
        ident
    }

    /// Rewrite `unresolved("x")` to the identifier of `x_resource` when
    /// that variable exists.
    fn backfill(&mut self) {
        for i in 0..self.vars.len() {
            let pending = std::mem::take(&mut self.vars[i].unresolved);
            let mut still = Vec::new();
            for name in pending {
                let qualified = format!("{}{}", name, RESOURCE_SUFFIX);
                match self.memo.get(&qualified).copied() {
                    Some(target) if target != i => {
                        let ident = self.vars[target].ident.clone();
                        let var = &mut self.vars[i];
                        var.statement = var.statement.replace(&placeholder(&name), &ident);
                        debug!("backfilled {} with {}", name, ident);
                    }
                    _ => still.push(name),
                }
            }
            self.vars[i].unresolved = still;
        }
    }
}

#[cfg(test)]
mod tests;
