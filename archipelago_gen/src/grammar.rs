// String-rewriting grammar with stateful rules.
//
// A `Grammar` holds a symbol string and a `RuleTable`. One expansion pass
// replaces every symbol of the pre-pass string by its rule's expansion, in
// order, exactly once. The pass builds the next string from a snapshot of
// the current one, which gives the same result as splicing each expansion
// into the live string at the original position plus the cumulative growth.
//
// Rules come in two flavours:
// - `Rule::Fixed` always expands to the same string.
// - `Rule::Pool` is a stack of candidates. While more than one remains,
//   each lookup *pops* the most recently added candidate; the last one is
//   returned forever after. This is deliberate: the city registers one
//   candidate per island and one per bridge so that each instance's string
//   is consumed exactly once, in order, before the rule settles on its
//   steady-state expansion. Do not "fix" it into a pure function.
//
// Symbols with no rule (and pools with no candidates) expand to `BLANK`, a
// no-op for every interpreter.
//
// See also: `city.rs`, `plant.rs`, `kelp.rs`, `coral.rs` for the rule sets.

use rustc_hash::FxHashMap;

/// Expansion of unknown symbols.
pub const BLANK: char = ' ';

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    Fixed(String),
    Pool(Vec<String>),
}

impl Rule {
    fn expand_into(&mut self, out: &mut String) {
        match self {
            Rule::Fixed(s) => out.push_str(s),
            Rule::Pool(candidates) => match candidates.len() {
                0 => out.push(BLANK),
                1 => out.push_str(&candidates[0]),
                _ => {
                    if let Some(s) = candidates.pop() {
                        out.push_str(&s);
                    }
                }
            },
        }
    }
}

/// Symbol -> rule map. Only ever looked up by key, never iterated, so hash
/// order cannot leak into output.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    rules: FxHashMap<char, Rule>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `symbol` to always expand to `expansion`, replacing any rule.
    pub fn set_fixed(&mut self, symbol: char, expansion: impl Into<String>) {
        self.rules.insert(symbol, Rule::Fixed(expansion.into()));
    }

    /// Set `symbol` to a candidate pool, replacing any rule. The last element
    /// of `candidates` is consumed first.
    pub fn set_pool(&mut self, symbol: char, candidates: Vec<String>) {
        self.rules.insert(symbol, Rule::Pool(candidates));
    }

    /// Map each of `symbols` to itself.
    pub fn set_identity(&mut self, symbols: &str) {
        for c in symbols.chars() {
            self.set_fixed(c, c);
        }
    }

    /// Push a candidate onto `symbol`'s pool. A fixed rule becomes a pool
    /// whose bottom entry is the old fixed expansion.
    pub fn add_candidate(&mut self, symbol: char, expansion: impl Into<String>) {
        let expansion = expansion.into();
        let rule = self
            .rules
            .entry(symbol)
            .or_insert_with(|| Rule::Pool(Vec::new()));
        match rule {
            Rule::Pool(candidates) => candidates.push(expansion),
            Rule::Fixed(old) => {
                let old = std::mem::take(old);
                *rule = Rule::Pool(vec![old, expansion]);
            }
        }
    }

    pub fn get(&self, symbol: char) -> Option<&Rule> {
        self.rules.get(&symbol)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Expand one symbol, consuming a pool candidate if the rule has more
    /// than one left.
    pub fn expand(&mut self, symbol: char) -> String {
        let mut out = String::new();
        self.expand_into(symbol, &mut out);
        out
    }

    fn expand_into(&mut self, symbol: char, out: &mut String) {
        match self.rules.get_mut(&symbol) {
            Some(rule) => rule.expand_into(out),
            None => out.push(BLANK),
        }
    }
}

/// A symbol string plus the rules that rewrite it.
#[derive(Clone, Debug)]
pub struct Grammar {
    symbols: String,
    rules: RuleTable,
}

impl Grammar {
    pub fn new(axiom: impl Into<String>, rules: RuleTable) -> Self {
        Self {
            symbols: axiom.into(),
            rules,
        }
    }

    pub fn symbols(&self) -> &str {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut RuleTable {
        &mut self.rules
    }

    /// One full pass: every symbol present now is expanded exactly once.
    pub fn expand_pass(&mut self) {
        self.expand_window(usize::MAX);
    }

    /// One pass that expands only the first `limit` symbols and copies the
    /// rest through unchanged.
    pub fn expand_window(&mut self, limit: usize) {
        let snapshot = std::mem::take(&mut self.symbols);
        let mut next = String::with_capacity(snapshot.len() * 2);
        for (i, c) in snapshot.chars().enumerate() {
            if i < limit {
                self.rules.expand_into(c, &mut next);
            } else {
                next.push(c);
            }
        }
        self.symbols = next;
    }

    /// `passes` full passes.
    pub fn expand(&mut self, passes: u32) {
        for pass in 0..passes {
            self.expand_pass();
            tracing::trace!(pass, len = self.symbols.len(), "grammar pass");
        }
    }
}
