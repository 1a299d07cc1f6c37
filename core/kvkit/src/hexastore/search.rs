//! Conjunctive pattern search: a sequence of `(s, p, o)` conditions, any
//! term of which may be a named [`Variable`], resolved into a mapping from
//! variable name to the set of bound values consistent with every
//! condition.

use super::triple::{self};
use crate::backend::KvBackend;
use crate::error::KvResult;
use std::collections::{HashMap, HashSet};
use tracing::instrument;

/// A named placeholder in a triple pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    pub name: String,
}

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        Variable { name: name.into() }
    }
}

/// One term of a pattern: either a literal value to match on, or a
/// variable whose binding set this condition contributes to.
#[derive(Debug, Clone)]
pub enum Term {
    Const(String),
    Var(Variable),
}

impl From<&str> for Term {
    fn from(s: &str) -> Self {
        Term::Const(s.to_string())
    }
}

impl From<String> for Term {
    fn from(s: String) -> Self {
        Term::Const(s)
    }
}

impl From<Variable> for Term {
    fn from(v: Variable) -> Self {
        Term::Var(v)
    }
}

/// One `(s, p, o)` pattern condition.
pub struct Condition {
    pub s: Term,
    pub p: Term,
    pub o: Term,
}

/// Build a condition from three terms, each convertible via [`Term`]'s
/// `From` impls (`"literal"` or `Hexastore::var("name")`).
pub fn cond(s: impl Into<Term>, p: impl Into<Term>, o: impl Into<Term>) -> Condition {
    Condition {
        s: s.into(),
        p: p.into(),
        o: o.into(),
    }
}

const POSITIONS: [&str; 3] = ["s", "p", "o"];

fn part_of(triple: &triple::Triple, position: &str) -> &str {
    match position {
        "s" => &triple.s,
        "p" => &triple.p,
        _ => &triple.o,
    }
}

/// Conjunctive search across `conditions`. Order affects cost, not the
/// result. A variable repeated within one condition (e.g. `(X, friend,
/// X)`) acts as an equality constraint: only triples whose terms at those
/// positions agree contribute a binding.
#[instrument(skip(backend, conditions), fields(conditions = conditions.len()))]
pub fn search(
    backend: &dyn KvBackend,
    prefix: &str,
    conditions: &[Condition],
) -> KvResult<HashMap<String, HashSet<String>>> {
    let mut bindings: HashMap<String, HashSet<String>> = HashMap::new();

    for condition in conditions {
        let terms = [&condition.s, &condition.p, &condition.o];
        let mut query_terms: [Option<&str>; 3] = [None, None, None];
        let mut targets: Vec<(&Variable, &str)> = Vec::new();

        for (i, term) in terms.iter().enumerate() {
            match term {
                Term::Const(v) => query_terms[i] = Some(v.as_str()),
                Term::Var(var) => targets.push((var, POSITIONS[i])),
            }
        }

        let matches = triple::query(
            backend,
            prefix,
            query_terms[0],
            query_terms[1],
            query_terms[2],
        )?;

        let mut per_condition: HashMap<&str, HashSet<String>> = HashMap::new();

        for triple in &matches {
            // A repeated variable within one condition constrains all of
            // its positions to agree within that triple.
            let mut consistent_within_triple = true;
            for (var, pos) in &targets {
                for (other_var, other_pos) in &targets {
                    if var.name == other_var.name
                        && pos != other_pos
                        && part_of(triple, pos) != part_of(triple, other_pos)
                    {
                        consistent_within_triple = false;
                    }
                }
            }
            if !consistent_within_triple {
                continue;
            }

            let mut ok = true;
            for (var, pos) in &targets {
                if let Some(existing) = bindings.get(&var.name) {
                    if !existing.contains(part_of(triple, pos)) {
                        ok = false;
                        break;
                    }
                }
            }
            if !ok {
                continue;
            }

            for (_, pos) in &targets {
                per_condition
                    .entry(pos)
                    .or_default()
                    .insert(part_of(triple, pos).to_string());
            }
        }

        for (var, pos) in &targets {
            let fresh = per_condition.get(pos).cloned().unwrap_or_default();
            bindings
                .entry(var.name.clone())
                .and_modify(|existing| *existing = existing.intersection(&fresh).cloned().collect())
                .or_insert(fresh);
        }
    }

    Ok(bindings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::hexastore::triple::{store_ops, Triple};

    fn populated() -> MemoryBackend {
        let backend = MemoryBackend::new();
        for (s, p, o) in [
            ("charlie", "likes", "huey"),
            ("charlie", "likes", "mickey"),
            ("charlie", "likes", "zaizee"),
            ("huey", "is", "cat"),
            ("mickey", "is", "dog"),
            ("zaizee", "is", "cat"),
        ] {
            let triple = Triple::new(s, p, o);
            backend.apply_batch(&store_ops("", &triple).unwrap()).unwrap();
        }
        backend
    }

    #[test]
    fn conjunctive_search_intersects_across_conditions() {
        let backend = populated();
        let x = Variable::new("X");
        let result = search(
            &backend,
            "",
            &[
                cond("charlie", "likes", x.clone()),
                cond(x.clone(), "is", "cat"),
            ],
        )
        .unwrap();
        let bound = result.get("X").cloned().unwrap_or_default();
        let expected: HashSet<String> = ["huey", "zaizee"].iter().map(|s| s.to_string()).collect();
        assert_eq!(bound, expected);
    }

    #[test]
    fn repeated_variable_in_one_condition_is_an_equality_constraint() {
        let backend = MemoryBackend::new();
        for (s, p, o) in [("huey", "friend", "huey"), ("huey", "friend", "mickey")] {
            let triple = Triple::new(s, p, o);
            backend.apply_batch(&store_ops("", &triple).unwrap()).unwrap();
        }
        let x = Variable::new("X");
        let result = search(&backend, "", &[cond(x.clone(), "friend", x)]).unwrap();
        let bound = result.get("X").cloned().unwrap_or_default();
        assert_eq!(bound, HashSet::from(["huey".to_string()]));
    }
}
