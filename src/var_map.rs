//! Bidirectional index between problem variables and engine constants.
//!
//! Built once when a problem is bound to an engine. Forward lookups are by
//! variable index; reverse lookups hash the engine's constant structurally.

use std::collections::HashMap;
use std::hash::Hash;

use crate::engine::Term;
use crate::error::{Error, Result};
use crate::sat_structures::*;

#[derive(Debug, Clone)]
pub struct VarMap<C> {
    var_to_const: Vec<C>,
    const_to_var: HashMap<C, Variable>,
}

impl<C: Clone + Eq + Hash + std::fmt::Debug> VarMap<C> {
    pub fn new() -> Self {
        VarMap {
            var_to_const: Vec::new(),
            const_to_var: HashMap::new(),
        }
    }

    pub fn with_capacity(n_vars: usize) -> Self {
        VarMap {
            var_to_const: Vec::with_capacity(n_vars),
            const_to_var: HashMap::with_capacity(n_vars),
        }
    }

    /// Registers the constant for the next variable and returns that variable.
    /// Fails if `c` is already registered, which would break injectivity.
    pub fn register(&mut self, c: C) -> Result<Variable> {
        let var = Variable::new(self.var_to_const.len() as u32)?;
        if self.const_to_var.contains_key(&c) {
            return Err(Error::contract(format!(
                "engine returned constant {:?} twice during registration",
                c
            )));
        }
        self.const_to_var.insert(c.clone(), var);
        self.var_to_const.push(c);
        Ok(var)
    }

    pub fn n_vars(&self) -> u32 {
        self.var_to_const.len() as u32
    }

    pub fn var_to_const(&self, var: Variable) -> Result<&C> {
        self.var_to_const
            .get(var.idx() as usize)
            .ok_or(Error::OutOfRangeVariable {
                var: var.idx(),
                n_vars: self.n_vars(),
            })
    }

    pub fn const_to_var(&self, c: &C) -> Result<Variable> {
        self.const_to_var
            .get(c)
            .copied()
            .ok_or_else(|| Error::contract(format!("unregistered engine constant {:?}", c)))
    }

    pub fn lit_to_term(&self, lit: Literal) -> Result<Term<C>> {
        let t = Term::Const(self.var_to_const(lit.var())?.clone());
        Ok(if lit.sign() { !t } else { t })
    }

    /// Detects negation, strips it, and looks up the underlying constant.
    pub fn term_to_lit(&self, t: &Term<C>) -> Result<Literal> {
        let (sign, inner) = match t {
            Term::Not(inner) => (true, inner.as_ref()),
            _ => (false, t),
        };
        match inner {
            Term::Const(c) => Ok(Literal::new(self.const_to_var(c)?, sign)),
            other => Err(Error::contract(format!(
                "expected a possibly negated constant, got {:?}",
                other
            ))),
        }
    }
}

impl<C: Clone + Eq + Hash + std::fmt::Debug> Default for VarMap<C> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(n: u32) -> VarMap<u32> {
        let mut m = VarMap::new();
        for i in 0..n {
            // engine constants deliberately differ from variable indices
            m.register(100 + i).unwrap();
        }
        m
    }

    #[test]
    fn registration_is_dense_and_injective() {
        let mut m = map(3);
        assert_eq!(m.n_vars(), 3);
        assert_eq!(m.var_to_const(Variable::new(2).unwrap()).unwrap(), &102);
        assert_eq!(m.const_to_var(&101).unwrap(), Variable::new(1).unwrap());
        assert!(matches!(m.register(101), Err(Error::EngineContractViolation(_))));
    }

    #[test]
    fn literal_round_trip() {
        let m = map(3);
        for l in [Literal::from_ilit(2).unwrap(), Literal::from_ilit(-3).unwrap()] {
            assert_eq!(m.term_to_lit(&m.lit_to_term(l).unwrap()).unwrap(), l);
        }
        assert_eq!(m.lit_to_term(Literal::from_ilit(-1).unwrap()).unwrap(), !Term::Const(100));
    }

    #[test]
    fn out_of_range_variable() {
        let m = map(2);
        assert!(matches!(
            m.lit_to_term(Literal::from_ilit(3).unwrap()),
            Err(Error::OutOfRangeVariable { var: 2, n_vars: 2 })
        ));
    }

    #[test]
    fn untranslatable_terms() {
        let m = map(2);
        for t in [Term::Const(7), Term::True, !Term::True, !!Term::Const(100)] {
            assert!(matches!(m.term_to_lit(&t), Err(Error::EngineContractViolation(_))));
        }
    }
}
