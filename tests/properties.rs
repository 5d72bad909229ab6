//! Property-based tests for the literal model, the DIMACS printer and the
//! query builder.

use proptest::prelude::*;
use sat_query::parser::{parse_str, to_dimacs};
use sat_query::*;

const SMALL_VARS: u32 = 12;

fn nonzero_ilit() -> impl Strategy<Value = i32> {
    prop_oneof![1..=i32::MAX, (i32::MIN + 1)..=-1]
}

/// A problem over `1..=SMALL_VARS` variables with up to 8 clauses of up to 5
/// literals each, empty clauses included.
fn arb_problem() -> impl Strategy<Value = Problem> {
    (1..=SMALL_VARS).prop_flat_map(|n_vars| {
        let n = n_vars as i32;
        let lit = prop_oneof![1..=n, -n..=-1].prop_map(|i| Literal::from_ilit(i).unwrap());
        prop::collection::vec(prop::collection::vec(lit, 0..=5), 0..=8)
            .prop_map(move |clauses| Problem::new(n_vars, clauses).unwrap())
    })
}

proptest! {
    #[test]
    fn ilit_round_trips(i in nonzero_ilit()) {
        let l = Literal::from_ilit(i).unwrap();
        prop_assert_eq!(l.ilit(), i);
        prop_assert_eq!(l.sign(), i < 0);
    }

    #[test]
    fn every_variable_has_a_dimacs_form(idx in 0..MAX_VARS, sign in any::<bool>()) {
        let l = Literal::new(Variable::new(idx).unwrap(), sign);
        prop_assert_eq!(Literal::from_ilit(l.ilit()).unwrap(), l);
        prop_assert_eq!(l.ilit() < 0, sign);
        prop_assert_ne!(l.vidx(MAX_VARS), l.flip().vidx(MAX_VARS));
    }

    #[test]
    fn indices_past_the_cap_are_rejected(idx in MAX_VARS..=u32::MAX) {
        prop_assert!(Variable::new(idx).is_err());
    }

    #[test]
    fn flip_is_an_involution(i in nonzero_ilit()) {
        let l = Literal::from_ilit(i).unwrap();
        prop_assert_eq!(l.flip().flip(), l);
        prop_assert_ne!(l.flip(), l);
        prop_assert_eq!(l.flip().var(), l.var());
        prop_assert_eq!(l.flip().ilit(), -i);
    }

    #[test]
    fn vidx_is_injective_and_in_range(n_vars in 1..=64u32) {
        let mut seen = vec![false; 2 * n_vars as usize];
        for v in 0..n_vars {
            for sign in [false, true] {
                let k = Literal::new(Variable::new(v).unwrap(), sign).vidx(n_vars) as usize;
                prop_assert!(k < seen.len());
                prop_assert!(!seen[k]);
                seen[k] = true;
            }
        }
    }

    #[test]
    fn printed_problems_parse_back(p in arb_problem()) {
        let text = to_dimacs(&p);
        prop_assert_eq!(parse_str(&text).unwrap(), p);
    }

    #[test]
    fn empty_mask_query_keeps_every_long_clause(p in arb_problem()) {
        let q = build_query(&p, &UnitMask::for_problem(&p)).unwrap();
        let n_vars = p.n_vars();
        let expected: Vec<[u32; 2]> = p
            .clauses()
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len() > 1)
            .flat_map(|(ci, c)| c.iter().map(move |l| [l.vidx(n_vars), ci as u32]))
            .collect();
        prop_assert_eq!(&q.incidence, &expected);
        prop_assert_eq!(q.free_vars, (0..n_vars).collect::<Vec<_>>());
    }

    #[test]
    fn query_rows_reference_only_free_literals(p in arb_problem(), seed in any::<u64>()) {
        // force an arbitrary subset of variables, one polarity each
        let units: Vec<Literal> = p
            .variables()
            .filter(|v| (seed >> v.idx()) & 1 == 1)
            .map(|v| Literal::new(v, (seed >> (32 + v.idx())) & 1 == 1))
            .collect();
        let mask = UnitMask::from_units(p.n_vars(), units.iter().copied()).unwrap();
        let q = build_query(&p, &mask).unwrap();
        for [lidx, ci] in q.incidence.iter() {
            let var = lidx % p.n_vars();
            prop_assert!(q.free_vars.contains(&var));
            let clause = &p.clauses()[*ci as usize];
            prop_assert!(!clause.iter().any(|l| units.contains(l)));
        }
        prop_assert_eq!(q.free_vars.len() + units.len(), p.n_vars() as usize);
    }
}
