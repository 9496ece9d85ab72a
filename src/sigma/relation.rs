use ark_ec::CurveGroup;

use super::Transcript;
use crate::error::ProofError;

/// One summand `witnesses[witness] · base` of a representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Term<C: CurveGroup> {
    pub witness: usize,
    pub base: C,
}

/// Closed set of relations the sigma engine can prove.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Relation<C: CurveGroup> {
    /// `target = Σ witnesses[t.witness] · t.base`.
    Representation { target: C, terms: Vec<Term<C>> },
    /// All sub-relations hold, proven under one shared challenge.
    And(Vec<Relation<C>>),
}

impl<C: CurveGroup> Relation<C> {
    pub fn representation(target: C, terms: impl IntoIterator<Item = (usize, C)>) -> Self {
        Relation::Representation {
            target,
            terms: terms
                .into_iter()
                .map(|(witness, base)| Term { witness, base })
                .collect(),
        }
    }

    pub fn and(relations: impl IntoIterator<Item = Relation<C>>) -> Self {
        Relation::And(relations.into_iter().collect())
    }

    /// Representation atoms in depth-first order.
    pub(crate) fn atoms(&self) -> Vec<(&C, &[Term<C>])> {
        let mut atoms = Vec::new();
        self.collect_atoms(&mut atoms);
        atoms
    }

    fn collect_atoms<'a>(&'a self, atoms: &mut Vec<(&'a C, &'a [Term<C>])>) {
        match self {
            Relation::Representation { target, terms } => atoms.push((target, terms.as_slice())),
            Relation::And(relations) => relations
                .iter()
                .for_each(|relation| relation.collect_atoms(atoms)),
        }
    }

    /// Evaluate the relation directly. Panics are impossible: out-of-range witness
    /// indices simply make the relation false.
    pub fn holds(&self, witnesses: &[C::ScalarField]) -> bool {
        self.atoms().into_iter().all(|(target, terms)| {
            let mut sum = C::zero();
            for term in terms {
                match witnesses.get(term.witness) {
                    Some(witness) => sum += term.base * witness,
                    None => return false,
                }
            }
            sum == *target
        })
    }
}

/// A relation bound to a protocol label and a witness count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement<C: CurveGroup> {
    pub label: &'static str,
    pub num_witnesses: usize,
    pub relation: Relation<C>,
}

impl<C: CurveGroup> Statement<C> {
    pub fn new(
        label: &'static str,
        num_witnesses: usize,
        relation: Relation<C>,
    ) -> Result<Self, ProofError> {
        let atoms = relation.atoms();
        if atoms.is_empty() {
            return Err(ProofError::Empty("sigma relation"));
        }
        for (_, terms) in &atoms {
            if terms.is_empty() {
                return Err(ProofError::Empty("representation terms"));
            }
            if let Some(term) = terms.iter().find(|t| t.witness >= num_witnesses) {
                return Err(ProofError::InvalidInput(format!(
                    "{label}: witness index {} out of range for {num_witnesses} witnesses",
                    term.witness
                )));
            }
        }
        Ok(Self {
            label,
            num_witnesses,
            relation,
        })
    }

    /// Absorb the label and every public point of the statement.
    pub(crate) fn absorb(&self, transcript: &mut Transcript) -> Result<(), ProofError> {
        transcript.append_message(b"label", self.label.as_bytes());
        transcript.append_u64(b"witnesses", self.num_witnesses as u64);
        for (target, terms) in self.relation.atoms() {
            transcript.append_point(b"target", target)?;
            for term in terms {
                transcript.append_u64(b"witness", term.witness as u64);
                transcript.append_point(b"base", &term.base)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{Curve, Scalar};
    use ark_ec::PrimeGroup;

    #[test]
    fn and_flattens_in_order() {
        let g = Curve::generator();
        let two = g * Scalar::from(2u64);
        let relation = Relation::and([
            Relation::representation(g, [(0, g)]),
            Relation::and([Relation::representation(two, [(0, two)])]),
        ]);
        let atoms = relation.atoms();
        assert_eq!(atoms.len(), 2);
        assert_eq!(*atoms[1].0, two);
        assert!(relation.holds(&[Scalar::from(1u64)]));
        assert!(!relation.holds(&[Scalar::from(2u64)]));
        assert!(!relation.holds(&[]));
    }

    #[test]
    fn statement_rejects_bad_witness_index() {
        let g = Curve::generator();
        let err = Statement::new("t", 1, Relation::representation(g, [(1, g)])).unwrap_err();
        assert!(err.is_configuration());
        assert!(Statement::new("t", 1, Relation::<Curve>::and([])).is_err());
    }
}
