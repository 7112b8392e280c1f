use proptest::prelude::*;
use quantum::{
    evolution::{evolve, NormTolerance},
    geometry::{AtomArray, Geometry},
    hamiltonian::{Drive, HamiltonianSchedule, InteractionTerm, RydbergHamiltonian},
    interaction::InteractionMatrix,
};

fn geometry() -> impl Strategy<Value = Geometry> {
    prop::sample::select(Geometry::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn geometry_is_reproducible(g in geometry(), n in 1usize..20, s in 0.5f64..15.0) {
        let a = AtomArray::build(g, n, s).unwrap();
        let b = AtomArray::build(g, n, s).unwrap();
        prop_assert_eq!(a.len(), n);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn interaction_is_symmetric_and_non_negative(g in geometry(), n in 1usize..10, s in 1.0f64..10.0) {
        let atoms = AtomArray::build(g, n, s).unwrap();
        let v = InteractionMatrix::van_der_waals(&atoms, 1e4).unwrap();
        for i in 0..n {
            prop_assert_eq!(v.get(i, i), 0.0);
            for j in 0..n {
                prop_assert_eq!(v.get(i, j), v.get(j, i));
                prop_assert!(v.get(i, j) >= 0.0);
            }
        }
    }

    #[test]
    fn evolution_preserves_norm(
        g in geometry(),
        x in prop::collection::vec(-2.0f64..2.0, 3),
        rabi in 0.0f64..3.0,
        t_end in 0.0f64..3.0,
        steps in 1usize..12,
    ) {
        let atoms = AtomArray::build(g, 3, 5.0).unwrap();
        let v = InteractionMatrix::van_der_waals(&atoms, 2e4).unwrap();
        let term = InteractionTerm::new(&v);
        let drive = Drive::from_sample(&x, 3, rabi, 1.5).unwrap();
        let h = RydbergHamiltonian::assemble(&term, &drive).unwrap();
        prop_assert!(h.hermiticity_error() < 1e-12);

        let schedule = HamiltonianSchedule::frozen(h, t_end, steps).unwrap();
        let psi = evolve(&schedule, NormTolerance::default()).unwrap();
        prop_assert!((psi.norm() - 1.0).abs() < 1e-8);
    }
}
