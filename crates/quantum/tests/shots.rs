use quantum::{
    evolution::{evolve, NormTolerance},
    geometry::{AtomArray, Geometry},
    hamiltonian::{Drive, HamiltonianSchedule, InteractionTerm, RydbergHamiltonian},
    interaction::InteractionMatrix,
    readout::{analytic_readout, readout, ReadoutType, Shots},
    StateVector,
};
use rng::OndRng;

fn entangled_state() -> StateVector {
    let atoms = AtomArray::build(Geometry::Ring, 3, 6.0).unwrap();
    let v = InteractionMatrix::van_der_waals(&atoms, 5000.0).unwrap();
    let term = InteractionTerm::new(&v);
    let drive = Drive::from_sample(&[0.3, -0.5, 0.9], 3, 1.7, 1.0).unwrap();
    let h = RydbergHamiltonian::assemble(&term, &drive).unwrap();
    let schedule = HamiltonianSchedule::frozen(h, 1.3, 8).unwrap();
    evolve(&schedule, NormTolerance::default()).unwrap()
}

#[test]
fn sampled_readout_converges_to_analytic() {
    let psi = entangled_state();
    let exact = analytic_readout(&psi, ReadoutType::Correlation);

    for &shots in &[200usize, 2_000, 20_000] {
        let mut rng = OndRng::new(format!("converge-{}", shots).as_bytes());
        let est = readout(&psi, ReadoutType::Correlation, Shots::Sampled(shots), &mut rng).unwrap();
        assert_eq!(est.len(), exact.len());

        let bound = 6.0 / (shots as f64).sqrt();
        for (k, (e, a)) in est.iter().zip(&exact).enumerate() {
            assert!(
                (e - a).abs() < bound,
                "shots = {}, feature {}: sampled {} vs analytic {}",
                shots,
                k,
                e,
                a
            );
        }
    }
}

#[test]
fn analytic_mode_ignores_generator() {
    let psi = entangled_state();
    let mut r1 = OndRng::new(b"a");
    let mut r2 = OndRng::new(b"b");
    let a = readout(&psi, ReadoutType::Correlation, Shots::Analytic, &mut r1).unwrap();
    let b = readout(&psi, ReadoutType::Correlation, Shots::Analytic, &mut r2).unwrap();
    assert_eq!(a, b);
}

#[test]
fn sampled_readout_is_deterministic_with_seed() {
    let psi = entangled_state();
    let mut r1 = OndRng::new(b"same");
    let mut r2 = OndRng::new(b"same");
    let a = readout(&psi, ReadoutType::Probability, Shots::Sampled(500), &mut r1).unwrap();
    let b = readout(&psi, ReadoutType::Probability, Shots::Sampled(500), &mut r2).unwrap();
    assert_eq!(a, b);
}
