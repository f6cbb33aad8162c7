//! Stubbed end-to-end scenarios driven through the public engine API.

use popsim_core::SimulationConfig;
use popsim_world::{Distributions, Fixed, Individual, Sampler, Scripted, Simulation};

fn distributions(uniform: impl Sampler + 'static) -> Distributions {
    Distributions {
        capable_engaging: Box::new(Fixed(16.0)),
        birth_engage_disengage: Box::new(uniform),
        get_pregnant: Box::new(Fixed(20.0)),
        children_count: Box::new(Fixed(2.0)),
        time_children: Box::new(Fixed(1.0)),
        die: Box::new(Fixed(25.0)),
    }
}

fn config(duration: u64) -> SimulationConfig {
    SimulationConfig {
        duration,
        ..Default::default()
    }
}

fn couple() -> Vec<Individual> {
    vec![
        Individual::male(20, 16, 25),
        Individual::female(19, 16, 25, 18.0, 2.0),
    ]
}

#[test]
fn pair_conceive_and_give_birth() {
    // Coin draws in order: pairing accept, then dissolution checks that all
    // keep the bond, except the gender draw at delivery (0.4 -> daughter).
    let coin = Scripted::new(vec![0.4, 0.95, 0.95, 0.95, 0.4, 0.95]).unwrap();
    let mut sim = Simulation::with_distributions(config(3), couple(), distributions(coin));

    let ids = sim.population().ids();
    let (male, female) = (ids[0], ids[1]);

    // Tick 0: the male pairs with the female, both scheduled at 0 + 1 * 100.
    // Tick 1: her fertility window is open, so she conceives.
    let first = sim.step();
    assert_eq!(first.pairings, 1);
    assert_eq!(first.conceptions, 1);
    assert_eq!(sim.population().get(male).unwrap().partner(), Some(female));
    assert_eq!(sim.population().get(male).unwrap().time_children, 100.0);
    assert!(sim.population().get(female).unwrap().is_pregnant());
    assert_eq!(sim.clock(), 2);

    // Tick 3: she gives birth; the run stops after this pass.
    let result = sim.run();
    assert_eq!(result.passes, 2);
    assert_eq!(result.final_clock, 5);
    assert_eq!(result.totals.births, 1);
    assert_eq!(sim.population().len(), 3);

    let mother = sim.population().get(female).unwrap();
    let fertility = mother.fertility().unwrap();
    assert_eq!(fertility.children_count, 1.0);
    // Rescheduled at 3 + 1 and mirrored onto the father
    assert_eq!(mother.time_children, 4.0);
    assert_eq!(sim.population().get(male).unwrap().time_children, 4.0);
    // Window still open at tick 3, so she conceives again in the same visit
    assert!(fertility.is_pregnant);

    // The newborn joined the pass it was born in and was aged once already
    let (_, child) = sim.population().iter().last().unwrap();
    assert!(child.is_female());
    assert_eq!(child.age, 1);
    assert_eq!(child.lifetime, 25);
    assert_eq!(child.relation_age, 16);
    assert!(sim.population().partners_symmetric());
}

#[test]
fn fixed_low_coin_dissolves_every_new_bond() {
    // With the coin fixed at 0.4 every bond between ages 14 and 28 dissolves in
    // the visit that formed it, so no fertility window ever opens.
    let mut sim = Simulation::with_distributions(config(3), couple(), distributions(Fixed(0.4)));
    let ids = sim.population().ids();
    let (male, female) = (ids[0], ids[1]);

    let result = sim.run();

    assert_eq!(result.passes, 2);
    assert_eq!(result.final_clock, 4);
    assert_eq!(result.totals.pairings, 4);
    assert_eq!(result.totals.dissolutions, 4);
    assert_eq!(result.totals.births, 0);
    assert_eq!(sim.population().len(), 2);
    assert!(sim.population().partners_symmetric());

    // The female dissolved last: her schedule was reset, the male's was not.
    assert_eq!(sim.population().get(female).unwrap().time_children, 0.0);
    assert_eq!(sim.population().get(male).unwrap().time_children, 103.0);
    assert!(!sim.population().get(female).unwrap().is_pregnant());
}

#[test]
fn fertility_checked_after_same_visit_dissolution() {
    // She is visited first at tick 0: pairing sets her schedule to 100, the
    // dissolution resets it to 0, and 0 <= 0 still opens her window.
    let initial = vec![
        Individual::female(19, 16, 60, 18.0, 2.0),
        Individual::male(20, 16, 60),
    ];
    let mut sim = Simulation::with_distributions(config(1000), initial, distributions(Fixed(0.4)));
    let ids = sim.population().ids();
    let (female, male) = (ids[0], ids[1]);

    let pass = sim.step();

    assert_eq!(pass.pairings, 2);
    assert_eq!(pass.dissolutions, 2);
    assert_eq!(pass.conceptions, 1);
    assert!(sim.population().partners_symmetric());

    let mother = sim.population().get(female).unwrap();
    assert!(mother.is_pregnant());
    assert!(!mother.is_engaged());
    // The male re-paired at tick 1 and dissolved, resetting only his schedule.
    assert_eq!(mother.time_children, 101.0);

    let father = sim.population().get(male).unwrap();
    assert!(!father.is_engaged());
    assert_eq!(father.time_children, 0.0);
}

#[test]
fn death_clears_partner_bond() {
    let initial = vec![
        Individual::male(24, 16, 25),
        Individual::female(22, 16, 60, 100.0, 2.0),
    ];
    let coin = Scripted::new(vec![0.4, 0.95, 0.95, 0.95]).unwrap();
    let mut sim = Simulation::with_distributions(config(1000), initial, distributions(coin));
    let ids = sim.population().ids();
    let (male, female) = (ids[0], ids[1]);

    let first = sim.step();
    assert_eq!(first.pairings, 1);
    assert_eq!(sim.population().get(female).unwrap().partner(), Some(male));

    let second = sim.step();
    assert_eq!(second.deaths, 1);
    assert!(!sim.population().contains(male));
    assert!(sim.population().get(female).unwrap().partner().is_none());
    assert!(sim.population().partners_symmetric());
}

#[test]
fn seeded_runs_replay_identically() {
    let seeded = |seed| SimulationConfig {
        duration: 400,
        seed: Some(seed),
        ..Default::default()
    };
    let initial = || {
        (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    Individual::male(15 + i, 16, 70)
                } else {
                    Individual::female(15 + i, 16, 70, 20.0, 3.0)
                }
            })
            .collect::<Vec<_>>()
    };

    let a = Simulation::new(seeded(11), initial()).unwrap().run();
    let b = Simulation::new(seeded(11), initial()).unwrap().run();

    assert_eq!(a.final_clock, b.final_clock);
    assert_eq!(a.totals, b.totals);
    assert_eq!(a.survivors, b.survivors);
}
