#![no_main]

use ferrous_inject::{named, CompositeQualifier, Qualifier};
use libfuzzer_sys::fuzz_target;

fn qualifier(byte: u8) -> Qualifier {
    match byte % 5 {
        0 => Qualifier::Empty,
        n => named(format!("q{}", (byte / 5) % 4 + n)),
    }
}

fuzz_target!(|data: &[u8]| {
    let qualifiers: Vec<Qualifier> = data.iter().take(16).map(|&byte| qualifier(byte)).collect();

    // Folding from either end gives the same qualifier.
    let forward = qualifiers.iter().cloned().fold(Qualifier::Empty, |acc, q| acc + q);
    let backward = qualifiers.iter().rev().cloned().fold(Qualifier::Empty, |acc, q| q + acc);
    assert_eq!(forward, backward);

    if let Qualifier::Composite(composite) = &forward {
        assert!(composite.members().len() >= 2);
        assert!(composite.members().iter().all(|m| !m.is_empty() && !m.is_composite()));
        // A valid composite can always be rebuilt from its members.
        let rebuilt = CompositeQualifier::new(composite.members().iter().cloned())
            .expect("members of a composite form a valid composite");
        assert_eq!(&rebuilt, composite);
    }

    // Validation never panics, whatever the members.
    let _ = CompositeQualifier::new(qualifiers);
});
