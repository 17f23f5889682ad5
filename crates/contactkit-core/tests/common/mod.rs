#![allow(dead_code)]

use contactkit::core::models::contact::Contact;
use contactkit::core::models::contact_map::ContactMap;
use contactkit::core::models::sequence::Sequence;
use tracing_subscriber::EnvFilter;

/// Routes library events to the test output when `RUST_LOG` is set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn contact_map(id: &str, seq: &str, pairs: &[(isize, isize)]) -> ContactMap {
    scored_contact_map(id, seq, &pairs.iter().map(|&(i, j)| (i, j, 1.0)).collect::<Vec<_>>())
}

pub fn scored_contact_map(id: &str, seq: &str, contacts: &[(isize, isize, f64)]) -> ContactMap {
    let mut map = ContactMap::new(id);
    for &(i, j, score) in contacts {
        map.add(Contact::new(i, j, score)).unwrap();
    }
    map.with_sequence(Sequence::new(format!("{id}_seq"), seq).unwrap())
}

/// A reference map all of whose contacts are observed.
pub fn observed_map(id: &str, seq: &str, pairs: &[(isize, isize)]) -> ContactMap {
    let mut map = contact_map(id, seq, pairs);
    for contact in map.iter_mut() {
        contact.define_true_positive();
    }
    map
}
